//! Diagnostics channel for behavior runtimes.
//!
//! Runtimes report tagged [`Diagnostic`]s to a [`DiagnosticSink`]; hosts pick a sink or keep a
//! [`DiagnosticLog`] for inspection in tests.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod diagnostics;

pub use diagnostics::{
    Diagnostic, DiagnosticLog, DiagnosticSink, NullDiagnosticSink, Severity, VecDiagnosticSink,
};
