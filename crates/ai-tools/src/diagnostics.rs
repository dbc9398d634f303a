#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A diagnostic reported by a running behavior (its error channel).
///
/// This is intentionally "dumb data" so it can be recorded during simulation and later rendered
/// by tooling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    /// Behavior time (seconds) at which the diagnostic was raised.
    pub time: f32,
    pub severity: Severity,
    /// Stable tag, e.g. `bt.subtree.blackboard_mismatch`.
    pub tag: Cow<'static, str>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            time: 0.0,
            severity,
            tag: tag.into(),
            message: String::new(),
        }
    }

    pub fn error(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Severity::Error, tag)
    }

    pub fn warning(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Severity::Warning, tag)
    }

    pub fn at(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

pub trait DiagnosticSink: Send {
    fn report(&mut self, diagnostic: Diagnostic);
}

#[derive(Debug, Default)]
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

#[derive(Debug, Default)]
pub struct VecDiagnosticSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for VecDiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// In-memory diagnostic history kept by each behavior instance.
#[derive(Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticLog {
    pub entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.tag == tag)
    }

    pub fn count(&self, tag: &str) -> usize {
        self.with_tag(tag).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
