#![cfg(feature = "serde")]

use ai_tools::{Diagnostic, DiagnosticLog};

#[test]
fn diagnostic_log_roundtrips_via_serde() {
    let mut log = DiagnosticLog::default();
    log.push(Diagnostic::error("bt.start.refused").at(0.5).with_message("empty tree"));

    let json = serde_json::to_string(&log).expect("serialize log");
    let back: DiagnosticLog = serde_json::from_str(&json).expect("deserialize log");
    assert_eq!(log, back);
}
