//! Collapse a pod's events into one warning line.

use crate::model::{DiagnosticEvent, Severity};

/// Summarise the non-`Normal` events as `"<reason>: <message>"` fragments.
///
/// Order is preserved. Returns an empty string when nothing qualifies.
#[must_use]
pub fn digest_events(events: &[DiagnosticEvent]) -> String {
    let mut digest = String::new();
    for event in events {
        if event.severity == Severity::Normal {
            continue;
        }
        digest.push_str(&event.reason);
        digest.push_str(": ");
        digest.push_str(&event.message);
        digest.push(' ');
    }
    digest.trim_end().to_string()
}
