//! Phase guidance attached to successful transitions.
//!
//! Agents driving the workflow get a `<system-reminder>` block describing
//! what the new phase expects of them.

use crate::model::Status;

/// Reminder for a unit that just entered `status`, if that phase has one.
#[must_use]
pub fn system_reminder(id: &str, status: Status) -> Option<String> {
    let body = match status {
        Status::Specifying => format!(
            "Work unit {id} is now in SPECIFYING.\n\
             Capture rules, examples and open questions, then write the Gherkin feature \
             file before moving to testing."
        ),
        Status::Testing => format!(
            "Work unit {id} is now in TESTING.\n\
             Write FAILING tests for every scenario before any implementation. \
             Keep all scenarios of a feature in a single test file and link them to coverage."
        ),
        Status::Implementing => format!(
            "Work unit {id} is now in IMPLEMENTING.\n\
             Write only enough code to make the failing tests pass, then link the \
             implementation to coverage."
        ),
        Status::Validating => format!(
            "Work unit {id} is now in VALIDATING.\n\
             Run the full test suite and confirm every linked scenario is covered before \
             marking the work unit done."
        ),
        Status::Blocked => format!(
            "Work unit {id} is BLOCKED.\n\
             Resolve the recorded blocker, then move the work unit back to the phase it left."
        ),
        Status::Backlog | Status::Done => return None,
    };
    Some(format!("<system-reminder>\n{body}\n</system-reminder>"))
}
