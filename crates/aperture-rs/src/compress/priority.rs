//! Message priority for the extract strategy.

use crate::{Message, MessageRole};

/// Retention priority of a message. Higher sorts later in `Ord`, so
/// `Critical` outranks `High` outranks `Medium` outranks `Low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Plain tool results. First to go.
    Low,
    /// Assistant prose without tool calls.
    Medium,
    /// User messages, assistant messages that carry tool calls, and tool
    /// results that report an error.
    High,
    /// System messages. Never dropped.
    Critical,
}

/// Classify a message for extraction.
///
/// Error tool-results rank `High` because a dropped failure report is the
/// most common way an agent repeats a doomed call.
pub fn priority_of(message: &Message) -> Priority {
    match message.role {
        MessageRole::System => Priority::Critical,
        MessageRole::User => Priority::High,
        MessageRole::Assistant => {
            if message.tool_calls.as_ref().is_some_and(|c| !c.is_empty()) {
                Priority::High
            } else {
                Priority::Medium
            }
        }
        MessageRole::Tool => {
            if is_error_signal(message.content.as_deref()) {
                Priority::High
            } else {
                Priority::Low
            }
        }
    }
}

/// Whether tool-result content reports a failure.
///
/// Tool errors conventionally read `"Error: ..."`; the check is a
/// case-insensitive prefix match after leading whitespace.
fn is_error_signal(content: Option<&str>) -> bool {
    content.is_some_and(|c| {
        let head: String = c.trim_start().chars().take(5).collect();
        head.eq_ignore_ascii_case("error")
    })
}
