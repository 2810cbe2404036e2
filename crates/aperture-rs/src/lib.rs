//! Context coordination for LLM agents: token estimation, tool-result
//! gisting, history compression, and phase-gated action visibility.
//!
//! `aperture-rs` decides what a model gets to see on each turn. It does not
//! call a model, persist history, or render anything; it takes an ordered
//! conversation plus a token budget and hands back a conversation that fits,
//! along with the set of actions the agent is currently allowed to invoke.
//! The model itself is an opaque function supplied by the caller.
//!
//! Four pieces, each usable on its own:
//!
//! - [`TokenEstimator`](tokens::TokenEstimator) maps a model id to a counting
//!   strategy and caches per-content counts.
//! - [`ResultReducer`](reduce::ResultReducer) replaces oversized tool/file
//!   output with a short, deterministic gist before it bloats the history.
//! - [`Compressor`](compress::Compressor) applies one of three strategies
//!   (truncate, extract, summarize) when a conversation exceeds its budget,
//!   with an optional background summarization path.
//! - [`PhaseGate`](gate::PhaseGate) is a finite-state machine that controls
//!   which named actions are exposed in each workflow phase.
//!
//! # Getting started
//!
//! Add `aperture-rs` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! aperture-rs = { path = "../aperture-rs" }
//! ```
//!
//! Then prepare a turn:
//!
//! ```ignore
//! use aperture_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let estimator = Arc::new(TokenEstimator::new());
//!     let reducer = ResultReducer::new();
//!     let compressor = Compressor::new(Arc::clone(&estimator));
//!
//!     let mut conversation = Conversation::new("anthropic/claude-sonnet-4", 8_000);
//!     conversation.push(Message::system("You are a data analyst."));
//!     conversation.push(Message::user("Load sales.csv and find outliers."));
//!     // ... tool calls and results accumulate ...
//!
//!     // 1. Collapse raw tool output that is already in history.
//!     reducer.reduce(&mut conversation.messages);
//!
//!     // 2. Compress only if the total exceeds the budget.
//!     let policy = CompressionPolicy::new(CompressionMode::Extract, conversation.budget);
//!     let prepared = compressor.compress(&conversation, &policy).await;
//!
//!     // 3. Ask the gate what the model may call right now.
//!     let mut gate = PhaseGate::new();
//!     gate.transition(Phase::Querying);
//!     let allowed = gate.active_actions();
//!
//!     // hand `prepared` + `allowed` to your model client
//! }
//! ```
//!
//! # Where to find things
//!
//! If you're looking for how to...
//!
//! - **Count tokens:** see [`TokenEstimator`](tokens::TokenEstimator) for
//!   text, message, and whole-conversation counts,
//!   [`ModelFamily`](tokens::ModelFamily) for the prefix-based strategy
//!   selection, and [`TokenBreakdown`](tokens::TokenBreakdown) for per-role
//!   diagnostics.
//!
//! - **Shrink tool results:** see [`ResultReducer`](reduce::ResultReducer).
//!   File-read results (tagged via [`FILE_RESULT_PREFIX`](reduce::FILE_RESULT_PREFIX)
//!   on `tool_call_id`) become metadata gists: symbols and line counts for
//!   source files, headers and row counts for tables, key names for JSON.
//!   Anything else over the threshold gets a generic elision with a preview.
//!
//! - **Compress history:** see [`Compressor`](compress::Compressor) and
//!   [`CompressionPolicy`](compress::CompressionPolicy). Truncate keeps the
//!   newest contiguous suffix, extract keeps the highest-priority messages in
//!   original order, summarize folds older traffic into one synthetic system
//!   message via a caller-supplied [`Summarizer`](compress::Summarizer).
//!   [`BackgroundSummarizer`](compress::BackgroundSummarizer) runs the same
//!   summarization off the critical path and publishes into a
//!   [`SummaryStore`](compress::SummaryStore).
//!
//! - **Gate actions by phase:** see [`PhaseGate`](gate::PhaseGate),
//!   [`Phase`](gate::Phase), and [`ActionCatalog`](gate::ActionCatalog) for
//!   the group and phase tables.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tokens`] | [`TokenEstimator`](tokens::TokenEstimator), model-family detection, count cache, per-role breakdown |
//! | [`reduce`] | [`ResultReducer`](reduce::ResultReducer), result envelope parsing, metadata gists, generic elision |
//! | [`compress`] | [`Compressor`](compress::Compressor), [`CompressionPolicy`](compress::CompressionPolicy), message [`Priority`](compress::Priority), background summarization |
//! | [`gate`] | [`PhaseGate`](gate::PhaseGate) finite-state machine, action groups, phase tables |
//!
//! # Design principles
//!
//! 1. **No global state.** Estimators, reducers, compressors, and gates are
//!    plain constructor-built values the caller owns and passes around. Two
//!    agents in one process never share state unless the caller shares it.
//!
//! 2. **Degrade, never abort.** A missing tokenizer backend, a malformed
//!    result envelope, an unparseable source file, or a failed summarizer
//!    all produce a coarser answer, not an error. Nothing in this crate
//!    should ever kill an agent turn.
//!
//! 3. **Canonical order survives.** Message order is the conversation.
//!    Every transformation preserves the relative order of whatever it
//!    keeps; priority extraction reorders only to decide survival, then
//!    restores input order.
//!
//! 4. **Context is the scarcest resource.** Oversized results are gisted
//!    before they enter history, and compression refuses to run when it
//!    would leave less than a usable conversation behind.

pub mod compress;
pub mod gate;
pub mod prelude;
pub mod reduce;
pub mod tokens;

use serde::{Deserialize, Serialize};

// ── Message types ──────────────────────────────────────────────────

/// Role of a chat message. Closed vocabulary; tool results serialize as
/// `"tool"`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        write!(f, "{s}")
    }
}

/// A single conversation message.
///
/// Immutable once produced: every transformation in this crate builds new
/// messages rather than editing ones it was handed (the one exception,
/// [`ResultReducer::reduce`](reduce::ResultReducer::reduce), takes `&mut`
/// explicitly and replaces content wholesale).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }

    /// Character length of the text content (0 when content is `None`).
    pub fn content_chars(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }
}

// ── Tool call types ────────────────────────────────────────────────

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A structured action request attached to an assistant message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    /// Create a function call with raw JSON arguments.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    pub arguments: String,
}

// ── Conversation ───────────────────────────────────────────────────

/// An ordered message sequence plus the budget and model id that govern it.
///
/// `budget` is the maximum token count the conversation may occupy before
/// compression triggers; `model_id` selects the counting strategy (see
/// [`ModelFamily`](tokens::ModelFamily)).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub budget: usize,
    pub model_id: String,
}

impl Conversation {
    pub fn new(model_id: impl Into<String>, budget: usize) -> Self {
        Self {
            messages: Vec::new(),
            budget,
            model_id: model_id.into(),
        }
    }

    /// Replace the message list (builder-style).
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages that are not system messages.
    pub fn non_system_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_system()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant_text("thinking");
        assert_eq!(assist.role, MessageRole::Assistant);
        assert_eq!(assist.content.as_deref(), Some("thinking"));

        let tool = Message::tool_result("call-1", "result");
        assert_eq!(tool.role, MessageRole::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call-1"));

        let calls = Message::assistant_tool_calls(vec![ToolCall::function(
            "call-2", "run_query", "{\"sql\":\"select 1\"}",
        )]);
        assert!(calls.content.is_none());
        assert_eq!(calls.tool_calls.as_ref().map(|c| c.len()), Some(1));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::tool_result("call-1", "ok")).unwrap();
        assert_eq!(json["role"], "tool");
        let json = serde_json::to_value(Message::system("s")).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn message_serialization_skips_none_fields() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn conversation_counts_non_system_messages() {
        let conv = Conversation::new("test-model", 1000).with_messages(vec![
            Message::system("a"),
            Message::user("b"),
            Message::assistant_text("c"),
            Message::system("d"),
        ]);
        assert_eq!(conv.len(), 4);
        assert_eq!(conv.non_system_count(), 2);
    }

    #[test]
    fn content_chars_counts_codepoints() {
        let msg = Message::user("héllo");
        assert_eq!(msg.content_chars(), 5);
        let empty = Message::assistant_tool_calls(vec![]);
        assert_eq!(empty.content_chars(), 0);
    }
}
