//! Convenience re-exports for common `aperture-rs` types.
//!
//! Meant to be glob-imported when wiring up an agent turn:
//!
//! ```ignore
//! use aperture_rs::prelude::*;
//! ```
//!
//! This pulls in the types most turn pipelines touch: [`Message`] and
//! [`Conversation`], the [`TokenEstimator`], the [`ResultReducer`], the
//! [`Compressor`] with its policy types, and the [`PhaseGate`]. Specialized
//! pieces (envelope parsing, symbol extraction, count cache internals, the
//! action-name constants) are left out; import those from their modules
//! directly when needed.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{CallType, Conversation, FunctionCallData, Message, MessageRole, ToolCall};

// ── Token estimation ────────────────────────────────────────────────
pub use crate::tokens::{ModelFamily, TokenBreakdown, TokenEstimator};

// ── Result reduction ────────────────────────────────────────────────
pub use crate::reduce::{FILE_RESULT_PREFIX, ReduceStats, ResultEnvelope, ResultReducer};

// ── Compression ─────────────────────────────────────────────────────
pub use crate::compress::{
    BackgroundSummarizer, BackgroundSummary, CompressionMode, CompressionPolicy, Compressor,
    FnSummarizer, Priority, SummarizeError, Summarizer, SummaryStore,
};

// ── Action gating ───────────────────────────────────────────────────
pub use crate::gate::{ActionCatalog, ActionGroup, Phase, PhaseGate};
