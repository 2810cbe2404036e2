//! Budget-driven conversation compression.
//!
//! When a conversation's token count exceeds its budget, the
//! [`Compressor`] shrinks it with one of three strategies:
//!
//! 1. **Truncate** keeps the newest messages that fit and drops the rest.
//! 2. **Extract** keeps the highest-[`Priority`] messages that fit,
//!    regardless of age, and restores their original order.
//! 3. **Summarize** folds everything older than the recent window into one
//!    synthetic system message produced by a caller-supplied [`Summarizer`].
//!
//! All strategies preserve system messages and the relative order of
//! whatever survives, and none of them mutates the input conversation.
//! [`BackgroundSummarizer`] runs summarization off the critical path and
//! publishes finished summaries into a [`SummaryStore`] for a later turn.

pub mod background;
pub mod engine;
pub mod policy;
pub mod priority;

// Re-export commonly used items at the module level.
pub use background::{BackgroundSummarizer, BackgroundSummary, SummaryStore};
pub use engine::{Compressor, MIN_COMPRESSIBLE, RECENT_WINDOW};
pub use policy::{
    CompressionMode, CompressionPolicy, FnSummarizer, SummarizeError, SummarizeFuture, Summarizer,
};
pub use priority::{Priority, priority_of};
