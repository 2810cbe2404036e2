//! Token estimation: model families, counting strategies, and the count cache.
//!
//! Counting is the foundation everything else stands on: the compression
//! engine only acts when [`TokenEstimator::count_conversation`] says the
//! budget is exceeded. This module keeps counting cheap and deterministic:
//!
//! 1. **[`family`]**: [`ModelFamily`] maps a model id to a counting strategy
//!    by case-insensitive prefix match. OpenAI-style ids get an exact subword
//!    tokenizer; Anthropic-style ids use a fixed 3.5 chars/token ratio, and
//!    everything else a 4.0 ratio the caller can adjust.
//!
//! 2. **[`cache`]**: [`CountCache`] memoizes counts by
//!    `(model_id, content hash)`. The map grows without bound, with
//!    [`clear`](CountCache::clear) for tests and long-lived processes.
//!
//! 3. **[`estimator`]**: [`TokenEstimator`] ties the two together and adds
//!    message, conversation, and per-role breakdown counting.
//!
//! Estimators are plain values: construct one, share it behind an `Arc` if
//! multiple tasks count concurrently. All methods take `&self`.

pub mod cache;
pub mod estimator;
pub mod family;

// Re-export commonly used items at the module level.
pub use cache::CountCache;
pub use estimator::{TokenBreakdown, TokenEstimator};
pub use family::{ANTHROPIC_CHARS_PER_TOKEN, GENERIC_CHARS_PER_TOKEN, ModelFamily};
