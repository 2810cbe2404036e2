//! Result reduction: replace oversized tool/file output with compact gists.
//!
//! Tool results are the single largest context consumer in any agent loop.
//! A file read can inject tens of kilobytes; most of it is irrelevant once
//! the model has seen it. This module replaces that content with a short,
//! deterministic, metadata-derived gist. No model call is involved, which
//! makes reduction the cheapest context recovery available.
//!
//! 1. **[`envelope`]**: recovers a file path, content, and metadata from a
//!    tagged result payload: structured JSON envelope first, then a
//!    `FILE:` first-line marker, then the whole payload as pathless content.
//!
//! 2. **[`symbols`]**: best-effort per-language symbol extraction for
//!    source-file gists. Returns an empty list on any failure, never an
//!    error.
//!
//! 3. **[`gist`]**: turns a parsed envelope into the gist string: symbols
//!    and line counts for source files, headers and row counts for tables,
//!    key names for JSON, extension plus formatted size for the rest.
//!
//! 4. **[`reducer`]**: [`ResultReducer`] walks a message list, applies the
//!    tagged gist or the generic over-threshold elision, and reports how
//!    much it freed.

pub mod envelope;
pub mod gist;
pub mod reducer;
pub mod symbols;

// Re-export commonly used items at the module level.
pub use envelope::{FILE_MARKER, FILE_RESULT_PREFIX, ResultEnvelope};
pub use gist::format_size;
pub use reducer::{
    DEFAULT_ELIDE_THRESHOLD, DEFAULT_PREVIEW_CHARS, ELIDED_PREFIX, FILE_GIST_PREFIX, ReduceStats,
    ResultReducer, is_reduced,
};
