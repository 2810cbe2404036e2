//! Compression policy: which strategy to run, against what budget, and
//! with which summarization backend.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Strategy used when a conversation exceeds its budget.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// Keep the newest messages that fit; drop older ones.
    Truncate,
    /// Keep the highest-priority messages that fit, in original order.
    Extract,
    /// Replace older messages with one model-written summary message.
    Summarize,
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressionMode::Truncate => "truncate",
            CompressionMode::Extract => "extract",
            CompressionMode::Summarize => "summarize",
        };
        write!(f, "{s}")
    }
}

/// Why a summarization attempt produced no usable summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The backend call itself failed (network, model refusal, etc.).
    #[error("summarization backend failed: {0}")]
    Backend(String),
    /// The backend returned an empty or whitespace-only summary.
    #[error("summarizer returned an empty summary")]
    Empty,
    /// The backend did not answer in time.
    #[error("summarization timed out after {0:?}")]
    Timeout(Duration),
}

/// Boxed future returned by [`Summarizer::summarize`].
pub type SummarizeFuture<'a> = Pin<Box<dyn Future<Output = Result<String, SummarizeError>> + Send + 'a>>;

/// A summarization backend.
///
/// The compressor renders the span to summarize as a role-labelled
/// transcript and hands it here; how the summary gets written (which model,
/// which prompt, whether there is a model at all) is entirely the
/// implementor's business. Failures are soft: the compressor falls back to
/// an elision notice rather than propagating the error.
///
/// # Example
///
/// ```ignore
/// struct ClientBacked { client: Arc<ModelClient> }
///
/// impl Summarizer for ClientBacked {
///     fn summarize(&self, transcript: &str) -> SummarizeFuture<'_> {
///         let prompt = format!("Summarize concisely:\n\n{transcript}");
///         Box::pin(async move {
///             self.client
///                 .complete(&prompt)
///                 .await
///                 .map_err(|e| SummarizeError::Backend(e.to_string()))
///         })
///     }
/// }
/// ```
pub trait Summarizer: Send + Sync {
    /// Summarize a role-labelled transcript into a short standalone text.
    fn summarize(&self, transcript: &str) -> SummarizeFuture<'_>;
}

/// Adapter that turns a plain closure into a [`Summarizer`].
///
/// Useful in tests and for callers whose backend is synchronous.
///
/// # Example
///
/// ```ignore
/// let summarizer = FnSummarizer::new(|transcript: &str| {
///     Ok(format!("{} chars of earlier conversation", transcript.len()))
/// });
/// ```
pub struct FnSummarizer<F> {
    f: F,
}

impl<F> FnSummarizer<F>
where
    F: Fn(&str) -> Result<String, SummarizeError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Summarizer for FnSummarizer<F>
where
    F: Fn(&str) -> Result<String, SummarizeError> + Send + Sync,
{
    fn summarize(&self, transcript: &str) -> SummarizeFuture<'_> {
        let result = (self.f)(transcript);
        Box::pin(std::future::ready(result))
    }
}

/// Everything the [`Compressor`](crate::compress::Compressor) needs to know
/// for one compression pass.
///
/// `max_tokens` is the budget the output must fit; `model_id` overrides the
/// conversation's own model id for token counting when set. The summarizer
/// is only consulted in [`CompressionMode::Summarize`]; without one, the
/// compressor degrades to extraction.
///
/// # Example
///
/// ```ignore
/// let policy = CompressionPolicy::new(CompressionMode::Summarize, 8_000)
///     .with_model_id("gpt-4o")
///     .with_summarizer(Arc::new(my_summarizer));
/// ```
#[derive(Clone)]
pub struct CompressionPolicy {
    /// Strategy to apply when over budget.
    pub mode: CompressionMode,
    /// Token budget the compressed conversation must fit.
    pub max_tokens: usize,
    /// Counting-model override; falls back to the conversation's model id.
    pub model_id: Option<String>,
    /// Backend for [`CompressionMode::Summarize`].
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl CompressionPolicy {
    pub fn new(mode: CompressionMode, max_tokens: usize) -> Self {
        Self {
            mode,
            max_tokens,
            model_id: None,
            summarizer: None,
        }
    }

    /// Count tokens as this model instead of the conversation's model.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Attach a summarization backend.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }
}

impl fmt::Debug for CompressionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionPolicy")
            .field("mode", &self.mode)
            .field("max_tokens", &self.max_tokens)
            .field("model_id", &self.model_id)
            .field("has_summarizer", &self.summarizer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&CompressionMode::Truncate).unwrap();
        assert_eq!(json, "\"truncate\"");
        let parsed: CompressionMode = serde_json::from_str("\"summarize\"").unwrap();
        assert_eq!(parsed, CompressionMode::Summarize);
    }

    #[tokio::test]
    async fn fn_summarizer_adapts_a_closure() {
        let summarizer = FnSummarizer::new(|t: &str| Ok(format!("gist of {} chars", t.len())));
        let out = summarizer.summarize("hello world").await.unwrap();
        assert_eq!(out, "gist of 11 chars");
    }

    #[tokio::test]
    async fn fn_summarizer_propagates_errors() {
        let summarizer =
            FnSummarizer::new(|_: &str| Err(SummarizeError::Backend("model offline".into())));
        let err = summarizer.summarize("x").await.unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[test]
    fn policy_debug_does_not_require_summarizer_debug() {
        let policy = CompressionPolicy::new(CompressionMode::Extract, 500)
            .with_summarizer(Arc::new(FnSummarizer::new(|_: &str| Ok("s".into()))));
        let rendered = format!("{policy:?}");
        assert!(rendered.contains("has_summarizer: true"));
        assert!(rendered.contains("max_tokens: 500"));
    }
}
