//! The token estimator: family dispatch, exact counting, and breakdowns.

use std::sync::OnceLock;

use serde::Serialize;
use tiktoken_rs::{CoreBPE, cl100k_base};
use tracing::{debug, warn};

use crate::tokens::cache::CountCache;
use crate::tokens::family::{GENERIC_CHARS_PER_TOKEN, ModelFamily};
use crate::{Message, MessageRole};

/// Per-role token subtotals for a conversation.
///
/// Diagnostic view: shows where the budget is going before deciding how to
/// compress.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenBreakdown {
    pub system: usize,
    pub user: usize,
    pub assistant: usize,
    pub tool: usize,
    pub total: usize,
}

/// Counts tokens for text, messages, and conversations.
///
/// Strategy is selected per call from the model id (see [`ModelFamily`]);
/// results are memoized in a [`CountCache`] keyed by
/// `(model_id, content hash)`. All methods take `&self`; share an estimator
/// behind an `Arc` when several tasks count concurrently.
///
/// Counting never fails. If the exact tokenizer backend cannot load, the
/// estimator logs once and degrades to the character-ratio approximation.
///
/// # Example
///
/// ```ignore
/// let estimator = TokenEstimator::new();
/// let tokens = estimator.count("fn main() {}", "anthropic/claude-sonnet-4");
/// assert!(tokens > 0);
/// ```
#[derive(Default)]
pub struct TokenEstimator {
    cache: CountCache,
    /// Ratio for the generic family. Builder-adjustable; exact and
    /// Anthropic-family counting ignore it.
    generic_chars_per_token: Option<f64>,
    /// Exact tokenizer backend, loaded on first use. `None` after a failed
    /// load; the failure is permanent for this instance.
    bpe: OnceLock<Option<CoreBPE>>,
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("cache_len", &self.cache.len())
            .field("generic_chars_per_token", &self.generic_chars_per_token)
            .finish()
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the generic-family ratio (default
    /// [`GENERIC_CHARS_PER_TOKEN`]).
    pub fn with_chars_per_token(mut self, ratio: f64) -> Self {
        self.generic_chars_per_token = Some(ratio);
        self
    }

    /// Count tokens in a piece of text.
    pub fn count(&self, text: &str, model_id: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        if let Some(count) = self.cache.get(model_id, text) {
            return count;
        }

        let family = ModelFamily::detect(model_id);
        let count = match family {
            ModelFamily::OpenAi => self
                .exact_count(text)
                .unwrap_or_else(|| approximate(text, GENERIC_CHARS_PER_TOKEN)),
            ModelFamily::Anthropic => approximate(text, family.chars_per_token()),
            ModelFamily::Generic => approximate(
                text,
                self.generic_chars_per_token
                    .unwrap_or(GENERIC_CHARS_PER_TOKEN),
            ),
        };

        self.cache.put(model_id, text, count);
        count
    }

    /// Count tokens in a single message: content, attached tool calls
    /// (function names and argument strings), and the tool call id.
    pub fn count_message(&self, message: &Message, model_id: &str) -> usize {
        let mut total = message
            .content
            .as_deref()
            .map_or(0, |c| self.count(c, model_id));

        if let Some(calls) = &message.tool_calls {
            for call in calls {
                total += self.count(&call.function.name, model_id);
                total += self.count(&call.function.arguments, model_id);
            }
        }
        if let Some(id) = &message.tool_call_id {
            total += self.count(id, model_id);
        }
        total
    }

    /// Count a whole conversation: the sum over messages, each counted
    /// independently. No cross-message discount.
    pub fn count_conversation(&self, messages: &[Message], model_id: &str) -> usize {
        messages
            .iter()
            .map(|m| self.count_message(m, model_id))
            .sum()
    }

    /// Per-role subtotals plus total.
    pub fn breakdown(&self, messages: &[Message], model_id: &str) -> TokenBreakdown {
        let mut out = TokenBreakdown::default();
        for message in messages {
            let tokens = self.count_message(message, model_id);
            match message.role {
                MessageRole::System => out.system += tokens,
                MessageRole::User => out.user += tokens,
                MessageRole::Assistant => out.assistant += tokens,
                MessageRole::Tool => out.tool += tokens,
            }
            out.total += tokens;
        }
        out
    }

    /// Whether `text` exceeds `limit` tokens, with a cheap length shortcut
    /// before exact counting.
    pub fn exceeds(&self, text: &str, model_id: &str, limit: usize) -> bool {
        let quick = approximate(text, GENERIC_CHARS_PER_TOKEN);
        if quick < limit / 2 {
            return false;
        }
        if quick > limit.saturating_mul(2) {
            return true;
        }
        self.count(text, model_id) > limit
    }

    /// Drop all cached counts.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached counts.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Cache hit rate so far (0.0 to 1.0).
    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.hit_rate()
    }

    fn exact_count(&self, text: &str) -> Option<usize> {
        let bpe = self.bpe.get_or_init(|| match cl100k_base() {
            Ok(bpe) => {
                debug!("exact tokenizer backend loaded (cl100k_base)");
                Some(bpe)
            }
            Err(e) => {
                warn!("exact tokenizer backend unavailable, using ratio approximation: {e}");
                None
            }
        });
        bpe.as_ref()
            .map(|bpe| bpe.encode_with_special_tokens(text).len())
    }
}

/// Ratio approximation: character count divided by the family ratio,
/// rounded up.
fn approximate(text: &str, chars_per_token: f64) -> usize {
    (text.chars().count() as f64 / chars_per_token).ceil() as usize
}
