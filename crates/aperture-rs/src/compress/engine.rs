//! The compression engine.
//!
//! [`Compressor::compress`] is the entry point: measure, return early when
//! the conversation already fits, otherwise gist oversized tool results and
//! then apply the policy's strategy. The three strategies are also public on
//! their own so each can be exercised directly.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::compress::policy::{CompressionMode, CompressionPolicy};
use crate::compress::priority::priority_of;
use crate::reduce::ResultReducer;
use crate::tokens::TokenEstimator;
use crate::{Conversation, Message};

/// Newest non-system messages the summarize strategy keeps verbatim.
pub const RECENT_WINDOW: usize = 4;

/// Fewest non-system messages a compression pass may leave behind.
///
/// When a strategy's survivor set would fall below this while the input had
/// at least this many, [`Compressor::compress`] keeps the input instead. A
/// conversation squeezed down to nothing is worse than one over budget.
pub const MIN_COMPRESSIBLE: usize = 2;

/// Applies a [`CompressionPolicy`] to an over-budget conversation.
///
/// Never mutates its input; every pass clones what it keeps into a fresh
/// [`Conversation`]. System messages survive every strategy, and survivors
/// always come out in their original relative order.
///
/// # Example
///
/// ```ignore
/// let compressor = Compressor::new(Arc::new(TokenEstimator::new()));
/// let policy = CompressionPolicy::new(CompressionMode::Truncate, 8_000);
/// let prepared = compressor.compress(&conversation, &policy).await;
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    estimator: Arc<TokenEstimator>,
    reducer: ResultReducer,
}

impl Compressor {
    pub fn new(estimator: Arc<TokenEstimator>) -> Self {
        Self {
            estimator,
            reducer: ResultReducer::new(),
        }
    }

    /// Replace the reducer used for the pre-strategy gisting pass.
    pub fn with_reducer(mut self, reducer: ResultReducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Compress `conversation` to fit `policy.max_tokens`.
    ///
    /// Within budget, the input comes back unchanged, as does a conversation
    /// that already holds fewer than [`MIN_COMPRESSIBLE`] non-system
    /// messages. Over budget, oversized tool results are gisted first
    /// (dropping raw output is cheaper than dropping whole messages); only
    /// if that is not enough does the strategy run. A strategy result that
    /// would leave fewer than [`MIN_COMPRESSIBLE`] non-system messages is
    /// discarded in favor of the unchanged input.
    pub async fn compress(
        &self,
        conversation: &Conversation,
        policy: &CompressionPolicy,
    ) -> Conversation {
        let model = counting_model(conversation, policy);
        let total = self
            .estimator
            .count_conversation(&conversation.messages, model);
        if total <= policy.max_tokens {
            trace!("{total} tokens within budget {}, nothing to do", policy.max_tokens);
            return conversation.clone();
        }
        if conversation.non_system_count() < MIN_COMPRESSIBLE {
            debug!(
                "{total} tokens over budget {} but only {} non-system message(s), leaving as is",
                policy.max_tokens,
                conversation.non_system_count()
            );
            return conversation.clone();
        }
        debug!(
            "{total} tokens over budget {}, compressing via {}",
            policy.max_tokens, policy.mode
        );

        let mut working = conversation.clone();
        let stats = self.reducer.reduce(&mut working.messages);
        if stats.reduced_messages > 0 {
            let after = self
                .estimator
                .count_conversation(&working.messages, model);
            debug!("gisting pass freed {} chars ({total} -> {after} tokens)", stats.chars_removed);
            if after <= policy.max_tokens {
                return working;
            }
        }

        let compressed = match policy.mode {
            CompressionMode::Truncate => self.truncate(&working, policy),
            CompressionMode::Extract => self.extract(&working, policy),
            CompressionMode::Summarize => self.summarize(&working, policy).await,
        };

        if compressed.non_system_count() < MIN_COMPRESSIBLE {
            debug!(
                "strategy would keep {} non-system message(s), below the floor of {MIN_COMPRESSIBLE}; keeping input",
                compressed.non_system_count()
            );
            return conversation.clone();
        }
        compressed
    }

    /// Keep the newest messages that fit, dropping everything older.
    ///
    /// System messages are kept unconditionally and charged against the
    /// budget first. The walk over non-system messages runs newest to
    /// oldest and stops at the first message that does not fit, so the
    /// retained suffix is contiguous: an older message never outlives a
    /// newer one that was dropped. Survivors keep their original order.
    pub fn truncate(
        &self,
        conversation: &Conversation,
        policy: &CompressionPolicy,
    ) -> Conversation {
        let model = counting_model(conversation, policy);
        let messages = &conversation.messages;

        let mut keep = vec![false; messages.len()];
        let mut used: usize = 0;
        for (idx, message) in messages.iter().enumerate() {
            if message.is_system() {
                keep[idx] = true;
                used += self.estimator.count_message(message, model);
            }
        }

        for (idx, message) in messages.iter().enumerate().rev() {
            if message.is_system() {
                continue;
            }
            let cost = self.estimator.count_message(message, model);
            if used + cost > policy.max_tokens {
                break;
            }
            used += cost;
            keep[idx] = true;
        }

        let kept = collect_kept(messages, &keep);
        debug!("truncate kept {}/{} messages ({used} tokens)", kept.len(), messages.len());
        conversation.clone().with_messages(kept)
    }

    /// Keep the highest-priority messages that fit, in original order.
    ///
    /// Non-system messages are ranked by [`Priority`](crate::compress::Priority)
    /// (ties keep conversation order) and accepted greedily; a message that
    /// would overflow is skipped, not a stopping point, so leftover budget
    /// can still go to smaller lower-priority messages. Priority decides
    /// only who survives. Survivors are tracked by position, so duplicate
    /// content is never conflated, and come out in original order.
    pub fn extract(
        &self,
        conversation: &Conversation,
        policy: &CompressionPolicy,
    ) -> Conversation {
        let model = counting_model(conversation, policy);
        let messages = &conversation.messages;

        let mut keep = vec![false; messages.len()];
        let mut used: usize = 0;
        for (idx, message) in messages.iter().enumerate() {
            if message.is_system() {
                keep[idx] = true;
                used += self.estimator.count_message(message, model);
            }
        }

        let mut ranked: Vec<usize> = (0..messages.len())
            .filter(|&idx| !messages[idx].is_system())
            .collect();
        // Stable sort: equal priorities stay in conversation order.
        ranked.sort_by(|&a, &b| priority_of(&messages[b]).cmp(&priority_of(&messages[a])));

        for &idx in &ranked {
            let cost = self.estimator.count_message(&messages[idx], model);
            if used + cost > policy.max_tokens {
                continue;
            }
            used += cost;
            keep[idx] = true;
        }

        let kept = collect_kept(messages, &keep);
        debug!("extract kept {}/{} messages ({used} tokens)", kept.len(), messages.len());
        conversation.clone().with_messages(kept)
    }

    /// Fold everything older than the recent window into one summary.
    ///
    /// System messages pass through unchanged. The last [`RECENT_WINDOW`]
    /// non-system messages are kept verbatim; the span before them is
    /// rendered as a role-labelled transcript and handed to the policy's
    /// summarizer, whose output becomes a single synthetic system message
    /// placed after the original system messages and before the recent
    /// window. With no summarizer configured this degrades to [`extract`];
    /// with fewer than two messages to fold, the input comes back
    /// unchanged. A summarizer failure or empty answer becomes a fixed
    /// elision notice rather than an error.
    ///
    /// [`extract`]: Self::extract
    pub async fn summarize(
        &self,
        conversation: &Conversation,
        policy: &CompressionPolicy,
    ) -> Conversation {
        let Some(summarizer) = policy.summarizer.as_deref() else {
            debug!("summarize requested without a summarizer, extracting instead");
            return self.extract(conversation, policy);
        };

        let messages = &conversation.messages;
        let non_system: Vec<usize> = (0..messages.len())
            .filter(|&idx| !messages[idx].is_system())
            .collect();
        let earlier_len = non_system.len().saturating_sub(RECENT_WINDOW);
        if earlier_len < 2 {
            debug!("summarize: only {earlier_len} message(s) before the recent window, keeping input");
            return conversation.clone();
        }

        let earlier: Vec<&Message> = non_system[..earlier_len]
            .iter()
            .map(|&idx| &messages[idx])
            .collect();
        let transcript = render_transcript(&earlier);

        let summary_text = match summarizer.summarize(&transcript).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("summarizer returned an empty summary, substituting an elision notice");
                elision_notice(earlier_len)
            }
            Err(e) => {
                warn!("summarization failed ({e}), substituting an elision notice");
                elision_notice(earlier_len)
            }
        };

        let mut kept: Vec<Message> = messages.iter().filter(|m| m.is_system()).cloned().collect();
        kept.push(Message::system(summary_text));
        kept.extend(
            non_system[earlier_len..]
                .iter()
                .map(|&idx| messages[idx].clone()),
        );
        debug!("summarize folded {earlier_len} messages, kept {} recent verbatim", RECENT_WINDOW);
        conversation.clone().with_messages(kept)
    }
}

/// Model id used for counting: the policy override, else the conversation's.
fn counting_model<'a>(conversation: &'a Conversation, policy: &'a CompressionPolicy) -> &'a str {
    policy.model_id.as_deref().unwrap_or(&conversation.model_id)
}

/// Notice standing in for a summary the backend never delivered.
pub(crate) fn elision_notice(count: usize) -> String {
    format!("[Summary unavailable: {count} earlier messages elided]")
}

/// Render a span as a role-labelled transcript for the summarizer.
pub(crate) fn render_transcript(span: &[&Message]) -> String {
    let mut out = String::new();
    for message in span {
        out.push_str(&format!("[{}]: ", message.role));
        match (&message.content, &message.tool_calls) {
            (Some(content), _) => out.push_str(content),
            (None, Some(calls)) if !calls.is_empty() => {
                let rendered: Vec<String> = calls
                    .iter()
                    .map(|call| format!("{}({})", call.function.name, call.function.arguments))
                    .collect();
                out.push_str(&format!("called {}", rendered.join(", ")));
            }
            _ => out.push_str("[no content]"),
        }
        out.push_str("\n\n");
    }
    out
}

fn collect_kept(messages: &[Message], keep: &[bool]) -> Vec<Message> {
    messages
        .iter()
        .zip(keep)
        .filter(|(_, kept)| **kept)
        .map(|(message, _)| message.clone())
        .collect()
}
