//! The reduction pass over a message list.

use tracing::debug;

use crate::reduce::envelope::{ResultEnvelope, has_file_tag};
use crate::reduce::gist;
use crate::{Message, MessageRole};

/// Prefix of file gists produced by the reducer.
///
/// Both the gist writer and the "already reduced?" check reference these
/// prefixes so they can't drift out of sync.
pub const FILE_GIST_PREFIX: &str = "[File ";

/// Prefix of generic elision placeholders.
pub const ELIDED_PREFIX: &str = "[Content elided";

/// Default character threshold above which tool-result content is reduced.
pub const DEFAULT_ELIDE_THRESHOLD: usize = 4_000;

/// Default preview length (in characters) kept in a generic elision.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Whether content was already produced by a reduction pass.
pub fn is_reduced(content: &str) -> bool {
    content.starts_with(FILE_GIST_PREFIX) || content.starts_with(ELIDED_PREFIX)
}

/// Replaces oversized tool-result content with compact gists.
///
/// Two paths, both deterministic and model-free:
///
/// - results tagged as file reads (see
///   [`FILE_RESULT_PREFIX`](crate::reduce::FILE_RESULT_PREFIX)) get a
///   metadata gist from the parsed payload;
/// - any other tool result over the threshold gets a generic elision with a
///   short preview.
///
/// Content at or under the threshold passes through untouched; a gist could
/// easily be longer than the content it replaces.
///
/// # Example
///
/// ```ignore
/// let reducer = ResultReducer::new().with_elide_threshold(2_000);
/// let stats = reducer.reduce(&mut conversation.messages);
/// println!("freed {} chars across {} results", stats.chars_removed, stats.reduced_messages);
/// ```
#[derive(Debug, Clone)]
pub struct ResultReducer {
    /// Character count above which tool-result content is reduced.
    elide_threshold: usize,
    /// Characters of original content kept in a generic elision.
    preview_chars: usize,
}

impl Default for ResultReducer {
    fn default() -> Self {
        Self {
            elide_threshold: DEFAULT_ELIDE_THRESHOLD,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// What a reduction pass accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceStats {
    /// Messages whose content was replaced.
    pub reduced_messages: usize,
    /// Characters removed across all replacements.
    pub chars_removed: usize,
}

impl ResultReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reduction threshold in characters.
    pub fn with_elide_threshold(mut self, chars: usize) -> Self {
        self.elide_threshold = chars;
        self
    }

    /// Set the preview length in characters.
    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Reduce every oversized tool result in `messages` in place.
    ///
    /// Only tool-role messages are touched; deciding the fate of other roles
    /// is compression's job. Content produced by an earlier pass is skipped,
    /// so the pass is idempotent. Returns what was freed.
    pub fn reduce(&self, messages: &mut [Message]) -> ReduceStats {
        let mut stats = ReduceStats::default();

        for message in messages.iter_mut() {
            if message.role != MessageRole::Tool {
                continue;
            }
            let Some(content) = message.content.as_deref() else {
                continue;
            };
            if is_reduced(content) {
                continue;
            }
            let original_chars = message.content_chars();
            if original_chars <= self.elide_threshold {
                continue;
            }

            let replacement = if has_file_tag(message.tool_call_id.as_deref()) {
                self.gist_file_result(content)
            } else {
                self.elide(content)
            };

            stats.reduced_messages += 1;
            stats.chars_removed += original_chars.saturating_sub(replacement.chars().count());
            message.content = Some(replacement);
        }

        if stats.reduced_messages > 0 {
            debug!(
                "reduced {} tool result(s), freed {} chars",
                stats.reduced_messages, stats.chars_removed
            );
        }
        stats
    }

    /// Parse a tagged file-result payload and produce its gist.
    ///
    /// Payloads with no recoverable path fall back to the generic elision;
    /// there is no path or extension to build a metadata gist from.
    pub fn gist_file_result(&self, payload: &str) -> String {
        let envelope = ResultEnvelope::parse(payload);
        if envelope.path.is_some() {
            gist::file_gist(&envelope)
        } else {
            self.elide(&envelope.content)
        }
    }

    /// Generic elision: original size plus a short preview.
    ///
    /// The preview is taken on character boundaries, never mid-codepoint.
    pub fn elide(&self, content: &str) -> String {
        let original_chars = content.chars().count();
        let preview: String = content.chars().take(self.preview_chars).collect();
        format!(
            "[Content elided — original {original_chars} characters, preview: {preview}]"
        )
    }
}
