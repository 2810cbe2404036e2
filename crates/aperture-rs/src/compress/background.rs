//! Off-the-critical-path summarization.
//!
//! Summarizing is the one compression strategy that waits on a model, so it
//! can also run ahead of time: [`BackgroundSummarizer::trigger`] spawns a
//! Tokio task that summarizes a span now, and a later turn polls the
//! [`SummaryStore`] and splices the finished summary in itself. Nothing
//! here blocks a turn; a summary that is not ready yet is simply not there.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Message;
use crate::compress::engine::{elision_notice, render_transcript};
use crate::compress::policy::Summarizer;

/// A finished asynchronous summary.
#[derive(Debug, Clone)]
pub struct BackgroundSummary {
    /// The synthetic system message, ready to splice into a conversation.
    pub summary: Message,
    /// How many messages the summary covers.
    pub source_messages: usize,
    /// When the summarizer finished.
    pub completed_at: DateTime<Utc>,
}

/// Concurrency-safe store of finished summaries, keyed by conversation id.
///
/// One writer per key at a time is the expected usage but is not enforced;
/// when two tasks race on the same key, the later publication wins and the
/// earlier one is dropped. Published entries stay put: [`poll`](Self::poll)
/// is a plain read, and only the next publication for the same key replaces
/// an entry. Splicing a summary into a conversation at most once is the
/// caller's bookkeeping.
#[derive(Debug, Default)]
pub struct SummaryStore {
    entries: Mutex<HashMap<String, BackgroundSummary>>,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a finished summary, replacing any previous one for the key.
    pub fn publish(&self, key: impl Into<String>, summary: BackgroundSummary) {
        let key = key.into();
        debug!(
            "publishing background summary for '{key}' ({} messages)",
            summary.source_messages
        );
        self.entries.lock().insert(key, summary);
    }

    /// Read the finished summary for `key`, if one has been published.
    ///
    /// Returns `None` both for unknown keys and for work still in flight;
    /// the caller cannot tell the difference and does not need to. Polling
    /// does not consume the entry: the same summary remains readable until
    /// a re-trigger for the key overwrites it.
    pub fn poll(&self, key: &str) -> Option<BackgroundSummary> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of published summaries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all published summaries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Spawns summarization tasks and publishes their results.
///
/// Each [`trigger`](Self::trigger) renders the span to a transcript up
/// front, hands it to the shared [`Summarizer`] on a spawned task, and
/// publishes the outcome into the [`SummaryStore`] under the caller's key.
/// Failures publish the same elision notice the synchronous path uses, so
/// polling always yields something usable. There is no cancellation; a
/// caller that stops caring about a key just never polls it.
///
/// On drop, still-running tasks are aborted to prevent resource leaks.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(SummaryStore::new());
/// let background = BackgroundSummarizer::new(Arc::clone(&store), summarizer);
///
/// background.trigger("conv-42", &conversation.messages[1..5]);
/// // ... keep working; next turn:
/// if let Some(done) = store.poll("conv-42") {
///     conversation.messages.insert(1, done.summary);
/// }
/// ```
pub struct BackgroundSummarizer {
    store: Arc<SummaryStore>,
    summarizer: Arc<dyn Summarizer>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundSummarizer {
    pub fn new(store: Arc<SummaryStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            store,
            summarizer,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Summarize `messages` on a background task, publishing under `key`.
    ///
    /// Returns immediately. Triggering the same key again before the first
    /// task finishes is wasteful but safe: the last writer wins.
    pub fn trigger(&self, key: impl Into<String>, messages: &[Message]) {
        let key = key.into();
        let source_messages = messages.len();
        let refs: Vec<&Message> = messages.iter().collect();
        let transcript = render_transcript(&refs);

        let store = Arc::clone(&self.store);
        let summarizer = Arc::clone(&self.summarizer);
        debug!("spawning background summary for '{key}' ({source_messages} messages)");
        let handle = tokio::spawn(async move {
            let text = match summarizer.summarize(&transcript).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!("background summarizer returned an empty summary for '{key}'");
                    elision_notice(source_messages)
                }
                Err(e) => {
                    warn!("background summarization for '{key}' failed: {e}");
                    elision_notice(source_messages)
                }
            };
            store.publish(
                &key,
                BackgroundSummary {
                    summary: Message::system(text),
                    source_messages,
                    completed_at: Utc::now(),
                },
            );
        });
        self.handles.lock().push(handle);
    }

    /// Tasks spawned by this summarizer that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every spawned task to finish.
    ///
    /// For tests and shutdown paths; normal operation never needs to wait.
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("background summarization task panicked: {e}");
            }
        }
    }
}

impl Drop for BackgroundSummarizer {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for BackgroundSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundSummarizer")
            .field("published", &self.store.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
