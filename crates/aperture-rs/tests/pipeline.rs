//! Integration tests for the full turn pipeline.
//!
//! These tests run the pieces the way an agent harness would on each turn:
//! reduce raw tool results, measure, compress when over budget, and consult
//! the phase gate for what the model may call next.

use std::sync::Arc;

use aperture_rs::gate::catalog::{EXECUTE_COMMAND, RUN_QUERY, SAVE_FINDING};
use aperture_rs::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: a sales-analysis session with two oversized tool results, one of
/// them a tagged file read. "test-model" counts at 4 chars per token.
fn analysis_conversation() -> Conversation {
    let query_dump: String = (0..400)
        .map(|i| format!("region=north amount={}\n", 1_200 + i))
        .collect();
    let csv_rows: String = (0..160)
        .map(|i| format!("2026-08-{:02},widget,{},north\n", i % 28 + 1, 100 + i))
        .collect();
    let csv_payload = format!("FILE: data/sales.csv\ndate,product,amount,region\n{csv_rows}");

    let mut conversation = Conversation::new("test-model", 300);
    conversation.push(Message::system("You are a data analyst. Be precise."));
    conversation.push(Message::user("Which region had the best August?"));
    conversation.push(Message::assistant_tool_calls(vec![ToolCall::function(
        "call-1",
        "run_query",
        r#"{"sql":"SELECT region, SUM(amount) FROM sales GROUP BY region"}"#,
    )]));
    conversation.push(Message::tool_result("call-1", &query_dump));
    conversation.push(Message::assistant_text("North leads; checking the raw file."));
    conversation.push(Message::tool_result("file:call-2", &csv_payload));
    conversation.push(Message::assistant_text("North is ahead at 41% of the total."));
    conversation.push(Message::user("Great. Anything anomalous?"));
    conversation
}

// ── Reduce + measure + compress ─────────────────────────────────────

#[tokio::test]
async fn reduce_then_compress_leaves_a_fitting_conversation() {
    init_tracing();
    let mut conversation = analysis_conversation();
    let estimator = TokenEstimator::new();
    let before = estimator.count_conversation(&conversation.messages, &conversation.model_id);

    let stats = ResultReducer::new().reduce(&mut conversation.messages);
    assert_eq!(stats.reduced_messages, 2);

    let after = estimator.count_conversation(&conversation.messages, &conversation.model_id);
    assert!(after < before);
    assert!(after <= conversation.budget);

    // Already within budget, so compression hands the input straight back.
    let compressor = Compressor::new(Arc::new(TokenEstimator::new()));
    let policy = CompressionPolicy::new(CompressionMode::Truncate, conversation.budget);
    let prepared = compressor.compress(&conversation, &policy).await;
    assert_eq!(prepared, conversation);
    assert_eq!(
        prepared.messages[0].content.as_deref(),
        Some("You are a data analyst. Be precise.")
    );
}

#[tokio::test]
async fn tagged_file_results_become_metadata_gists() {
    let mut conversation = analysis_conversation();
    ResultReducer::new().reduce(&mut conversation.messages);

    let gist = conversation.messages[5].content.as_deref().unwrap();
    assert!(gist.contains("sales.csv"));
    assert!(gist.contains("160 rows"));
    assert!(gist.contains("date, product, amount, region"));
    // The untagged dump got the generic treatment instead.
    let elided = conversation.messages[3].content.as_deref().unwrap();
    assert!(elided.starts_with("[Content elided"));
}

#[tokio::test]
async fn truncation_drops_the_oldest_exchanges_first() {
    init_tracing();
    let conversation = analysis_conversation();
    let compressor = Compressor::new(Arc::new(TokenEstimator::new()));
    let policy = CompressionPolicy::new(CompressionMode::Truncate, 100);

    let prepared = compressor.compress(&conversation, &policy).await;

    assert!(prepared.messages[0].is_system());
    let texts: Vec<&str> = prepared
        .messages
        .iter()
        .filter_map(|m| m.content.as_deref())
        .collect();
    assert!(texts.iter().any(|t| t.contains("North leads")));
    assert!(!texts.iter().any(|t| t.contains("best August")));

    let estimator = TokenEstimator::new();
    assert!(estimator.count_conversation(&prepared.messages, &prepared.model_id) <= 100);
}

#[tokio::test]
async fn summarize_pipeline_with_a_mock_backend() {
    let summarizer = Arc::new(FnSummarizer::new(|_: &str| {
        Ok("The analyst pulled regional sales totals.".to_string())
    }));
    let conversation = analysis_conversation();
    let compressor = Compressor::new(Arc::new(TokenEstimator::new()));
    let policy =
        CompressionPolicy::new(CompressionMode::Summarize, 100).with_summarizer(summarizer);

    let prepared = compressor.compress(&conversation, &policy).await;

    // system, synthetic summary, then the last four messages verbatim
    // (with the tagged file result gisted along the way).
    assert_eq!(prepared.len(), 6);
    assert!(prepared.messages[1].is_system());
    assert!(
        prepared.messages[1]
            .content
            .as_deref()
            .unwrap()
            .contains("regional sales totals")
    );
    assert_eq!(
        prepared.messages[2].content.as_deref(),
        Some("North leads; checking the raw file.")
    );
    assert_eq!(
        prepared.messages[5].content.as_deref(),
        Some("Great. Anything anomalous?")
    );

    let estimator = TokenEstimator::new();
    assert!(
        estimator.count_conversation(&prepared.messages, &prepared.model_id)
            < estimator.count_conversation(&conversation.messages, &conversation.model_id)
    );
}

// ── Background summarization across turns ───────────────────────────

#[tokio::test]
async fn background_summary_feeds_the_next_turn() {
    let store = Arc::new(SummaryStore::new());
    let background = BackgroundSummarizer::new(
        Arc::clone(&store),
        Arc::new(FnSummarizer::new(|_: &str| {
            Ok("Earlier turns: pulled and ranked regional sales totals.".to_string())
        })),
    );

    let conversation = analysis_conversation();
    // Kick off summarization of the oldest exchange while the turn proceeds.
    background.trigger("sales-session", &conversation.messages[1..4]);
    background.settle().await;

    let done = store.poll("sales-session").expect("summary was published");
    assert!(done.summary.is_system());
    assert_eq!(done.source_messages, 3);

    // Next turn: splice the summary in place of the span it covers.
    let mut next = conversation.clone();
    next.messages.splice(1..4, [done.summary]);
    assert_eq!(next.len(), conversation.len() - 2);
    assert!(
        next.messages[1]
            .content
            .as_deref()
            .unwrap()
            .starts_with("Earlier turns:")
    );

    // The entry stays published after the splice; only a re-trigger for the
    // same key would replace it.
    let again = store.poll("sales-session").expect("summary stays published");
    assert_eq!(again.summary.content, next.messages[1].content);
}

// ── Phase gating across a session ───────────────────────────────────

#[test]
fn gate_tracks_a_full_session() {
    let mut gate = PhaseGate::new();
    assert!(gate.active_actions().is_empty());

    assert!(gate.transition(Phase::Querying));
    assert!(gate.can_use(RUN_QUERY));
    assert!(gate.can_use(SAVE_FINDING));
    assert!(!gate.can_use(EXECUTE_COMMAND));

    assert!(gate.transition(Phase::Analyzing));
    assert!(gate.can_use(EXECUTE_COMMAND));

    assert!(gate.transition(Phase::Reporting));
    assert!(!gate.can_use(RUN_QUERY));
    assert!(gate.can_use(SAVE_FINDING));

    assert!(gate.transition(Phase::Done));
    assert!(gate.active_actions().is_empty());
    assert!(gate.transition(Phase::Idle));
    assert_eq!(gate.history().len(), 6);
}

// ── Token accounting ────────────────────────────────────────────────

#[test]
fn breakdown_accounts_for_every_role() {
    let conversation = analysis_conversation();
    let estimator = TokenEstimator::new();
    let breakdown = estimator.breakdown(&conversation.messages, &conversation.model_id);

    assert!(breakdown.system > 0);
    assert!(breakdown.user > 0);
    assert!(breakdown.assistant > 0);
    assert!(breakdown.tool > 0);
    assert_eq!(
        breakdown.total,
        estimator.count_conversation(&conversation.messages, &conversation.model_id)
    );
    assert_eq!(
        breakdown.total,
        breakdown.system + breakdown.user + breakdown.assistant + breakdown.tool
    );
}
