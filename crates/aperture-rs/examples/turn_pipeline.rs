//! One agent turn, end to end: reduce, measure, compress, and gate.
//!
//! Builds a small analysis session with an oversized tool result, shows how
//! much the reducer reclaims, compresses down to a tight budget with a stub
//! summarizer, and prints which actions each phase would expose.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example turn_pipeline
//! ```

use std::sync::Arc;

use aperture_rs::prelude::*;

#[tokio::main]
async fn main() {
    // 1. A conversation the way a harness would hand it over: several turns
    //    of dialogue plus one raw tool result nobody trimmed.
    let dump: String = (0..500)
        .map(|i| format!("2026-08-11 10:{:02} region=north amount={}\n", i % 60, 900 + i))
        .collect();
    let mut conversation = Conversation::new("generic-local", 60);
    conversation.push(Message::system("You are a data analyst. Be precise."));
    conversation.push(Message::user("Which region is carrying this quarter?"));
    conversation.push(Message::assistant_tool_calls(vec![ToolCall::function(
        "call-1",
        "run_query",
        r#"{"sql":"SELECT * FROM sales WHERE quarter = 'Q3'"}"#,
    )]));
    conversation.push(Message::tool_result("call-1", &dump));
    conversation.push(Message::assistant_text("North, by a wide margin."));
    conversation.push(Message::user("Break that down by product."));
    conversation.push(Message::assistant_text("Widgets first, checking now."));
    conversation.push(Message::user("And flag anything anomalous."));

    let estimator = Arc::new(TokenEstimator::new());
    let before = estimator.count_conversation(&conversation.messages, &conversation.model_id);

    // 2. Reduce the raw tool output to a placeholder with a preview.
    let stats = ResultReducer::new().reduce(&mut conversation.messages);
    let after = estimator.count_conversation(&conversation.messages, &conversation.model_id);
    println!(
        "reduced {} result(s), freed {} chars: {before} -> {after} tokens",
        stats.reduced_messages, stats.chars_removed
    );

    // 3. Compress to the budget. The stub summarizer stands in for a model;
    //    everything older than the last four messages folds into one line.
    let summarizer = Arc::new(FnSummarizer::new(|transcript: &str| {
        Ok(format!(
            "(summary of {} chars of earlier conversation)",
            transcript.len()
        ))
    }));
    let policy = CompressionPolicy::new(CompressionMode::Summarize, conversation.budget)
        .with_summarizer(summarizer);
    let compressor = Compressor::new(Arc::clone(&estimator));
    let prepared = compressor.compress(&conversation, &policy).await;
    println!(
        "compressed {} -> {} messages ({} tokens, budget {})",
        conversation.len(),
        prepared.len(),
        estimator.count_conversation(&prepared.messages, &prepared.model_id),
        prepared.budget,
    );

    // 4. Ask the gate what the model may call as the session advances.
    let mut gate = PhaseGate::new();
    for phase in [Phase::Querying, Phase::Analyzing, Phase::Reporting] {
        gate.transition(phase);
        println!("{phase}: {}", gate.active_actions().join(", "));
    }

    // 5. The prepared conversation and the action list go to the model.
    for message in &prepared.messages {
        let text = message.content.as_deref().unwrap_or("(tool calls)");
        let shown: String = text.chars().take(72).collect();
        println!("  [{}] {shown}", message.role);
    }
}
