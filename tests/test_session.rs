//! Conversational session tests: query routing, prompt bounds, in-band
//! generation errors and the session-level commands. The generation service
//! is a local fake, pacing delays are zero.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use nse_screener::commands::chat_cmd::{handle_command, parse_input, ChatInput};
use nse_screener::db::database::Database;
use nse_screener::models::conversation::SessionState;
use nse_screener::models::settings::PacingConfig;
use nse_screener::models::stock::FundamentalsRecord;
use nse_screener::services::ai_service::GenerationService;
use nse_screener::services::session::ScreenerSession;

#[derive(Default)]
struct FakeGenerator {
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(anyhow!("503 Service Unavailable"));
        }
        Ok("ITC looks solid. Coal India pays well!".to_string())
    }
}

fn no_delay() -> PacingConfig {
    PacingConfig { word_delay_ms: 0, sentence_delay_ms: 0 }
}

fn dividend_stock(symbol: &str, name: &str, yield_pct: f64) -> FundamentalsRecord {
    FundamentalsRecord {
        symbol: symbol.to_string(),
        name: Some(name.to_string()),
        sector: Some("Energy".to_string()),
        pe_ratio: Some(8.0),
        roe: Some(40.0),
        dividend_yield: Some(yield_pct),
        ..Default::default()
    }
}

fn last_prompt(session: &ScreenerSession<FakeGenerator>) -> String {
    session.generator().prompts.lock().unwrap().last().cloned().unwrap_or_default()
}

fn seeded_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("stocks.db")).unwrap();
    db.upsert_fundamentals(&dividend_stock("COALINDIA.NS", "Coal India Limited", 6.2)).unwrap();
    db.upsert_fundamentals(&dividend_stock("ITC.NS", "ITC Limited", 3.4)).unwrap();
    db.upsert_fundamentals(&dividend_stock("TCS.NS", "Tata Consultancy Services", 1.2)).unwrap();
    (dir, db)
}

// ==================== query path ====================

#[tokio::test]
async fn test_data_message_queries_and_loads_context() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    let mut out = Vec::new();

    let reply = session
        .process_message("show me dividend income stocks", &mut out)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Found 2 stocks"));
    assert!(printed.contains("ITC looks solid."));
    assert_eq!(reply, "ITC looks solid. Coal India pays well!");

    let symbols: Vec<&str> = session.current_stocks().iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["COALINDIA.NS", "ITC.NS"]);

    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].stocks_context, 2);
    assert_eq!(session.history()[0].assistant, reply);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_prompt_carries_rows_and_message() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    session
        .process_message("recommend dividend payers", &mut std::io::sink())
        .await
        .unwrap();

    let prompt = last_prompt(&session);
    assert!(prompt.contains("Current stock data available:"));
    assert!(prompt.contains("• Coal India Limited (COALINDIA.NS): PE=8.00, ROE=40.00%, Sector=Energy"));
    assert!(!prompt.contains("TCS.NS"));
    assert!(prompt.contains("Current user message: recommend dividend payers"));

    // follow-up without data keywords: history is carried, no rows
    let mut out = Vec::new();
    session.process_message("what about risks?", &mut out).await.unwrap();
    assert!(!String::from_utf8(out).unwrap().contains("Searching database"));
    let prompt = last_prompt(&session);
    assert!(prompt.contains("User: recommend dividend payers"));
    assert!(!prompt.contains("Current stock data available:"));
    // the previous query's rows stay loaded for /stocks
    assert_eq!(session.current_stocks().len(), 2);
}

#[tokio::test]
async fn test_chat_message_skips_query() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    let mut out = Vec::new();

    session.process_message("hello there", &mut out).await.unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(!printed.contains("Searching database"));
    assert!(session.current_stocks().is_empty());
    assert_eq!(session.history()[0].stocks_context, 0);
}

#[tokio::test]
async fn test_query_error_behaves_like_no_matches() {
    let dir = tempfile::tempdir().unwrap();
    // no schema: the SELECT fails
    let db = Database::new(dir.path().join("stocks.db"));
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    let mut out = Vec::new();

    let reply = session.process_message("find good stocks", &mut out).await.unwrap();

    assert!(String::from_utf8(out).unwrap().contains("Found 0 stocks"));
    assert!(session.current_stocks().is_empty());
    assert!(!reply.is_empty());
}

// ==================== generation errors ====================

#[tokio::test]
async fn test_generation_error_is_in_band_and_loop_continues() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::failing(), no_delay());
    let mut out = Vec::new();

    let reply = session.process_message("hi", &mut out).await.unwrap();
    assert!(reply.starts_with("I apologize, but I encountered an error:"));
    assert!(reply.contains("503"));
    assert_eq!(session.history().len(), 1);

    let again = session.process_message("hi again", &mut out).await.unwrap();
    assert!(again.starts_with("I apologize"));
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.state(), SessionState::Idle);
}

// ==================== context bounds ====================

#[tokio::test]
async fn test_prompt_history_bounded_to_six_turns() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());

    for i in 0..8 {
        session
            .process_message(&format!("message number {}", i), &mut std::io::sink())
            .await
            .unwrap();
    }
    assert_eq!(session.history().len(), 8);

    // the 8th call saw turns 0..=6; only 1..=6 make it into the prompt
    let prompt = last_prompt(&session);
    assert_eq!(prompt.matches("User: ").count(), 6);
    assert!(prompt.contains("User: message number 6\n"));
    assert!(prompt.contains("User: message number 1\n"));
    assert!(!prompt.contains("User: message number 0\n"));
}

#[tokio::test]
async fn test_generator_sees_at_most_ten_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("stocks.db")).unwrap();
    for i in 0..14 {
        db.upsert_fundamentals(&dividend_stock(&format!("D{}.NS", i), &format!("Div {}", i), 3.0 + i as f64))
            .unwrap();
    }
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());

    session
        .process_message("best dividend yield stocks", &mut std::io::sink())
        .await
        .unwrap();

    assert_eq!(session.current_stocks().len(), 14);
    assert_eq!(last_prompt(&session).matches("• ").count(), 10);
}

// ==================== session commands ====================

#[tokio::test]
async fn test_commands_do_not_create_turns() {
    let (_dir, db) = seeded_db();
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    session
        .process_message("show dividend stocks", &mut std::io::sink())
        .await
        .unwrap();

    let mut out = Vec::new();
    assert!(handle_command(&mut session, &parse_input("/stocks"), &mut out).unwrap());
    assert!(handle_command(&mut session, &parse_input("/stats"), &mut out).unwrap());
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Current stocks in context (2)"));
    assert!(printed.contains("1. Coal India Limited (COALINDIA.NS) - Energy"));
    assert!(printed.contains("Messages: 1"));
    assert!(printed.contains("Stocks in context: 2"));
    assert_eq!(session.history().len(), 1);

    let mut out = Vec::new();
    assert!(handle_command(&mut session, &ChatInput::Clear, &mut out).unwrap());
    assert!(String::from_utf8(out).unwrap().contains("Conversation context cleared"));
    assert!(session.history().is_empty());
    assert!(session.current_stocks().is_empty());
    assert_eq!(session.render_current_stocks(), "No stocks currently loaded in context");

    let msg = parse_input("find value stocks");
    assert!(!handle_command(&mut session, &msg, &mut std::io::sink()).unwrap());
}

#[tokio::test]
async fn test_stocks_listing_collapses_after_ten() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("stocks.db")).unwrap();
    for i in 0..12 {
        db.upsert_fundamentals(&dividend_stock(&format!("D{}.NS", i), &format!("Div {}", i), 3.0 + i as f64))
            .unwrap();
    }
    let mut session = ScreenerSession::new(db, FakeGenerator::default(), no_delay());
    session.process_message("show dividend stocks", &mut std::io::sink()).await.unwrap();

    let listing = session.render_current_stocks();
    assert!(listing.contains("Current stocks in context (12)"));
    assert!(listing.contains("10. "));
    assert!(!listing.contains("11. "));
    assert!(listing.contains("... and 2 more"));
}
