use anyhow::Result;
use futures::stream::{BoxStream, StreamExt};
use std::fmt::Write as _;
use std::io::Write;

use crate::db::database::Database;
use crate::models::conversation::{ConversationStats, ConversationTurn, SessionState, StreamChunk};
use crate::models::settings::PacingConfig;
use crate::models::stock::FundamentalsRecord;
use crate::services::ai_service::GenerationService;
use crate::services::context_assembler::build_prompt;
use crate::services::intent_router::route;
use crate::services::pacer;

/// Any of these in a message sends the turn through the database query.
pub const DATA_KEYWORDS: &[&str] = &[
    "find", "show", "recommend", "suggest", "good", "best", "stocks",
    "companies", "investment", "buy", "portfolio",
];

/// Rows listed by `/stocks` before collapsing into "... and N more".
const LISTING_LIMIT: usize = 10;

pub fn needs_stock_data(message: &str) -> bool {
    let message = message.to_lowercase();
    DATA_KEYWORDS.iter().any(|k| message.contains(k))
}

/// One user's conversation: rolling history, the stocks loaded by the most
/// recent query, and the current cycle state. Not shared across threads.
pub struct ScreenerSession<G> {
    db: Database,
    generator: G,
    pacing: PacingConfig,
    history: Vec<ConversationTurn>,
    current_stocks: Vec<FundamentalsRecord>,
    state: SessionState,
}

impl<G: GenerationService> ScreenerSession<G> {
    pub fn new(db: Database, generator: G, pacing: PacingConfig) -> Self {
        Self {
            db,
            generator,
            pacing,
            history: Vec::new(),
            current_stocks: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn current_stocks(&self) -> &[FundamentalsRecord] {
        &self.current_stocks
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn await_input(&mut self) {
        self.state = SessionState::AwaitingInput;
    }

    /// Runs one full cycle for `message`: optional query, prompt, generation,
    /// paced output to `out`, then one appended turn. Generation failures are
    /// rendered in-band; only a failing `out` makes this return `Err`.
    pub async fn process_message<W: Write>(&mut self, message: &str, out: &mut W) -> Result<String> {
        let mut rows: Vec<FundamentalsRecord> = Vec::new();
        if needs_stock_data(message) {
            self.state = SessionState::Querying;
            write!(out, "🔍 Searching database...")?;
            out.flush()?;
            rows = self.query_stocks(message).await;
            writeln!(out, " Found {} stocks", rows.len())?;
            self.current_stocks = rows.clone();
        }

        self.state = SessionState::Composing;
        let mut stream = self.compose(message, &rows).await;

        self.state = SessionState::Streaming;
        write!(out, "\n💡 AI Assistant: ")?;
        out.flush()?;
        let mut full_response = String::new();
        while let Some(chunk) = stream.next().await {
            write!(out, "{}", chunk.text())?;
            out.flush()?;
            full_response.push_str(chunk.text());
        }
        writeln!(out, "\n")?;

        self.history.push(ConversationTurn {
            user: message.to_string(),
            assistant: full_response.clone(),
            stocks_context: rows.len(),
        });
        self.state = SessionState::Idle;
        Ok(full_response)
    }

    /// Builds the prompt and makes the single generation call, returning the
    /// reply as a paced stream (or a one-chunk apology on failure).
    pub async fn compose(&self, message: &str, rows: &[FundamentalsRecord]) -> BoxStream<'static, StreamChunk> {
        let prompt = build_prompt(&self.history, message, Some(rows));
        match self.generator.generate(&prompt).await {
            Ok(reply) => pacer::paced(&reply, self.pacing),
            Err(e) => {
                log::error!("Generation failed: {}", e);
                pacer::error_stream(format!("I apologize, but I encountered an error: {}", e))
            }
        }
    }

    /// Routes `criteria` to a template and runs it on a blocking worker.
    /// Any failure yields an empty result.
    pub async fn query_stocks(&self, criteria: &str) -> Vec<FundamentalsRecord> {
        let template = route(criteria);
        log::debug!("Routing {:?} to {} template", criteria, template.label());
        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.query_stocks(template.sql())).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                log::error!("Database error: {}", e);
                Vec::new()
            }
            Err(e) => {
                log::error!("Database worker failed: {}", e);
                Vec::new()
            }
        }
    }

    pub fn clear_context(&mut self) {
        self.history.clear();
        self.current_stocks.clear();
    }

    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            total_messages: self.history.len(),
            stocks_analyzed: self.current_stocks.len(),
            last_query_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn render_current_stocks(&self) -> String {
        if self.current_stocks.is_empty() {
            return "No stocks currently loaded in context".to_string();
        }

        let mut out = format!("\n📊 Current stocks in context ({}):\n", self.current_stocks.len());
        for (i, stock) in self.current_stocks.iter().take(LISTING_LIMIT).enumerate() {
            let _ = writeln!(
                out,
                "{}. {} ({}) - {}",
                i + 1,
                stock.display_name(),
                stock.symbol,
                stock.display_sector()
            );
        }
        if self.current_stocks.len() > LISTING_LIMIT {
            let _ = writeln!(out, "... and {} more", self.current_stocks.len() - LISTING_LIMIT);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_stock_data() {
        assert!(needs_stock_data("Show me something"));
        assert!(needs_stock_data("what are the BEST picks"));
        assert!(needs_stock_data("is my portfolio ok"));
        assert!(!needs_stock_data("hello, how are you?"));
        assert!(!needs_stock_data("what is a P/E ratio"));
    }
}
