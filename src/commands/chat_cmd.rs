use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;

use crate::db::database::Database;
use crate::models::settings::AppSettings;
use crate::services::ai_service::{AIService, GenerationService};
use crate::services::session::ScreenerSession;

const EXIT_TOKENS: [&str; 4] = ["/quit", "/exit", "bye", "goodbye"];

/// One line of console input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Quit,
    Clear,
    Stocks,
    Stats,
    Message(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }
    let lower = trimmed.to_lowercase();
    if EXIT_TOKENS.contains(&lower.as_str()) {
        return ChatInput::Quit;
    }
    match lower.as_str() {
        "/clear" => ChatInput::Clear,
        "/stocks" => ChatInput::Stocks,
        "/stats" => ChatInput::Stats,
        _ => ChatInput::Message(trimmed.to_string()),
    }
}

/// Handles a session-level command. These never reach the model and never
/// produce a conversation turn. Returns `false` for inputs that are not
/// session commands.
pub fn handle_command<G: GenerationService, W: Write>(
    session: &mut ScreenerSession<G>,
    input: &ChatInput,
    out: &mut W,
) -> Result<bool> {
    match input {
        ChatInput::Clear => {
            session.clear_context();
            writeln!(out, "✅ Conversation context cleared")?;
        }
        ChatInput::Stocks => {
            writeln!(out, "{}", session.render_current_stocks())?;
        }
        ChatInput::Stats => {
            let stats = session.stats();
            writeln!(out, "📈 Conversation Stats:")?;
            writeln!(out, "  • Messages: {}", stats.total_messages)?;
            writeln!(out, "  • Stocks in context: {}", stats.stocks_analyzed)?;
            writeln!(out, "  • Last query time: {}", stats.last_query_time)?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub async fn run_chat(settings: &AppSettings) -> Result<()> {
    let db = Database::open(&settings.db_path)?;
    let generator = AIService::new(settings.ai.clone())?;
    if settings.ai.api_key.is_empty() {
        log::warn!("No API key configured; replies will fail until SCREENER_API_KEY or GEMINI_API_KEY is set");
    }
    let mut session = ScreenerSession::new(db, generator, settings.pacing);
    let mut rl = DefaultEditor::new()?;
    let mut stdout = std::io::stdout();

    println!("🚀 Natural language Stock Screener");
    println!("💬 I'm your AI stock advisor. Ask me anything about Indian stocks!");
    println!("📋 Commands: /clear (clear context), /stocks (show current stocks), /stats (show stats)");
    println!("{}", "-".repeat(60));

    loop {
        session.await_input();
        let line = match rl.readline("\n🔵 You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n\n👋 Goodbye!");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let input = parse_input(&line);
        match &input {
            ChatInput::Empty => continue,
            ChatInput::Quit => {
                println!("\n👋 Thanks for using the stock screener! Happy investing!");
                break;
            }
            ChatInput::Message(message) => {
                let _ = rl.add_history_entry(message.as_str());
                if let Err(e) = session.process_message(message, &mut stdout).await {
                    println!("\n❌ Error: {}", e);
                    println!("Try rephrasing your question or use /clear to reset context");
                }
            }
            _ => {
                handle_command(&mut session, &input, &mut stdout)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   "), ChatInput::Empty);
        assert_eq!(parse_input("/QUIT"), ChatInput::Quit);
        assert_eq!(parse_input("Goodbye"), ChatInput::Quit);
        assert_eq!(parse_input(" bye "), ChatInput::Quit);
        assert_eq!(parse_input("/clear"), ChatInput::Clear);
        assert_eq!(parse_input("/Stocks"), ChatInput::Stocks);
        assert_eq!(parse_input("/stats"), ChatInput::Stats);
        assert_eq!(
            parse_input("  find value stocks "),
            ChatInput::Message("find value stocks".to_string())
        );
        // only whole-line tokens are commands
        assert_eq!(
            parse_input("bye for now"),
            ChatInput::Message("bye for now".to_string())
        );
    }
}
