use std::fmt::Write;

use crate::models::conversation::ConversationTurn;
use crate::models::stock::FundamentalsRecord;

/// Prior turns carried into a prompt.
pub const MAX_HISTORY_TURNS: usize = 6;
/// Stock rows carried into a prompt.
pub const MAX_PROMPT_ROWS: usize = 10;

pub const SYSTEM_PROMPT: &str = "\
You are an expert financial advisor and stock analyst specializing in Indian markets.
You have access to a comprehensive database of Indian stocks with fundamental data.

Your personality:
- Friendly, conversational, and approachable
- Expert knowledge but explains things simply
- Asks clarifying questions when needed
- Provides actionable insights
- Mentions specific stock names and data when relevant

Database Schema Available:
- stocks table with: symbol, name, sector, industry, market_cap, pe_ratio, pb_ratio,
  roe, debt_to_equity, current_ratio, revenue_growth, net_profit_margin, dividend_yield, price, volume

You can help with:
- Stock screening and recommendations
- Fundamental analysis
- Portfolio advice
- Market insights
- Risk assessment

Always provide specific, data-backed reasoning for your recommendations.";

const CLOSING_INSTRUCTION: &str = "Respond naturally and conversationally. Use the stock data to provide specific recommendations when relevant.";

/// Builds the generation prompt: system instructions, the last
/// `MAX_HISTORY_TURNS` turns, the first `MAX_PROMPT_ROWS` rows (if any), the
/// user's message, then the closing instruction.
pub fn build_prompt(
    history: &[ConversationTurn],
    user_message: &str,
    rows: Option<&[FundamentalsRecord]>,
) -> String {
    let mut prompt = format!("{}\n\n", SYSTEM_PROMPT);

    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in &history[skip..] {
            let _ = write!(prompt, "User: {}\nAssistant: {}\n\n", turn.user, turn.assistant);
        }
    }

    if let Some(rows) = rows.filter(|r| !r.is_empty()) {
        prompt.push_str("Current stock data available:\n");
        for stock in rows.iter().take(MAX_PROMPT_ROWS) {
            prompt.push_str(&stock_line(stock));
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    let _ = write!(prompt, "Current user message: {}\n\n", user_message);
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

/// `• name (symbol): PE=…, ROE=…%, Sector=…`
pub fn stock_line(stock: &FundamentalsRecord) -> String {
    format!(
        "• {} ({}): PE={}, ROE={}%, Sector={}",
        stock.display_name(),
        stock.symbol,
        fmt_metric(stock.pe_ratio),
        fmt_metric(stock.roe),
        stock.display_sector()
    )
}

fn fmt_metric(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}
