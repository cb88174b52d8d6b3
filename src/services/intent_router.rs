//! Keyword routing from free-text criteria to a fixed screening query.
//!
//! Matching is plain substring membership on the lower-cased text, checked
//! group by group in `ROUTES` order; the first group with any hit wins.
//! Templates are static SQL and never see the user's text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryTemplate {
    Value,
    Growth,
    Dividend,
    Safe,
    LargeCap,
    Default,
}

/// Ordered (keywords, template) table. Precedence is the slice order.
pub const ROUTES: &[(&[&str], QueryTemplate)] = &[
    (&["value", "cheap", "undervalued"], QueryTemplate::Value),
    (&["growth", "growing", "high growth"], QueryTemplate::Growth),
    (&["dividend", "income", "yield"], QueryTemplate::Dividend),
    (&["safe", "stable", "low risk"], QueryTemplate::Safe),
    (&["large cap", "big", "large"], QueryTemplate::LargeCap),
];

/// Row cap shared by every template.
pub const RESULT_LIMIT: usize = 15;

impl QueryTemplate {
    pub fn sql(&self) -> &'static str {
        match self {
            QueryTemplate::Value => {
                "SELECT * FROM stocks WHERE pe_ratio < 15 AND pb_ratio < 2 AND roe > 10 ORDER BY pe_ratio ASC LIMIT 15"
            }
            QueryTemplate::Growth => {
                "SELECT * FROM stocks WHERE revenue_growth > 15 AND roe > 20 ORDER BY revenue_growth DESC LIMIT 15"
            }
            QueryTemplate::Dividend => {
                "SELECT * FROM stocks WHERE dividend_yield > 2 ORDER BY dividend_yield DESC LIMIT 15"
            }
            QueryTemplate::Safe => {
                "SELECT * FROM stocks WHERE debt_to_equity < 0.5 AND current_ratio > 1.5 AND roe > 10 ORDER BY debt_to_equity ASC LIMIT 15"
            }
            QueryTemplate::LargeCap => {
                "SELECT * FROM stocks WHERE market_cap > 50000 ORDER BY market_cap DESC LIMIT 15"
            }
            QueryTemplate::Default => {
                "SELECT * FROM stocks WHERE roe > 15 AND pe_ratio < 30 AND debt_to_equity < 1 ORDER BY roe DESC LIMIT 15"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryTemplate::Value => "value",
            QueryTemplate::Growth => "growth",
            QueryTemplate::Dividend => "dividend",
            QueryTemplate::Safe => "low risk",
            QueryTemplate::LargeCap => "large cap",
            QueryTemplate::Default => "quality",
        }
    }
}

pub fn route(criteria: &str) -> QueryTemplate {
    let criteria = criteria.to_lowercase();
    ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| criteria.contains(k)))
        .map(|(_, template)| *template)
        .unwrap_or(QueryTemplate::Default)
}
