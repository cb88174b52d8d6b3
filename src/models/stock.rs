use serde::{Deserialize, Serialize};

/// Key-value info record returned by the market-data provider for one symbol.
/// Keys follow the provider's own field names (`longName`, `forwardPE`, ...).
pub type InfoRecord = serde_json::Map<String, serde_json::Value>;

/// One row of the `stocks` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub roe: Option<f64>,               // whole percent
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,    // whole percent
    pub net_profit_margin: Option<f64>, // whole percent
    pub dividend_yield: Option<f64>,    // whole percent
    pub price: Option<f64>,
    pub volume: Option<i64>,
    /// Set by the store on write; `None` for records that were never persisted.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl FundamentalsRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("N/A")
    }

    pub fn display_sector(&self) -> &str {
        self.sector.as_deref().filter(|s| !s.is_empty()).unwrap_or("N/A")
    }
}

/// Sector bucket in the database summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCount {
    pub sector: String,
    pub count: i64,
}

/// Sample row shown in the database summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    pub total_stocks: i64,
    pub sectors: Vec<SectorCount>,
    pub sample: Vec<SampleRow>,
}
