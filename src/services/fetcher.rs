use crate::models::stock::{FundamentalsRecord, InfoRecord};
use crate::services::market_data::MarketDataProvider;

/// Fetches one symbol from the market-data provider and normalizes it.
pub struct Fetcher<P> {
    provider: P,
}

impl<P: MarketDataProvider> Fetcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// `None` on any provider failure; the error is logged here and goes no further.
    pub async fn fetch(&self, symbol: &str) -> Option<FundamentalsRecord> {
        match self.provider.info(symbol).await {
            Ok(info) => Some(record_from_info(symbol, &info)),
            Err(e) => {
                log::error!("Error fetching data for {}: {}", symbol, e);
                None
            }
        }
    }
}

/// Maps provider fields onto the `stocks` row.
///
/// Fallbacks: P/E is forward P/E else trailing, price is current else
/// regular-market. ROE, revenue growth, profit margin and dividend yield come
/// in as fractions and are stored as whole percentages.
pub fn record_from_info(symbol: &str, info: &InfoRecord) -> FundamentalsRecord {
    FundamentalsRecord {
        symbol: symbol.to_string(),
        name: Some(text(info, "longName")),
        sector: Some(text(info, "sector")),
        industry: Some(text(info, "industry")),
        market_cap: number(info, "marketCap"),
        pe_ratio: number_or(info, "forwardPE", "trailingPE"),
        pb_ratio: number(info, "priceToBook"),
        roe: percent(info, "returnOnEquity"),
        debt_to_equity: number(info, "debtToEquity"),
        current_ratio: number(info, "currentRatio"),
        revenue_growth: percent(info, "revenueGrowth"),
        net_profit_margin: percent(info, "profitMargins"),
        dividend_yield: percent(info, "dividendYield"),
        price: number_or(info, "currentPrice", "regularMarketPrice"),
        volume: info
            .get("volume")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))),
        last_updated: None,
    }
}

fn text(info: &InfoRecord, key: &str) -> String {
    info.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

fn number(info: &InfoRecord, key: &str) -> Option<f64> {
    info.get(key).and_then(|v| v.as_f64())
}

// A zero primary value counts as missing and falls through to the secondary.
fn number_or(info: &InfoRecord, primary: &str, secondary: &str) -> Option<f64> {
    number(info, primary)
        .filter(|v| *v != 0.0)
        .or_else(|| number(info, secondary))
}

fn percent(info: &InfoRecord, key: &str) -> Option<f64> {
    number(info, key).map(|v| v * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: serde_json::Value) -> InfoRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_percent_fields_scaled() {
        let rec = record_from_info(
            "ITC.NS",
            &info(json!({
                "returnOnEquity": 0.285,
                "revenueGrowth": 0.071,
                "profitMargins": 0.25,
                "dividendYield": 0.031
            })),
        );
        assert!((rec.roe.unwrap() - 28.5).abs() < 1e-9);
        assert!((rec.revenue_growth.unwrap() - 7.1).abs() < 1e-9);
        assert!((rec.net_profit_margin.unwrap() - 25.0).abs() < 1e-9);
        assert!((rec.dividend_yield.unwrap() - 3.1).abs() < 1e-9);
    }

    #[test]
    fn test_missing_numbers_are_null_not_zero() {
        let rec = record_from_info("MRF.NS", &info(json!({ "longName": "MRF Limited" })));
        assert_eq!(rec.name.as_deref(), Some("MRF Limited"));
        assert_eq!(rec.sector.as_deref(), Some(""));
        assert_eq!(rec.roe, None);
        assert_eq!(rec.dividend_yield, None);
        assert_eq!(rec.pe_ratio, None);
        assert_eq!(rec.price, None);
        assert_eq!(rec.volume, None);
    }

    #[test]
    fn test_fallbacks() {
        let rec = record_from_info(
            "WIPRO.NS",
            &info(json!({
                "trailingPE": 21.4,
                "regularMarketPrice": 512.3,
                "volume": 1234567
            })),
        );
        assert_eq!(rec.pe_ratio, Some(21.4));
        assert_eq!(rec.price, Some(512.3));
        assert_eq!(rec.volume, Some(1_234_567));

        let rec = record_from_info(
            "WIPRO.NS",
            &info(json!({ "forwardPE": 19.0, "trailingPE": 21.4, "currentPrice": 510.0, "regularMarketPrice": 512.3 })),
        );
        assert_eq!(rec.pe_ratio, Some(19.0));
        assert_eq!(rec.price, Some(510.0));
    }

    #[test]
    fn test_zero_forward_pe_falls_through() {
        let rec = record_from_info("X.NS", &info(json!({ "forwardPE": 0.0, "trailingPE": 12.0 })));
        assert_eq!(rec.pe_ratio, Some(12.0));
    }
}
