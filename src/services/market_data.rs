use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Mutex;

use crate::models::stock::InfoRecord;
use crate::utils::http::build_yahoo_client;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";

/// External market-data source: one lookup per symbol.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn info(&self, symbol: &str) -> Result<InfoRecord>;
}

/// Yahoo Finance `quoteSummary` provider.
///
/// Yahoo wants a session cookie plus a crumb on every query. The crumb is
/// fetched lazily, cached, and dropped again on 401/403 so the next call
/// re-authenticates.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    endpoints: YahooEndpoints,
    crumb: Mutex<Option<String>>,
}

/// Base URLs the provider talks to.
#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    pub cookie_url: String,
    /// Tried in order until one hands out a crumb.
    pub crumb_urls: Vec<String>,
    pub quote_summary_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            cookie_url: COOKIE_URL.to_string(),
            crumb_urls: CRUMB_URLS.iter().map(|u| u.to_string()).collect(),
            quote_summary_url: QUOTE_SUMMARY_URL.to_string(),
        }
    }
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(YahooEndpoints::default())
    }

    pub fn with_endpoints(endpoints: YahooEndpoints) -> Result<Self> {
        Ok(Self::with_client(build_yahoo_client()?, endpoints))
    }

    /// `client` needs a cookie store for the crumb session to work.
    pub fn with_client(client: reqwest::Client, endpoints: YahooEndpoints) -> Self {
        Self {
            client,
            endpoints,
            crumb: Mutex::new(None),
        }
    }

    async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie matters; fc.yahoo.com itself answers 404.
        if let Err(e) = self.client.get(&self.endpoints.cookie_url).send().await {
            log::debug!("Yahoo cookie request failed: {}", e);
        }

        for endpoint in &self.endpoints.crumb_urls {
            let resp = match self.client.get(endpoint.as_str()).send().await {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("Crumb request to {} failed: {}", endpoint, e);
                    continue;
                }
            };
            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(anyhow!("Yahoo rate limited while fetching crumb"));
            }
            if !resp.status().is_success() {
                continue;
            }
            let body = resp.text().await?;
            let crumb = body.trim();
            if !crumb.is_empty() && crumb.len() < 64 && !crumb.contains('<') {
                *guard = Some(crumb.to_string());
                return Ok(crumb.to_string());
            }
        }
        Err(anyhow!("failed to obtain Yahoo crumb"))
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn info(&self, symbol: &str) -> Result<InfoRecord> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/{}?modules={}&crumb={}",
            self.endpoints.quote_summary_url,
            urlencoding::encode(symbol),
            QUOTE_SUMMARY_MODULES,
            urlencoding::encode(&crumb)
        );

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_crumb().await;
            return Err(anyhow!("Yahoo rejected credentials ({}) for {}", status, symbol));
        }

        let body: serde_json::Value = resp.json().await?;
        if !status.is_success() {
            let desc = body
                .pointer("/quoteSummary/error/description")
                .and_then(|d| d.as_str())
                .unwrap_or("unknown error");
            return Err(anyhow!("Yahoo quoteSummary error ({}) for {}: {}", status, symbol, desc));
        }

        let result = body
            .pointer("/quoteSummary/result/0")
            .ok_or_else(|| anyhow!("no quoteSummary result for {}", symbol))?;
        Ok(flatten_quote_summary(result))
    }
}

/// Flattens the per-module objects of a quoteSummary result into one flat
/// key-value record. `{"raw": x, "fmt": ..}` wrappers collapse to `x`, empty
/// wrappers and nulls are dropped, and the first module to supply a key wins.
pub fn flatten_quote_summary(result: &serde_json::Value) -> InfoRecord {
    let mut info = InfoRecord::new();
    let Some(modules) = result.as_object() else {
        return info;
    };

    for name in QUOTE_SUMMARY_MODULES.split(',') {
        let Some(fields) = modules.get(name).and_then(|m| m.as_object()) else {
            continue;
        };
        for (key, value) in fields {
            if info.contains_key(key) {
                continue;
            }
            let value = match value {
                serde_json::Value::Object(obj) => match obj.get("raw") {
                    Some(raw) => raw.clone(),
                    None => continue,
                },
                serde_json::Value::Null => continue,
                other => other.clone(),
            };
            if !value.is_null() {
                info.insert(key.clone(), value);
            }
        }
    }
    info
}
