use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::services::fetcher::Fetcher;
use crate::services::market_data::MarketDataProvider;
use crate::services::persister::Persister;
use crate::utils::retry::retry_fixed;

/// Attempts per symbol before it is counted as failed.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Sequential fetch-and-persist over the symbol universe.
///
/// Strictly one symbol at a time: the provider rate-limits aggressively, so
/// there is no fan-out. Pacing per `run`:
/// - failed attempt (not the last): `2 × delay` before retrying
/// - after every symbol, success or not: `delay`
/// - after every batch but the last: `3 × delay`
pub struct IngestionOrchestrator<P> {
    fetcher: Fetcher<P>,
    persister: Persister,
    symbols: Vec<String>,
}

impl<P: MarketDataProvider> IngestionOrchestrator<P> {
    pub fn new(fetcher: Fetcher<P>, persister: Persister, symbols: Vec<String>) -> Self {
        Self {
            fetcher,
            persister,
            symbols,
        }
    }

    pub fn fetcher(&self) -> &Fetcher<P> {
        &self.fetcher
    }

    pub async fn run(&self, batch_size: usize, delay: Duration) -> IngestionReport {
        let batch_size = batch_size.max(1);
        let total = self.symbols.len();
        let mut report = IngestionReport::default();

        log::info!("Starting to scrape {} stocks in batches of {}...", total, batch_size);

        let batch_count = total.div_ceil(batch_size);
        for (batch_idx, batch) in self.symbols.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            log::info!(
                "Processing batch {}: stocks {}-{}",
                batch_idx + 1,
                batch_start + 1,
                batch_start + batch.len()
            );

            for (i, symbol) in batch.iter().enumerate() {
                log::info!("Processing {} ({}/{})", symbol, batch_start + i + 1, total);

                match retry_fixed(symbol, MAX_ATTEMPTS, delay * 2, |_| self.attempt(symbol)).await {
                    Ok(()) => report.succeeded += 1,
                    Err(e) => {
                        report.failed += 1;
                        log::warn!("Failed to process {} after {} attempts: {}", symbol, MAX_ATTEMPTS, e);
                    }
                }

                sleep(delay).await;
            }

            if batch_idx + 1 < batch_count {
                let cooldown = delay * 3;
                log::info!("Batch complete. Waiting {:.1} seconds before next batch...", cooldown.as_secs_f64());
                sleep(cooldown).await;
            }
        }

        log::info!("Scraping complete! Success: {}, Failed: {}", report.succeeded, report.failed);
        report
    }

    async fn attempt(&self, symbol: &str) -> Result<()> {
        let record = self
            .fetcher
            .fetch(symbol)
            .await
            .ok_or_else(|| anyhow!("no data returned for {}", symbol))?;
        if self.persister.upsert(Some(&record)) {
            Ok(())
        } else {
            Err(anyhow!("could not save {}", symbol))
        }
    }
}
