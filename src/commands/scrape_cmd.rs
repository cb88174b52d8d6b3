use anyhow::Result;
use std::fmt::Write;

use crate::db::database::Database;
use crate::models::settings::AppSettings;
use crate::models::stock::DatabaseSummary;
use crate::services::fetcher::Fetcher;
use crate::services::ingestion::{IngestionOrchestrator, IngestionReport};
use crate::services::market_data::YahooFinanceProvider;
use crate::services::persister::Persister;
use crate::services::symbol_universe::SymbolUniverse;

/// Ensures the schema, scrapes the configured universe, then prints the
/// database summary and the run totals.
pub async fn run_scrape(settings: &AppSettings) -> Result<IngestionReport> {
    let delay = settings.item_delay()?;
    let db = Database::open(&settings.db_path)?;
    let universe = SymbolUniverse::load(&settings.symbols_file)?;
    let symbols = universe.list_symbols(settings.symbol_limit);

    let orchestrator = IngestionOrchestrator::new(
        Fetcher::new(YahooFinanceProvider::new()?),
        Persister::new(db.clone()),
        symbols,
    );
    let report = orchestrator.run(settings.batch_size, delay).await;

    match db.summary() {
        Ok(summary) => print!("{}", render_summary(&summary)),
        Err(e) => log::error!("Could not read database summary: {}", e),
    }
    println!(
        "\n✅ Scraping completed: {} successful, {} failed",
        report.succeeded, report.failed
    );
    Ok(report)
}

pub fn run_summary(settings: &AppSettings) -> Result<()> {
    let db = Database::open(&settings.db_path)?;
    print!("{}", render_summary(&db.summary()?));
    Ok(())
}

pub fn render_summary(summary: &DatabaseSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n📊 Database Summary:");
    let _ = writeln!(out, "Total stocks: {}", summary.total_stocks);

    let _ = writeln!(out, "\nSector distribution:");
    let width = summary
        .sectors
        .iter()
        .map(|s| s.sector.chars().count())
        .max()
        .unwrap_or(0)
        .max("sector".len());
    let _ = writeln!(out, "{:<width$}  count", "sector", width = width);
    for s in &summary.sectors {
        let _ = writeln!(out, "{:<width$}  {:>5}", s.sector, s.count, width = width);
    }

    let _ = writeln!(out, "\nSample data:");
    let _ = writeln!(
        out,
        "{:<14} {:<32} {:<22} {:>8} {:>8} {:>8}",
        "symbol", "name", "sector", "pe_ratio", "roe", "d/e"
    );
    for row in &summary.sample {
        let _ = writeln!(
            out,
            "{:<14} {:<32} {:<22} {:>8} {:>8} {:>8}",
            row.symbol,
            clip(row.name.as_deref().unwrap_or(""), 32),
            clip(row.sector.as_deref().unwrap_or(""), 22),
            fmt_opt(row.pe_ratio),
            fmt_opt(row.roe),
            fmt_opt(row.debt_to_equity)
        );
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
