use anyhow::Result;
use rusqlite::{Connection, Row};
use std::path::{Path, PathBuf};

use crate::models::stock::{DatabaseSummary, FundamentalsRecord, SampleRow, SectorCount};

/// File-addressed fundamentals store.
///
/// Holds only the path: every operation opens its own connection and drops it
/// before returning, so the handle is cheap to clone into worker tasks.
#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
}

impl Database {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    /// Opens the store and makes sure the schema exists. Failure here is fatal at startup.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db = Self::new(db_path);
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Connection::open(&self.db_path)?)
    }

    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS stocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT UNIQUE NOT NULL,
                name TEXT,
                sector TEXT,
                industry TEXT,
                market_cap REAL,
                pe_ratio REAL,
                pb_ratio REAL,
                roe REAL,
                debt_to_equity REAL,
                current_ratio REAL,
                revenue_growth REAL,
                net_profit_margin REAL,
                dividend_yield REAL,
                price REAL,
                volume INTEGER,
                last_updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;
        log::info!("Database setup complete ({})", self.db_path.display());
        Ok(())
    }

    /// Insert-or-replace keyed on symbol. A second write for the same symbol
    /// replaces the whole row; nothing from the old row survives.
    pub fn upsert_fundamentals(&self, r: &FundamentalsRecord) -> Result<()> {
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO stocks (
                symbol, name, sector, industry, market_cap, pe_ratio, pb_ratio,
                roe, debt_to_equity, current_ratio, revenue_growth,
                net_profit_margin, dividend_yield, price, volume
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                r.symbol, r.name, r.sector, r.industry, r.market_cap, r.pe_ratio, r.pb_ratio,
                r.roe, r.debt_to_equity, r.current_ratio, r.revenue_growth,
                r.net_profit_margin, r.dividend_yield, r.price, r.volume
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_fundamentals(&self, symbol: &str) -> Result<Option<FundamentalsRecord>> {
        let conn = self.connect()?;
        let result = conn.query_row(
            "SELECT * FROM stocks WHERE symbol = ?1",
            rusqlite::params![symbol],
            record_from_row,
        );
        match result {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs one of the fixed screening templates. Only `'static` SQL is
    /// accepted so user text can never reach the statement.
    pub fn query_stocks(&self, sql: &'static str) -> Result<Vec<FundamentalsRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], record_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn summary(&self) -> Result<DatabaseSummary> {
        let conn = self.connect()?;
        let total_stocks: i64 = conn.query_row("SELECT COUNT(*) FROM stocks", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT sector, COUNT(*) FROM stocks WHERE sector IS NOT NULL GROUP BY sector ORDER BY sector",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SectorCount {
                sector: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut sectors = Vec::new();
        for row in rows {
            sectors.push(row?);
        }

        let mut stmt = conn.prepare(
            "SELECT symbol, name, sector, pe_ratio, roe, debt_to_equity FROM stocks WHERE pe_ratio IS NOT NULL LIMIT 5",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SampleRow {
                symbol: row.get(0)?,
                name: row.get(1)?,
                sector: row.get(2)?,
                pe_ratio: row.get(3)?,
                roe: row.get(4)?,
                debt_to_equity: row.get(5)?,
            })
        })?;
        let mut sample = Vec::new();
        for row in rows {
            sample.push(row?);
        }

        Ok(DatabaseSummary { total_stocks, sectors, sample })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FundamentalsRecord> {
    Ok(FundamentalsRecord {
        symbol: row.get("symbol")?,
        name: row.get("name")?,
        sector: row.get("sector")?,
        industry: row.get("industry")?,
        market_cap: row.get("market_cap")?,
        pe_ratio: row.get("pe_ratio")?,
        pb_ratio: row.get("pb_ratio")?,
        roe: row.get("roe")?,
        debt_to_equity: row.get("debt_to_equity")?,
        current_ratio: row.get("current_ratio")?,
        revenue_growth: row.get("revenue_growth")?,
        net_profit_margin: row.get("net_profit_margin")?,
        dividend_yield: row.get("dividend_yield")?,
        price: row.get("price")?,
        volume: row.get("volume")?,
        last_updated: row.get("last_updated")?,
    })
}
