use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ai::AIConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_symbols_file")]
    pub symbols_file: PathBuf,
    #[serde(default = "default_symbol_limit")]
    pub symbol_limit: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Base rate-limit delay between symbols, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    #[serde(default)]
    pub ai: AIConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

fn default_db_path() -> PathBuf { PathBuf::from("stocks.db") }
fn default_symbols_file() -> PathBuf { PathBuf::from("config/nse_symbols.txt") }
fn default_symbol_limit() -> usize { 100 }
fn default_batch_size() -> usize { 10 }
fn default_delay_secs() -> f64 { 2.0 }

/// Upper bound for `delay_secs`; the cooldown multiplies it by 3.
pub const MAX_DELAY_SECS: f64 = 3600.0;

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            symbols_file: default_symbols_file(),
            symbol_limit: default_symbol_limit(),
            batch_size: default_batch_size(),
            delay_secs: default_delay_secs(),
            ai: AIConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl AppSettings {
    /// Loads settings from a JSON file. A missing file yields the defaults;
    /// a file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing settings file {}", path.display()))?
        } else {
            log::debug!("No settings file at {}, using defaults", path.display());
            Self::default()
        };
        settings.apply_env();
        Ok(settings)
    }

    /// `delay_secs` as a `Duration`. Rejects NaN, negative and out-of-range values.
    pub fn item_delay(&self) -> Result<Duration> {
        if !(0.0..=MAX_DELAY_SECS).contains(&self.delay_secs) {
            return Err(anyhow!(
                "delay_secs must be between 0 and {} seconds, got {}",
                MAX_DELAY_SECS,
                self.delay_secs
            ));
        }
        Duration::try_from_secs_f64(self.delay_secs).context("converting delay_secs")
    }

    fn apply_env(&mut self) {
        let key = std::env::var("SCREENER_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
        if let Some(key) = key {
            self.ai.api_key = key;
        }
        if let Some(db) = std::env::var("SCREENER_DB_PATH").ok().filter(|p| !p.is_empty()) {
            self.db_path = PathBuf::from(db);
        }
    }
}

/// Delays used to re-pace a complete reply into an incremental stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_word_delay_ms")]
    pub word_delay_ms: u64,
    #[serde(default = "default_sentence_delay_ms")]
    pub sentence_delay_ms: u64,
}

fn default_word_delay_ms() -> u64 { 50 }
fn default_sentence_delay_ms() -> u64 { 200 }

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            word_delay_ms: default_word_delay_ms(),
            sentence_delay_ms: default_sentence_delay_ms(),
        }
    }
}
