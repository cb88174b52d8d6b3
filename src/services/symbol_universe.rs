use anyhow::{Context, Result};
use std::path::Path;

/// Ordered, curated list of ticker identifiers, largest market-cap tier first.
#[derive(Debug, Clone, Default)]
pub struct SymbolUniverse {
    symbols: Vec<String>,
}

impl SymbolUniverse {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    /// Reads one symbol per line. Blank lines and `#` comments are skipped,
    /// as is anything after a `#` on a symbol line.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading symbol list {}", path.display()))?;
        let universe = Self::parse(&text);
        log::info!("Loaded {} symbols from {}", universe.len(), path.display());
        Ok(universe)
    }

    pub fn parse(text: &str) -> Self {
        let symbols = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { symbols }
    }

    /// Up to `limit` symbols in list order.
    pub fn list_symbols(&self, limit: usize) -> Vec<String> {
        self.symbols.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
# Top by market cap
RELIANCE.NS
TCS.NS

HDFCBANK.NS   # bank
M&M.NS
";

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let u = SymbolUniverse::parse(LIST);
        assert_eq!(u.list_symbols(10), vec!["RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "M&M.NS"]);
    }

    #[test]
    fn test_limit_truncates_in_order() {
        let u = SymbolUniverse::parse(LIST);
        assert_eq!(u.list_symbols(2), vec!["RELIANCE.NS", "TCS.NS"]);
        assert!(u.list_symbols(0).is_empty());
    }

    #[test]
    fn test_shipped_list() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/nse_symbols.txt");
        let u = SymbolUniverse::load(&path).unwrap();
        assert_eq!(u.len(), 100);
        assert_eq!(u.list_symbols(1), vec!["RELIANCE.NS"]);
        assert_eq!(u.list_symbols(500).len(), 100);
    }
}
