use crate::db::database::Database;
use crate::models::stock::FundamentalsRecord;

/// Boolean-reporting write boundary over the store.
#[derive(Debug, Clone)]
pub struct Persister {
    db: Database,
}

impl Persister {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Upserts `record`. An absent record is a failure without touching storage.
    /// Storage errors are logged and reported as `false`; the connection is
    /// released by the store on every path.
    pub fn upsert(&self, record: Option<&FundamentalsRecord>) -> bool {
        let Some(record) = record else {
            return false;
        };
        match self.db.upsert_fundamentals(record) {
            Ok(()) => {
                log::info!("Saved data for {}", record.symbol);
                true
            }
            Err(e) => {
                log::error!("Error saving {}: {}", record.symbol, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("stocks.db")).unwrap();
        let persister = Persister::new(db.clone());
        assert!(!persister.upsert(None));
        assert_eq!(db.summary().unwrap().total_stocks, 0);
    }

    #[test]
    fn test_storage_error_is_false() {
        let dir = tempfile::tempdir().unwrap();
        // no schema: the insert fails
        let persister = Persister::new(Database::new(dir.path().join("stocks.db")));
        let rec = FundamentalsRecord {
            symbol: "LT.NS".to_string(),
            ..Default::default()
        };
        assert!(!persister.upsert(Some(&rec)));
    }

    #[test]
    fn test_upsert_success() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("stocks.db")).unwrap();
        let persister = Persister::new(db.clone());
        let rec = FundamentalsRecord {
            symbol: "LT.NS".to_string(),
            pe_ratio: Some(31.0),
            ..Default::default()
        };
        assert!(persister.upsert(Some(&rec)));
        assert_eq!(db.get_fundamentals("LT.NS").unwrap().unwrap().pe_ratio, Some(31.0));
    }
}
