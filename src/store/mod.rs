//! SQLite persistence for accounts and listings.

mod accounts;
mod listings;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::MarketError;

/// Both tables carry a PRIMARY KEY that doubles as the application-level
/// uniqueness rule: one account per email, one listing per derived id. The
/// listing key constraint is what serializes concurrent duplicate creations
/// (the second INSERT fails, and is reported as a conflict).
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    email        TEXT PRIMARY KEY,
    external_id  TEXT NOT NULL,
    name         TEXT NOT NULL,
    role         TEXT NOT NULL,
    address      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS listings (
    id                   TEXT PRIMARY KEY,
    product_ndc          TEXT NOT NULL,
    pharmacy_name        TEXT NOT NULL,
    address              TEXT NOT NULL,
    pharmacy_id          TEXT NOT NULL,
    price                TEXT NOT NULL,
    quantity             INTEGER NOT NULL CHECK (quantity >= 0),
    pharmacy_expiration  TEXT NOT NULL,
    created_at           TEXT NOT NULL,
    generic_name         TEXT,
    labeler_name         TEXT,
    brand_name           TEXT,
    dosage_form          TEXT,
    route                TEXT,
    active_ingredients   TEXT,
    product_type         TEXT,
    package_description  TEXT,
    pharm_class          TEXT
);
"#;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MarketError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, MarketError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<(), MarketError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Acquires the shared store, mapping a poisoned lock to an internal error
/// instead of panicking in a request handler.
pub fn lock_store(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>, MarketError> {
    db.lock()
        .map_err(|_| MarketError::Internal("store lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initializes_both_tables() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"accounts".to_string()));
        assert!(tables.contains(&"listings".to_string()));
    }
}
