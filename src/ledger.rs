//! Relational counter store

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

const UPSERT_SQL: &str = "INSERT INTO mines (name, blocks_mined) VALUES (?1, ?2) \
     ON CONFLICT(name) DO UPDATE SET blocks_mined = excluded.blocks_mined";

/// How long a statement may wait on a locked database before giving up.
/// A stalled store must not starve the sync interval.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cumulative mined-block counters, keyed by mine name.
///
/// Lives independently of the file snapshots and wins over them at load time.
/// Append-or-update semantics only; no history is kept.
pub struct ProgressLedger {
    conn: Connection,
}

impl ProgressLedger {
    /// Opens (or creates) the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// In-memory ledger, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Idempotent creation of the counter table.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS mines (\
                 name VARCHAR(64) PRIMARY KEY,\
                 blocks_mined INT NOT NULL\
             )",
            [],
        )?;
        Ok(())
    }

    /// Cumulative counter for `name`, if a row exists.
    pub fn lookup(&self, name: &str) -> Result<Option<i64>> {
        let count = self
            .conn
            .query_row(
                "SELECT blocks_mined FROM mines WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count)
    }

    /// Insert-or-update a single counter row.
    pub fn upsert(&self, name: &str, blocks_mined: i64) -> Result<()> {
        self.conn.execute(UPSERT_SQL, params![name, blocks_mined])?;
        Ok(())
    }

    /// Transactional bulk insert-or-update: commits every row or none.
    pub fn batch_upsert(&mut self, entries: &[(String, i64)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (name, blocks_mined) in entries {
                stmt.execute(params![name, blocks_mined])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Removes the row for `name`; true if one existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM mines WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ledger() -> ProgressLedger {
        let ledger = ProgressLedger::open_in_memory().unwrap();
        ledger.ensure_schema().unwrap();
        ledger
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let ledger = ledger();
        ledger.ensure_schema().unwrap();
        ledger.ensure_schema().unwrap();
    }

    #[test]
    fn test_lookup_missing_returns_none() {
        let ledger = ledger();
        assert_eq!(ledger.lookup("ghost").unwrap(), None);
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let ledger = ledger();
        ledger.upsert("quarry", 10).unwrap();
        assert_eq!(ledger.lookup("quarry").unwrap(), Some(10));

        ledger.upsert("quarry", 25).unwrap();
        assert_eq!(ledger.lookup("quarry").unwrap(), Some(25));
    }

    #[test]
    fn test_batch_upsert_writes_every_row() {
        let mut ledger = ledger();
        ledger.upsert("a", 1).unwrap();

        let entries = vec![
            ("a".to_string(), 100),
            ("b".to_string(), 200),
            ("c".to_string(), 300),
        ];
        ledger.batch_upsert(&entries).unwrap();

        assert_eq!(ledger.lookup("a").unwrap(), Some(100));
        assert_eq!(ledger.lookup("b").unwrap(), Some(200));
        assert_eq!(ledger.lookup("c").unwrap(), Some(300));
    }

    #[test]
    fn test_failed_batch_leaves_prior_state() {
        let mut ledger = ledger();
        ledger.upsert("a", 1).unwrap();

        // Simulate an unavailable store: the table is gone for the duration
        // of the batch, so every statement fails and nothing commits.
        ledger
            .conn
            .execute("ALTER TABLE mines RENAME TO mines_hidden", [])
            .unwrap();
        let result = ledger.batch_upsert(&[("a".to_string(), 999), ("b".to_string(), 5)]);
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));

        ledger
            .conn
            .execute("ALTER TABLE mines_hidden RENAME TO mines", [])
            .unwrap();
        assert_eq!(ledger.lookup("a").unwrap(), Some(1));
        assert_eq!(ledger.lookup("b").unwrap(), None);
    }

    #[test]
    fn test_delete_reports_existence() {
        let ledger = ledger();
        ledger.upsert("quarry", 5).unwrap();
        assert!(ledger.delete("quarry").unwrap());
        assert!(!ledger.delete("quarry").unwrap());
    }
}
