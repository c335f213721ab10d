//! SQLite-backed index store
//!
//! The reference relational backend: one mutex-guarded connection, prepared
//! statements, and a single transaction per ingest. Reads are serialized by
//! the same lock; the service's result cache absorbs hot repeated queries.

use crate::error::StoreError;
use crate::models::{ContentMetadata, PutOutcome, StoreStats};
use crate::store::IndexStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use waveprint_core::Fingerprint;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    content_id  TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    source      TEXT NOT NULL,
    duration_ms INTEGER NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS postings (
    content_id TEXT NOT NULL REFERENCES content(content_id),
    hash_value INTEGER NOT NULL,
    position   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_postings_hash ON postings(hash_value);
CREATE INDEX IF NOT EXISTS idx_postings_content ON postings(content_id);

CREATE TABLE IF NOT EXISTS fingerprint_meta (
    content_id TEXT PRIMARY KEY REFERENCES content(content_id),
    digest     TEXT NOT NULL,
    num_hashes INTEGER NOT NULL
);
"#;

/// Mutex-guarded SQLite store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize(conn)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl IndexStore for SqliteStore {
    fn put_item(
        &self,
        content_id: &str,
        fingerprint: &Fingerprint,
        metadata: &ContentMetadata,
    ) -> Result<PutOutcome, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO content (content_id, title, source, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                content_id,
                metadata.title,
                metadata.source,
                fingerprint.duration_ms as i64,
                metadata.created_at
            ],
        )?;

        if inserted == 0 {
            log::debug!("put_item: {} already stored, skipping postings", content_id);
            return Ok(PutOutcome::AlreadyExists);
        }

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO postings (content_id, hash_value, position) VALUES (?1, ?2, ?3)",
            )?;
            for (position, hash) in fingerprint.hashes.iter().enumerate() {
                stmt.execute(params![content_id, *hash as i64, position as i64])?;
            }
        }

        tx.execute(
            "INSERT INTO fingerprint_meta (content_id, digest, num_hashes) VALUES (?1, ?2, ?3)",
            params![
                content_id,
                fingerprint.digest,
                fingerprint.hashes.len() as i64
            ],
        )?;

        tx.commit()?;
        Ok(PutOutcome::Inserted)
    }

    fn postings_for(&self, hash: u32, limit: usize) -> Result<Vec<(String, u32)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT content_id, COUNT(*) AS match_count
             FROM postings
             WHERE hash_value = ?1
             GROUP BY content_id
             ORDER BY match_count DESC, content_id ASC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![hash as i64, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn get_item(&self, content_id: &str) -> Result<Option<ContentMetadata>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT content_id, title, source, duration_ms, created_at
             FROM content WHERE content_id = ?1",
            params![content_id],
            |row| {
                Ok(ContentMetadata {
                    content_id: row.get(0)?,
                    title: row.get(1)?,
                    source: row.get(2)?,
                    duration_ms: row.get::<_, i64>(3)? as u64,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn fingerprint_len(&self, content_id: &str) -> Result<Option<usize>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT num_hashes FROM fingerprint_meta WHERE content_id = ?1",
            params![content_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(StoreError::from)
        .map(|n| n.map(|n| n as usize))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock();

        let item_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?;
        let posting_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        let storage_bytes: i64 = conn.query_row(
            "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            item_count: item_count as u64,
            posting_count: posting_count as u64,
            storage_bytes: storage_bytes as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> ContentMetadata {
        ContentMetadata::new(id, "Title", "test-suite", 1_700_000_000)
    }

    fn fp(hashes: Vec<u32>) -> Fingerprint {
        Fingerprint::new(hashes, 3000)
    }

    #[test]
    fn test_put_and_get_item() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.put_item("a", &fp(vec![1, 2, 3]), &meta("a")).unwrap();
        assert_eq!(outcome, PutOutcome::Inserted);

        let item = store.get_item("a").unwrap().unwrap();
        assert_eq!(item.content_id, "a");
        assert_eq!(item.duration_ms, 3000);

        assert!(store.get_item("missing").unwrap().is_none());
        assert_eq!(store.fingerprint_len("a").unwrap(), Some(3));
    }

    #[test]
    fn test_put_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put_item("a", &fp(vec![1, 2, 3]), &meta("a")).unwrap();
        let first = store.stats().unwrap();

        let outcome = store
            .put_item("a", &fp(vec![9, 9, 9, 9]), &meta("a"))
            .unwrap();
        assert_eq!(outcome, PutOutcome::AlreadyExists);

        let second = store.stats().unwrap();
        assert_eq!(first.item_count, second.item_count);
        assert_eq!(first.posting_count, second.posting_count);
        // The original fingerprint is untouched
        assert_eq!(store.fingerprint_len("a").unwrap(), Some(3));
    }

    #[test]
    fn test_postings_ordered_by_match_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .put_item("once", &fp(vec![7, 100]), &meta("once"))
            .unwrap();
        store
            .put_item("thrice", &fp(vec![7, 7, 7, 101]), &meta("thrice"))
            .unwrap();

        let postings = store.postings_for(7, 10).unwrap();
        assert_eq!(
            postings,
            vec![("thrice".to_string(), 3), ("once".to_string(), 1)]
        );

        // Advisory limit caps the rows returned
        let limited = store.postings_for(7, 1).unwrap();
        assert_eq!(limited, vec![("thrice".to_string(), 3)]);

        assert!(store.postings_for(424242, 10).unwrap().is_empty());
    }

    #[test]
    fn test_stats_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.posting_count, 0);

        store
            .put_item("a", &fp(vec![1, 2, 3, 4]), &meta("a"))
            .unwrap();
        store.put_item("b", &fp(vec![5, 6]), &meta("b")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.item_count, 2);
        assert_eq!(stats.posting_count, 6);
        assert!(stats.storage_bytes > 0);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let store = SqliteStore::open(&path).unwrap();
        store.put_item("a", &fp(vec![1, 2]), &meta("a")).unwrap();
        drop(store);

        // Re-open and observe the persisted rows
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.stats().unwrap().item_count, 1);
        assert_eq!(store.fingerprint_len("a").unwrap(), Some(2));
    }
}
