use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::types::GraphError;

const SCHEMA_VERSION: u32 = 1;

/// File name of the snapshot database inside `.ripple/`.
pub const SNAPSHOT_DB: &str = "snapshots.db";

/// A persisted snapshot record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub repo_id: String,
    pub commit_id: String,
    pub generation: u64,
    /// Serialized snapshot body; the format belongs to the caller.
    pub payload: String,
}

/// SQLite-backed persistence of serialized snapshots keyed by `(repo, commit)`.
pub struct SnapshotDb {
    conn: Connection,
}

impl SnapshotDb {
    /// Open or create a snapshot database at the given path.
    pub fn open(path: &Path) -> Result<Self, GraphError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GraphError::Database(format!("{}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        Self::set_performance_pragmas(&conn)?;
        let db = SnapshotDb { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, GraphError> {
        let conn = Connection::open_in_memory()?;
        Self::set_performance_pragmas(&conn)?;
        let db = SnapshotDb { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn set_performance_pragmas(conn: &Connection) -> Result<(), GraphError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        Ok(())
    }

    fn initialize_schema(&self) -> Result<(), GraphError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS ripple_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshots (
                repo_id TEXT NOT NULL,
                commit_id TEXT NOT NULL,
                generation INTEGER NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (repo_id, commit_id)
            );
            CREATE INDEX IF NOT EXISTS idx_snapshots_repo ON snapshots(repo_id, created_at);
            ",
        )?;
        let version = self.schema_version()?;
        if version == 0 {
            self.conn.execute(
                "INSERT OR REPLACE INTO ripple_meta (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
        } else if version != SCHEMA_VERSION {
            // Snapshots are a cache; drop rather than migrate.
            tracing::warn!(from = version, to = SCHEMA_VERSION, "snapshot schema changed, clearing cache");
            self.conn.execute("DELETE FROM snapshots", [])?;
            self.conn.execute(
                "UPDATE ripple_meta SET value = ?1 WHERE key = 'schema_version'",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        Ok(())
    }

    /// Stored schema version, 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, GraphError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM ripple_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    pub fn save(&self, record: &StoredSnapshot) -> Result<(), GraphError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (repo_id, commit_id, generation, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.repo_id,
                record.commit_id,
                record.generation as i64,
                record.payload
            ],
        )?;
        Ok(())
    }

    pub fn load(&self, repo_id: &str, commit_id: &str) -> Result<Option<StoredSnapshot>, GraphError> {
        let row = self
            .conn
            .query_row(
                "SELECT generation, payload FROM snapshots WHERE repo_id = ?1 AND commit_id = ?2",
                params![repo_id, commit_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(row.map(|(generation, payload)| StoredSnapshot {
            repo_id: repo_id.to_string(),
            commit_id: commit_id.to_string(),
            generation: generation as u64,
            payload,
        }))
    }

    pub fn delete(&self, repo_id: &str, commit_id: &str) -> Result<bool, GraphError> {
        let n = self.conn.execute(
            "DELETE FROM snapshots WHERE repo_id = ?1 AND commit_id = ?2",
            params![repo_id, commit_id],
        )?;
        Ok(n > 0)
    }

    /// Keep only the `keep` most recent snapshots of a repository.
    pub fn prune(&self, repo_id: &str, keep: usize) -> Result<usize, GraphError> {
        let n = self.conn.execute(
            "DELETE FROM snapshots WHERE repo_id = ?1 AND commit_id NOT IN (
                SELECT commit_id FROM snapshots WHERE repo_id = ?1
                ORDER BY created_at DESC, rowid DESC LIMIT ?2
            )",
            params![repo_id, keep as i64],
        )?;
        Ok(n)
    }

    pub fn count(&self) -> Result<usize, GraphError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
