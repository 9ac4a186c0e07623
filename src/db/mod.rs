//! SQLite-based storage for the investor network intelligence engines.
//!
//! The database lives at `~/.raisemap/raisemap.db`. Every engine runs
//! against one request-scoped `NetworkDb` handle; there is no shared
//! mutable state beyond the tables themselves. Raw inputs (investors,
//! connections, interactions, term sheets) are owned by the import layer;
//! the engines own the derived tables (graph, relationships, profiles,
//! runs, snapshots).

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

pub mod types;
pub use types::*;

pub mod companies;
pub mod connections;
pub mod graph;
pub mod interactions;
pub mod investors;
pub mod profiles;
pub mod relationships;
pub mod scenarios;
pub mod snapshots;
pub mod term_sheets;

pub struct NetworkDb {
    conn: Connection,
}

impl NetworkDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.raisemap/raisemap.db` and apply
    /// the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open the database in read-only mode, for callers that only query
    /// (graph navigation, snapshot history) while another handle owns
    /// writes.
    pub fn open_readonly_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.raisemap/raisemap.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".raisemap").join("raisemap.db"))
    }
}

// =============================================================================
// Shared test utilities
// =============================================================================

#[cfg(test)]
pub mod test_utils {
    use super::NetworkDb;

    /// Create a temporary database for testing.
    ///
    /// We leak the `TempDir` so the directory persists for the duration of
    /// the test; test temp dirs are cleaned up by the OS. FK enforcement is
    /// disabled so unit tests can insert rows without satisfying every
    /// foreign key constraint.
    pub fn test_db() -> NetworkDb {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test.db");
        std::mem::forget(dir);
        let db = NetworkDb::open_at(path).expect("Failed to open test database");
        db.conn_ref()
            .execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("disable FK for tests");
        db
    }
}
