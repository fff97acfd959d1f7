// SQLite persistence behind the engine's storage seam.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::draft::room::DraftRoom;
use crate::league::League;

/// Storage failures surfaced through the engine.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode entity: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt stored value for {0}")]
    Corrupt(String),

    /// A compare-and-swap write lost against a concurrent committer. Inside
    /// the engine's per-league lock this is unreachable from a single
    /// process; it guards a second process sharing the database.
    #[error("stale draft room write: expected version {expected}")]
    VersionConflict { expected: u64 },

    /// An insert collided with an existing row. Creation paths must never
    /// overwrite, so a duplicate ID surfaces instead of clobbering.
    #[error("league ID already exists: {0}")]
    DuplicateId(String),
}

/// Snapshot-consistent reads plus atomic league+room commits.
///
/// The engine is stateless between calls: it reads entity snapshots, mutates
/// local copies inside its critical section, and writes them back through
/// this seam. `store_draft` must commit the league and room together so a
/// reader never observes a pick without its pointer advance.
pub trait Storage: Send + Sync {
    fn load_league(&self, league_id: &str) -> Result<Option<League>, StorageError>;

    /// Insert a newly created league. Fails with
    /// [`StorageError::DuplicateId`] when the ID is already taken; it must
    /// never replace an existing row.
    fn insert_league(&self, league: &League) -> Result<(), StorageError>;

    /// Write a league snapshot (pre-draft mutations: joins).
    fn store_league(&self, league: &League) -> Result<(), StorageError>;

    fn load_room(&self, league_id: &str) -> Result<Option<DraftRoom>, StorageError>;

    /// Atomically commit a league and room snapshot.
    ///
    /// `expected_version = None` creates the room (draft start); `Some(v)`
    /// updates it only if the stored version is still `v`, failing with
    /// [`StorageError::VersionConflict`] otherwise. The room's own `version`
    /// field must already hold the post-commit value.
    fn store_draft(
        &self,
        league: &League,
        room: &DraftRoom,
        expected_version: Option<u64>,
    ) -> Result<(), StorageError>;
}

/// SQLite-backed [`Storage`]. Entities are stored as JSON bodies keyed by
/// league ID, with the room version mirrored into a column for the CAS
/// predicate.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database (used by tests).
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_rooms (
                league_id TEXT PRIMARY KEY REFERENCES leagues(id),
                body      TEXT NOT NULL,
                version   INTEGER NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

impl Storage for Database {
    fn load_league(&self, league_id: &str) -> Result<Option<League>, StorageError> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM leagues WHERE id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|_| StorageError::Corrupt(format!("league {league_id}"))),
            None => Ok(None),
        }
    }

    fn insert_league(&self, league: &League) -> Result<(), StorageError> {
        let conn = self.conn();
        let body = serde_json::to_string(league)?;
        match conn.execute(
            "INSERT INTO leagues (id, body) VALUES (?1, ?2)",
            params![league.id, body],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateId(league.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn store_league(&self, league: &League) -> Result<(), StorageError> {
        let conn = self.conn();
        let body = serde_json::to_string(league)?;
        conn.execute(
            "INSERT OR REPLACE INTO leagues (id, body) VALUES (?1, ?2)",
            params![league.id, body],
        )?;
        Ok(())
    }

    fn load_room(&self, league_id: &str) -> Result<Option<DraftRoom>, StorageError> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM draft_rooms WHERE league_id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|_| StorageError::Corrupt(format!("draft room {league_id}"))),
            None => Ok(None),
        }
    }

    fn store_draft(
        &self,
        league: &League,
        room: &DraftRoom,
        expected_version: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn();
        let league_body = serde_json::to_string(league)?;
        let room_body = serde_json::to_string(room)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO leagues (id, body) VALUES (?1, ?2)",
            params![league.id, league_body],
        )?;

        match expected_version {
            None => {
                tx.execute(
                    "INSERT INTO draft_rooms (league_id, body, version) VALUES (?1, ?2, ?3)",
                    params![room.league_id, room_body, room.version as i64],
                )?;
            }
            Some(expected) => {
                let updated = tx.execute(
                    "UPDATE draft_rooms SET body = ?1, version = ?2
                     WHERE league_id = ?3 AND version = ?4",
                    params![
                        room_body,
                        room.version as i64,
                        room.league_id,
                        expected as i64
                    ],
                )?;
                if updated == 0 {
                    return Err(StorageError::VersionConflict { expected });
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}
