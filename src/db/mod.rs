mod applications;
mod contacts;
mod documents;
mod timeline;

use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackerError};

/// SQLite-backed record store for applications and their child rows.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn, path: None };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                position TEXT NOT NULL,
                pay TEXT,
                status TEXT NOT NULL DEFAULT 'NOT_APPLIED' CHECK (status IN (
                    'NOT_APPLIED', 'APPLIED', 'INITIAL_CALL', 'FIRST_INTERVIEW',
                    'SECOND_INTERVIEW', 'THIRD_INTERVIEW', 'NEGOTIATIONS',
                    'NOT_ACCEPTED', 'LOST'
                )),
                applied_date TEXT,
                initial_call_date TEXT,
                initial_call_completed INTEGER NOT NULL DEFAULT 0,
                initial_call_notes TEXT,
                first_interview_date TEXT,
                first_interview_completed INTEGER NOT NULL DEFAULT 0,
                first_interview_notes TEXT,
                second_interview_date TEXT,
                second_interview_completed INTEGER NOT NULL DEFAULT 0,
                second_interview_notes TEXT,
                third_interview_date TEXT,
                third_interview_completed INTEGER NOT NULL DEFAULT 0,
                third_interview_notes TEXT,
                negotiations_date TEXT,
                negotiations_completed INTEGER NOT NULL DEFAULT 0,
                negotiations_notes TEXT,
                notes TEXT,
                resume_file TEXT,
                cover_letter_file TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                position TEXT,
                department TEXT,
                notes TEXT,
                is_primary INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS timeline_events (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                event_date TEXT NOT NULL,
                is_completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS application_documents (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                label TEXT,
                file_path TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applications_created ON applications(created_at);
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            CREATE INDEX IF NOT EXISTS idx_contacts_application ON contacts(application_id);
            CREATE INDEX IF NOT EXISTS idx_events_application ON timeline_events(application_id);
            CREATE INDEX IF NOT EXISTS idx_documents_application ON application_documents(application_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='applications'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(TrackerError::validation(
                "Database not initialized. Run 'applytrack init' first.",
            ));
        }
        Ok(())
    }

    /// Starts a transaction on the shared connection. Every statement issued
    /// through `self` until commit belongs to it; dropping it rolls back.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

/// Maps "no row changed" to `NotFound`.
fn expect_changed(changed: usize, entity: &'static str) -> Result<()> {
    if changed == 0 {
        Err(TrackerError::not_found(entity))
    } else {
        Ok(())
    }
}

/// Turns `QueryReturnedNoRows` into `Ok(None)`.
fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
