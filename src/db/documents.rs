use rusqlite::params;

use super::{Database, expect_changed, optional};
use crate::error::Result;
use crate::models::ApplicationDocument;

const DOCUMENT_COLUMNS: &str = "id, application_id, label, file_path, created_at, updated_at";

impl Database {
    pub fn insert_document(&self, document: &ApplicationDocument) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO application_documents ({DOCUMENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                document.id,
                document.application_id,
                document.label,
                document.file_path,
                document.created_at,
                document.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_document(&self, id: &str) -> Result<Option<ApplicationDocument>> {
        optional(self.conn.query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM application_documents WHERE id = ?1"),
            [id],
            Self::row_to_document,
        ))
    }

    pub fn delete_document(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM application_documents WHERE id = ?1", [id])?;
        expect_changed(changed, "Document")
    }

    /// Documents of one application, newest first.
    pub fn list_documents(&self, application_id: &str) -> Result<Vec<ApplicationDocument>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM application_documents
             WHERE application_id = ?1
             ORDER BY created_at DESC, id"
        ))?;
        let rows = stmt.query_map([application_id], Self::row_to_document)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<ApplicationDocument> {
        Ok(ApplicationDocument {
            id: row.get(0)?,
            application_id: row.get(1)?,
            label: row.get(2)?,
            file_path: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
