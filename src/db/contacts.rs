use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{Database, expect_changed, optional};
use crate::error::Result;
use crate::models::Contact;

const CONTACT_COLUMNS: &str = "id, application_id, name, email, phone, position, department,
    notes, is_primary, created_at, updated_at";

impl Database {
    pub fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO contacts ({CONTACT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                contact.id,
                contact.application_id,
                contact.name,
                contact.email,
                contact.phone,
                contact.position,
                contact.department,
                contact.notes,
                contact.is_primary,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        optional(self.conn.query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
            [id],
            Self::row_to_contact,
        ))
    }

    pub fn update_contact(&self, contact: &Contact) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE contacts SET
                name = ?2, email = ?3, phone = ?4, position = ?5, department = ?6,
                notes = ?7, is_primary = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                contact.id,
                contact.name,
                contact.email,
                contact.phone,
                contact.position,
                contact.department,
                contact.notes,
                contact.is_primary,
                contact.updated_at,
            ],
        )?;
        expect_changed(changed, "Contact")
    }

    pub fn delete_contact(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM contacts WHERE id = ?1", [id])?;
        expect_changed(changed, "Contact")
    }

    /// Contacts of one application, newest first.
    pub fn list_contacts(&self, application_id: &str) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE application_id = ?1
             ORDER BY created_at DESC, id"
        ))?;
        let rows = stmt.query_map([application_id], Self::row_to_contact)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Clears `is_primary` on every contact of the application except `keep`.
    pub fn clear_primary_contacts(
        &self,
        application_id: &str,
        keep: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE contacts SET is_primary = 0, updated_at = ?3
             WHERE application_id = ?1 AND is_primary = 1 AND (?2 IS NULL OR id <> ?2)",
            params![application_id, keep, now],
        )?;
        Ok(changed)
    }

    fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
        Ok(Contact {
            id: row.get(0)?,
            application_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            position: row.get(5)?,
            department: row.get(6)?,
            notes: row.get(7)?,
            is_primary: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}
