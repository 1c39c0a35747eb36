use rusqlite::params;

use super::{Database, expect_changed, optional};
use crate::error::Result;
use crate::models::TimelineEvent;

const EVENT_COLUMNS: &str =
    "id, application_id, type, title, description, event_date, is_completed, created_at, updated_at";

impl Database {
    /// Inserts an event. A row with the same id (system-derived ids are
    /// deterministic) is refreshed in place, keeping its `created_at`.
    pub fn save_timeline_event(&self, event: &TimelineEvent) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO timeline_events ({EVENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    type = excluded.type,
                    title = excluded.title,
                    description = excluded.description,
                    event_date = excluded.event_date,
                    is_completed = excluded.is_completed,
                    updated_at = excluded.updated_at"
            ),
            params![
                event.id,
                event.application_id,
                event.event_type,
                event.title,
                event.description,
                event.event_date,
                event.is_completed,
                event.created_at,
                event.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_timeline_event(&self, id: &str) -> Result<Option<TimelineEvent>> {
        optional(self.conn.query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM timeline_events WHERE id = ?1"),
            [id],
            Self::row_to_event,
        ))
    }

    pub fn delete_timeline_event(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM timeline_events WHERE id = ?1", [id])?;
        expect_changed(changed, "Timeline event")
    }

    /// Stored events of one application, latest `event_date` first.
    pub fn list_timeline_events(&self, application_id: &str) -> Result<Vec<TimelineEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM timeline_events
             WHERE application_id = ?1
             ORDER BY event_date DESC, id"
        ))?;
        let rows = stmt.query_map([application_id], Self::row_to_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<TimelineEvent> {
        Ok(TimelineEvent {
            id: row.get(0)?,
            application_id: row.get(1)?,
            event_type: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            event_date: row.get(5)?,
            is_completed: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
