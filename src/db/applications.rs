use rusqlite::params;

use super::{Database, expect_changed, optional};
use crate::error::{Result, TrackerError};
use crate::models::{
    Application, ApplicationDetail, ApplicationStatus, ApplicationSummary, DocumentRole,
};
use crate::timeline;

const APPLICATION_COLUMNS: &str = "id, company, position, pay, status, applied_date,
    initial_call_date, initial_call_completed, initial_call_notes,
    first_interview_date, first_interview_completed, first_interview_notes,
    second_interview_date, second_interview_completed, second_interview_notes,
    third_interview_date, third_interview_completed, third_interview_notes,
    negotiations_date, negotiations_completed, negotiations_notes,
    notes, resume_file, cover_letter_file, created_at, updated_at";

impl Database {
    pub fn insert_application(&self, app: &Application) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO applications ({APPLICATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
            ),
            params![
                app.id,
                app.company,
                app.position,
                app.pay,
                app.status,
                app.applied_date,
                app.initial_call_date,
                app.initial_call_completed,
                app.initial_call_notes,
                app.first_interview_date,
                app.first_interview_completed,
                app.first_interview_notes,
                app.second_interview_date,
                app.second_interview_completed,
                app.second_interview_notes,
                app.third_interview_date,
                app.third_interview_completed,
                app.third_interview_notes,
                app.negotiations_date,
                app.negotiations_completed,
                app.negotiations_notes,
                app.notes,
                app.resume_file,
                app.cover_letter_file,
                app.created_at,
                app.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_application(&self, id: &str) -> Result<Option<Application>> {
        optional(self.conn.query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
            [id],
            Self::row_to_application,
        ))
    }

    pub fn require_application(&self, id: &str) -> Result<Application> {
        self.get_application(id)?
            .ok_or_else(|| TrackerError::not_found("Application"))
    }

    /// Writes every mutable column of `app`; `created_at` is left untouched.
    pub fn update_application(&self, app: &Application) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE applications SET
                company = ?2, position = ?3, pay = ?4, status = ?5, applied_date = ?6,
                initial_call_date = ?7, initial_call_completed = ?8, initial_call_notes = ?9,
                first_interview_date = ?10, first_interview_completed = ?11, first_interview_notes = ?12,
                second_interview_date = ?13, second_interview_completed = ?14, second_interview_notes = ?15,
                third_interview_date = ?16, third_interview_completed = ?17, third_interview_notes = ?18,
                negotiations_date = ?19, negotiations_completed = ?20, negotiations_notes = ?21,
                notes = ?22, resume_file = ?23, cover_letter_file = ?24, updated_at = ?25
             WHERE id = ?1",
            params![
                app.id,
                app.company,
                app.position,
                app.pay,
                app.status,
                app.applied_date,
                app.initial_call_date,
                app.initial_call_completed,
                app.initial_call_notes,
                app.first_interview_date,
                app.first_interview_completed,
                app.first_interview_notes,
                app.second_interview_date,
                app.second_interview_completed,
                app.second_interview_notes,
                app.third_interview_date,
                app.third_interview_completed,
                app.third_interview_notes,
                app.negotiations_date,
                app.negotiations_completed,
                app.negotiations_notes,
                app.notes,
                app.resume_file,
                app.cover_letter_file,
                app.updated_at,
            ],
        )?;
        expect_changed(changed, "Application")
    }

    /// Points the resume or cover-letter slot at a stored file (or clears it).
    pub fn set_application_file(
        &self,
        id: &str,
        role: DocumentRole,
        file: Option<&str>,
    ) -> Result<()> {
        let column = match role {
            DocumentRole::Resume => "resume_file",
            DocumentRole::CoverLetter => "cover_letter_file",
            DocumentRole::Document => {
                return Err(TrackerError::validation(
                    "Additional documents are not stored on the application row",
                ));
            }
        };
        let changed = self.conn.execute(
            &format!("UPDATE applications SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
            params![id, file, chrono::Utc::now()],
        )?;
        expect_changed(changed, "Application")
    }

    /// Deletes the row; contacts, events and document rows cascade.
    pub fn delete_application(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM applications WHERE id = ?1", [id])?;
        expect_changed(changed, "Application")
    }

    /// Newest first, optionally restricted to one status.
    pub fn list_applications(&self, status: Option<ApplicationStatus>) -> Result<Vec<Application>> {
        let mut sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications");
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY created_at DESC, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(s) = status {
            stmt.query_map([s], Self::row_to_application)?
        } else {
            stmt.query_map([], Self::row_to_application)?
        };

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_application_summaries(&self) -> Result<Vec<ApplicationSummary>> {
        self.list_applications(None)?
            .into_iter()
            .map(|application| -> Result<ApplicationSummary> {
                let documents = self.list_documents(&application.id)?;
                Ok(ApplicationSummary {
                    application,
                    documents,
                })
            })
            .collect()
    }

    /// Loads an application with all children and its projected timeline.
    pub fn get_application_detail(&self, id: &str) -> Result<Option<ApplicationDetail>> {
        let Some(application) = self.get_application(id)? else {
            return Ok(None);
        };
        let contacts = self.list_contacts(id)?;
        let timeline_events = self.list_timeline_events(id)?;
        let documents = self.list_documents(id)?;
        let timeline = timeline::project_timeline(&application, &timeline_events);
        Ok(Some(ApplicationDetail {
            application,
            contacts,
            timeline_events,
            documents,
            timeline,
        }))
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<Application> {
        Ok(Application {
            id: row.get(0)?,
            company: row.get(1)?,
            position: row.get(2)?,
            pay: row.get(3)?,
            status: row.get(4)?,
            applied_date: row.get(5)?,
            initial_call_date: row.get(6)?,
            initial_call_completed: row.get(7)?,
            initial_call_notes: row.get(8)?,
            first_interview_date: row.get(9)?,
            first_interview_completed: row.get(10)?,
            first_interview_notes: row.get(11)?,
            second_interview_date: row.get(12)?,
            second_interview_completed: row.get(13)?,
            second_interview_notes: row.get(14)?,
            third_interview_date: row.get(15)?,
            third_interview_completed: row.get(16)?,
            third_interview_notes: row.get(17)?,
            negotiations_date: row.get(18)?,
            negotiations_completed: row.get(19)?,
            negotiations_notes: row.get(20)?,
            notes: row.get(21)?,
            resume_file: row.get(22)?,
            cover_letter_file: row.get(23)?,
            created_at: row.get(24)?,
            updated_at: row.get(25)?,
        })
    }
}
