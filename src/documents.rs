//! Resume, cover letter and additional-document lifecycle.
//!
//! Files are written before the row that references them and removed after
//! it stops referencing them. Neither step is transactional with the database:
//! a crash in between can leave an orphaned file on disk.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{Application, ApplicationDocument, DocumentRole};
use crate::patch::ApplicationPatch;
use crate::sync;
use crate::uploads::{FileStore, validate_extension};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Operation requested through the `action` field of a multipart update.
#[derive(Debug, Clone)]
pub enum DocumentAction {
    Upload {
        role: DocumentRole,
        file: UploadedFile,
        label: Option<String>,
    },
    Remove(DocumentRole),
    DeleteDocument {
        document_id: String,
    },
}

impl DocumentAction {
    pub fn parse(
        action: &str,
        file: Option<UploadedFile>,
        label: Option<String>,
        document_id: Option<String>,
    ) -> Result<Self> {
        let upload = |role: DocumentRole, file: Option<UploadedFile>| {
            file.map(|file| DocumentAction::Upload {
                role,
                file,
                label: label.clone(),
            })
            .ok_or_else(|| {
                TrackerError::validation(format!("A {} file is required", role.label()))
            })
        };

        match action {
            "uploadResume" => upload(DocumentRole::Resume, file),
            "uploadCoverLetter" => upload(DocumentRole::CoverLetter, file),
            "uploadAdditional" => upload(DocumentRole::Document, file),
            "removeResume" => Ok(DocumentAction::Remove(DocumentRole::Resume)),
            "removeCoverLetter" => Ok(DocumentAction::Remove(DocumentRole::CoverLetter)),
            "deleteDocument" => document_id
                .filter(|id| !id.trim().is_empty())
                .map(|document_id| DocumentAction::DeleteDocument { document_id })
                .ok_or_else(|| TrackerError::validation("Document ID is required")),
            other => Err(TrackerError::validation(format!("Unsupported action: {other}"))),
        }
    }
}

fn current_slot(db: &Database, application_id: &str, role: DocumentRole) -> Result<Option<String>> {
    let app = db.require_application(application_id)?;
    Ok(match role {
        DocumentRole::Resume => app.resume_file,
        DocumentRole::CoverLetter => app.cover_letter_file,
        DocumentRole::Document => None,
    })
}

/// Stores an upload for the application and returns its reference.
///
/// Resume and cover letter replace the previous file in their slot; the old
/// file is deleted once the row points at the new one. Other roles add an
/// `ApplicationDocument`.
pub fn upload_document(
    db: &Database,
    files: &FileStore,
    application_id: &str,
    role: DocumentRole,
    file: &UploadedFile,
    label: Option<String>,
    now: DateTime<Utc>,
) -> Result<String> {
    let previous = current_slot(db, application_id, role)?;
    let reference = files.save(application_id, role, &file.file_name, &file.bytes)?;

    match role {
        DocumentRole::Resume | DocumentRole::CoverLetter => {
            db.set_application_file(application_id, role, Some(&reference))?;
            if let Some(old) = previous {
                files.delete(&old)?;
            }
        }
        DocumentRole::Document => {
            db.insert_document(&ApplicationDocument {
                id: Uuid::new_v4().to_string(),
                application_id: application_id.to_string(),
                label: label.filter(|l| !l.trim().is_empty()),
                file_path: reference.clone(),
                created_at: now,
                updated_at: now,
            })?;
        }
    }
    Ok(reference)
}

/// Empties the resume or cover-letter slot and deletes the file behind it.
pub fn remove_attachment(
    db: &Database,
    files: &FileStore,
    application_id: &str,
    role: DocumentRole,
) -> Result<()> {
    let previous = current_slot(db, application_id, role)?;
    db.set_application_file(application_id, role, None)?;
    if let Some(old) = previous {
        files.delete(&old)?;
    }
    Ok(())
}

/// Deletes an additional document row and its file.
pub fn delete_document(
    db: &Database,
    files: &FileStore,
    application_id: &str,
    document_id: &str,
) -> Result<()> {
    let document = db
        .get_document(document_id)?
        .filter(|doc| doc.application_id == application_id)
        .ok_or_else(|| TrackerError::not_found("Document"))?;
    db.delete_document(&document.id)?;
    files.delete(&document.file_path)
}

pub fn apply_document_action(
    db: &Database,
    files: &FileStore,
    application_id: &str,
    action: &DocumentAction,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        DocumentAction::Upload { role, file, label } => {
            upload_document(db, files, application_id, *role, file, label.clone(), now)?;
        }
        DocumentAction::Remove(role) => remove_attachment(db, files, application_id, *role)?,
        DocumentAction::DeleteDocument { document_id } => {
            delete_document(db, files, application_id, document_id)?
        }
    }
    tracing::info!(application_id, action = action_name(action), "document action applied");
    Ok(())
}

fn action_name(action: &DocumentAction) -> &'static str {
    match action {
        DocumentAction::Upload { role: DocumentRole::Resume, .. } => "uploadResume",
        DocumentAction::Upload { role: DocumentRole::CoverLetter, .. } => "uploadCoverLetter",
        DocumentAction::Upload { role: DocumentRole::Document, .. } => "uploadAdditional",
        DocumentAction::Remove(DocumentRole::Resume) => "removeResume",
        DocumentAction::Remove(_) => "removeCoverLetter",
        DocumentAction::DeleteDocument { .. } => "deleteDocument",
    }
}

/// Files sent along with a new application.
#[derive(Debug, Default)]
pub struct InitialUploads {
    pub resume: Option<UploadedFile>,
    pub cover_letter: Option<UploadedFile>,
    pub additional: Vec<(UploadedFile, Option<String>)>,
}

impl InitialUploads {
    fn all(&self) -> impl Iterator<Item = &UploadedFile> {
        self.resume
            .iter()
            .chain(self.cover_letter.iter())
            .chain(self.additional.iter().map(|(file, _)| file))
    }
}

/// Creates an application and stores its initial files. Every file's
/// extension is checked before the row is written.
pub fn create_application_with_uploads(
    db: &Database,
    files: &FileStore,
    patch: &ApplicationPatch,
    uploads: &InitialUploads,
    now: DateTime<Utc>,
) -> Result<Application> {
    for file in uploads.all() {
        validate_extension(&file.file_name)?;
    }

    let app = sync::create_application(db, patch, now)?;
    if let Some(file) = &uploads.resume {
        upload_document(db, files, &app.id, DocumentRole::Resume, file, None, now)?;
    }
    if let Some(file) = &uploads.cover_letter {
        upload_document(db, files, &app.id, DocumentRole::CoverLetter, file, None, now)?;
    }
    for (file, label) in &uploads.additional {
        upload_document(db, files, &app.id, DocumentRole::Document, file, label.clone(), now)?;
    }
    db.require_application(&app.id)
}

/// Deletes the application (children cascade) and then every file it
/// referenced. Files that are already gone are ignored.
pub fn delete_application(db: &Database, files: &FileStore, application_id: &str) -> Result<()> {
    let app = db.require_application(application_id)?;
    let mut references = app.attached_files();
    references.extend(
        db.list_documents(application_id)?
            .into_iter()
            .map(|doc| doc.file_path),
    );

    db.delete_application(application_id)?;
    for reference in &references {
        files.delete(reference)?;
    }
    files.remove_application_dir(application_id);

    tracing::info!(application_id, files = references.len(), "application deleted");
    Ok(())
}
