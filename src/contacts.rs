//! Contacts and the one-primary-per-application rule.
//!
//! Clearing the siblings' flag and writing the contact run in one transaction,
//! so two requests cannot both leave a primary behind.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::Contact;

/// Body of `POST /contacts` and `PUT /contacts/{id}`. Optional text left out
/// or empty is stored as null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactInput {
    pub application_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
    pub is_primary: Option<bool>,
}

fn text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_name(input: &ContactInput) -> Result<String> {
    input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TrackerError::validation("Name is required"))
}

pub fn create_contact(db: &Database, input: ContactInput, now: DateTime<Utc>) -> Result<Contact> {
    let application_id = input
        .application_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TrackerError::validation("Application ID and name are required"))?
        .to_string();
    let name = required_name(&input)
        .map_err(|_| TrackerError::validation("Application ID and name are required"))?;

    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        application_id,
        name,
        email: text(input.email),
        phone: text(input.phone),
        position: text(input.position),
        department: text(input.department),
        notes: text(input.notes),
        is_primary: input.is_primary.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };

    let tx = db.transaction()?;
    db.require_application(&contact.application_id)?;
    if contact.is_primary {
        db.clear_primary_contacts(&contact.application_id, None, now)?;
    }
    db.insert_contact(&contact)?;
    tx.commit()?;

    tracing::info!(
        application_id = %contact.application_id,
        contact_id = %contact.id,
        is_primary = contact.is_primary,
        "contact created"
    );
    Ok(contact)
}

/// Replaces a contact's fields. The owning application never changes.
pub fn update_contact(
    db: &Database,
    id: &str,
    input: ContactInput,
    now: DateTime<Utc>,
) -> Result<Contact> {
    let name = required_name(&input)?;

    let tx = db.transaction()?;
    let existing = db
        .get_contact(id)?
        .ok_or_else(|| TrackerError::not_found("Contact"))?;

    let contact = Contact {
        name,
        email: text(input.email),
        phone: text(input.phone),
        position: text(input.position),
        department: text(input.department),
        notes: text(input.notes),
        is_primary: input.is_primary.unwrap_or(false),
        updated_at: now,
        ..existing
    };

    if contact.is_primary {
        db.clear_primary_contacts(&contact.application_id, Some(&contact.id), now)?;
    }
    db.update_contact(&contact)?;
    tx.commit()?;
    Ok(contact)
}
