//! Application writes and the timeline events they imply.
//!
//! An update is read, merged, validated, written, and followed by the derived
//! timeline rows, all in one transaction. Derived stage rows reuse the
//! projector's deterministic ids, so stored and synthesized copies of the same
//! milestone never both appear.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{Application, ApplicationDetail, Milestone, Stage, TimelineEvent};
use crate::patch::ApplicationPatch;

pub const STATUS_CHANGED: &str = "STATUS_CHANGED";

/// Stage notes supplied in the current request, keyed by stage.
pub type StageNotes = BTreeMap<Stage, String>;

pub fn supplied_stage_notes(patch: &ApplicationPatch) -> StageNotes {
    Stage::TRACKED
        .into_iter()
        .filter_map(|stage| {
            patch
                .supplied_notes(stage)
                .map(|notes| (stage, notes.to_string()))
        })
        .collect()
}

/// Checks the merged state before it is written.
///
/// Company and position must be non-empty. A stage touched by this request may
/// not end up completed without a date.
pub fn validate_application(app: &Application, patch: &ApplicationPatch) -> Result<()> {
    if app.company.trim().is_empty() || app.position.trim().is_empty() {
        return Err(TrackerError::validation("Company and position are required"));
    }
    for stage in Stage::TRACKED {
        if patch.touches_stage(stage)
            && app.stage_completed(stage)
            && app.stage_date(stage).is_none()
        {
            return Err(TrackerError::validation(format!(
                "Cannot mark {} completed without a date",
                stage.label()
            )));
        }
    }
    Ok(())
}

fn stage_event(
    app: &Application,
    stage: Stage,
    milestone: Milestone,
    event_date: DateTime<Utc>,
    description: String,
    now: DateTime<Utc>,
) -> TimelineEvent {
    TimelineEvent {
        id: stage.system_event_id(&app.id, milestone),
        application_id: app.id.clone(),
        event_type: stage.event_type(milestone),
        title: stage.event_title(milestone),
        description: Some(description),
        event_date,
        is_completed: milestone == Milestone::Completed,
        created_at: now,
        updated_at: now,
    }
}

/// Timeline rows implied by moving from `old` to `new`.
///
/// - a stage date appearing yields `<STAGE>_SCHEDULED`
/// - a completion flag turning on yields `<STAGE>_COMPLETED` on the stage date
/// - a status change yields `STATUS_CHANGED` dated `now`
pub fn derive_timeline_events(
    old: &Application,
    new: &Application,
    notes: &StageNotes,
    now: DateTime<Utc>,
) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for stage in Stage::TRACKED {
        if let (None, Some(date)) = (old.stage_date(stage), new.stage_date(stage)) {
            events.push(stage_event(
                new,
                stage,
                Milestone::Scheduled,
                date,
                stage.event_description(Milestone::Scheduled),
                now,
            ));
        }
    }

    for stage in Stage::TRACKED {
        if old.stage_completed(stage) || !new.stage_completed(stage) {
            continue;
        }
        let Some(date) = new.stage_date(stage) else {
            tracing::warn!(
                application_id = %new.id,
                stage = stage.token(),
                "stage completed without a date; no completion event"
            );
            continue;
        };
        let description = match notes.get(&stage) {
            Some(text) => format!("{} completed with notes: {}", stage.label(), text),
            None => stage.event_description(Milestone::Completed),
        };
        events.push(stage_event(
            new,
            stage,
            Milestone::Completed,
            date,
            description,
            now,
        ));
    }

    if new.status != old.status {
        events.push(TimelineEvent {
            id: Uuid::new_v4().to_string(),
            application_id: new.id.clone(),
            event_type: STATUS_CHANGED.to_string(),
            title: "Status Changed".to_string(),
            description: Some(format!(
                "Application status changed from {} to {}",
                old.status.label(),
                new.status.label()
            )),
            event_date: now,
            is_completed: false,
            created_at: now,
            updated_at: now,
        });
    }

    events
}

/// Moves stored stage rows to the new date when a stage is rescheduled.
///
/// Only rows that already exist are touched; their descriptions are kept. The
/// completed row follows the date only while the stage stays completed.
fn reschedule_stored_events(
    db: &Database,
    old: &Application,
    new: &Application,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut moved = 0;
    for stage in Stage::TRACKED {
        let (Some(before), Some(after)) = (old.stage_date(stage), new.stage_date(stage)) else {
            continue;
        };
        if before == after {
            continue;
        }
        let mut milestones = vec![Milestone::Scheduled];
        if old.stage_completed(stage) && new.stage_completed(stage) {
            milestones.push(Milestone::Completed);
        }
        for milestone in milestones {
            let id = stage.system_event_id(&new.id, milestone);
            let Some(mut event) = db.get_timeline_event(&id)? else {
                continue;
            };
            event.event_date = after;
            event.updated_at = now;
            db.save_timeline_event(&event)?;
            moved += 1;
            tracing::debug!(
                application_id = %new.id,
                event_type = %event.event_type,
                "rescheduled timeline event"
            );
        }
    }
    Ok(moved)
}

/// Creates an application from a create payload. Status defaults to
/// `NOT_APPLIED`; no timeline rows are written.
pub fn create_application(
    db: &Database,
    patch: &ApplicationPatch,
    now: DateTime<Utc>,
) -> Result<Application> {
    let blank = Application::new(Uuid::new_v4().to_string(), String::new(), String::new(), now);
    let app = patch.apply_to(&blank, now);
    validate_application(&app, patch)?;
    db.insert_application(&app)?;
    tracing::info!(application_id = %app.id, company = %app.company, "application created");
    Ok(app)
}

/// Applies a partial update and records the timeline events it implies.
pub fn apply_application_update(
    db: &Database,
    id: &str,
    patch: &ApplicationPatch,
    now: DateTime<Utc>,
) -> Result<ApplicationDetail> {
    let tx = db.transaction()?;

    let old = db.require_application(id)?;
    let new = patch.apply_to(&old, now);
    validate_application(&new, patch)?;
    db.update_application(&new)?;

    let rescheduled = reschedule_stored_events(db, &old, &new, now)?;
    let events = derive_timeline_events(&old, &new, &supplied_stage_notes(patch), now);
    for event in &events {
        db.save_timeline_event(event)?;
        tracing::debug!(
            application_id = %id,
            event_type = %event.event_type,
            "derived timeline event"
        );
    }

    tx.commit()?;
    tracing::info!(
        application_id = %id,
        derived_events = events.len(),
        rescheduled,
        "application updated"
    );

    db.get_application_detail(id)?
        .ok_or_else(|| TrackerError::not_found("Application"))
}
