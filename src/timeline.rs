//! Application timelines.
//!
//! A timeline is the merge of two producers: rows stored in `timeline_events`
//! and milestones synthesized from the application's own stage fields. A
//! synthesized milestone carries the id from [`Stage::system_event_id`]; when a
//! stored row already has that id the synthesized copy is dropped, so
//! projecting the same snapshot any number of times gives the same list.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::dates;
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{Application, Milestone, Stage, TimelineEvent};

/// Something that yields timeline events for one application.
pub trait EventSource {
    fn events(&self) -> Vec<TimelineEvent>;
}

/// Events already persisted for the application.
pub struct StoredEventSource<'a> {
    events: &'a [TimelineEvent],
}

impl<'a> StoredEventSource<'a> {
    pub fn new(events: &'a [TimelineEvent]) -> Self {
        Self { events }
    }
}

impl EventSource for StoredEventSource<'_> {
    fn events(&self) -> Vec<TimelineEvent> {
        self.events.to_vec()
    }
}

/// Milestones implied by the stage dates and completion flags.
pub struct SynthesizedEventSource<'a> {
    application: &'a Application,
}

impl<'a> SynthesizedEventSource<'a> {
    pub fn new(application: &'a Application) -> Self {
        Self { application }
    }

    fn milestone(
        &self,
        stage: Stage,
        milestone: Milestone,
        date: DateTime<Utc>,
        is_completed: bool,
    ) -> TimelineEvent {
        let app = self.application;
        TimelineEvent {
            id: stage.system_event_id(&app.id, milestone),
            application_id: app.id.clone(),
            event_type: stage.event_type(milestone),
            title: stage.event_title(milestone),
            description: None,
            event_date: date,
            is_completed,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

impl EventSource for SynthesizedEventSource<'_> {
    fn events(&self) -> Vec<TimelineEvent> {
        let app = self.application;
        let mut events = Vec::new();
        for stage in Stage::ALL {
            // A completion flag without a date has nothing to place on the timeline.
            let Some(date) = app.stage_date(stage) else {
                continue;
            };
            if !stage.is_tracked() {
                events.push(self.milestone(stage, Milestone::Completed, date, true));
                continue;
            }
            let completed = app.stage_completed(stage);
            events.push(self.milestone(stage, Milestone::Scheduled, date, completed));
            if completed {
                events.push(self.milestone(stage, Milestone::Completed, date, true));
            }
        }
        events
    }
}

/// Merges stored and synthesized events into one list, latest first.
pub struct TimelineProjector<S, D> {
    stored: S,
    synthesized: D,
}

impl<S: EventSource, D: EventSource> TimelineProjector<S, D> {
    pub fn new(stored: S, synthesized: D) -> Self {
        Self {
            stored,
            synthesized,
        }
    }

    pub fn project(&self) -> Vec<TimelineEvent> {
        let mut merged = self.stored.events();
        let stored_ids: HashSet<String> = merged.iter().map(|e| e.id.clone()).collect();

        merged.extend(
            self.synthesized
                .events()
                .into_iter()
                .filter(|event| !stored_ids.contains(&event.id)),
        );

        merged.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        merged
    }
}

pub fn project_timeline(application: &Application, stored: &[TimelineEvent]) -> Vec<TimelineEvent> {
    TimelineProjector::new(
        StoredEventSource::new(stored),
        SynthesizedEventSource::new(application),
    )
    .project()
}

/// Body of `POST /timeline-events`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineEventInput {
    pub application_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub is_completed: Option<bool>,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Stores a user-entered event. `eventDate` defaults to `now`.
pub fn record_event(
    db: &Database,
    input: TimelineEventInput,
    now: DateTime<Utc>,
) -> Result<TimelineEvent> {
    let (Some(application_id), Some(event_type), Some(title)) = (
        required(&input.application_id),
        required(&input.event_type),
        required(&input.title),
    ) else {
        return Err(TrackerError::validation(
            "Application ID, type, and title are required",
        ));
    };

    db.require_application(application_id)?;

    let event = TimelineEvent {
        id: Uuid::new_v4().to_string(),
        application_id: application_id.to_string(),
        event_type: event_type.to_string(),
        title: title.to_string(),
        description: input.description.filter(|d| !d.trim().is_empty()),
        event_date: input
            .event_date
            .as_deref()
            .and_then(dates::parse_instant)
            .unwrap_or(now),
        is_completed: input.is_completed.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };
    db.save_timeline_event(&event)?;
    tracing::info!(
        application_id = %event.application_id,
        event_type = %event.event_type,
        "timeline event recorded"
    );
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_only;

    fn application() -> Application {
        let mut app =
            Application::new("app-1".into(), "Acme".into(), "Engineer".into(), Utc::now());
        app.applied_date = parse_date_only("2024-03-01");
        app.initial_call_date = parse_date_only("2024-03-10");
        app.initial_call_completed = true;
        app.first_interview_date = parse_date_only("2024-04-01");
        app
    }

    fn ids(events: &[TimelineEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn synthesizes_milestones_from_stage_fields() {
        let events = project_timeline(&application(), &[]);
        assert_eq!(
            ids(&events),
            [
                "app-1-system-first-interview-scheduled",
                "app-1-system-initial-call-completed",
                "app-1-system-initial-call-scheduled",
                "app-1-system-applied-completed",
            ]
        );
        assert_eq!(events[0].event_type, "FIRST_INTERVIEW_SCHEDULED");
        assert!(!events[0].is_completed);
        assert_eq!(events[3].event_type, "APPLICATION_SUBMITTED");
        // Scheduled carries the stage's current flag.
        assert!(events[2].is_completed);
    }

    #[test]
    fn projection_is_idempotent() {
        let app = application();
        let first = project_timeline(&app, &[]);
        let second = project_timeline(&app, &first);
        assert_eq!(first, second);

        let unique: HashSet<_> = second.iter().map(|e| &e.id).collect();
        assert_eq!(unique.len(), second.len());
    }

    #[test]
    fn stored_row_suppresses_synthesized_duplicate() {
        let app = application();
        let stored = TimelineEvent {
            id: Stage::FirstInterview.system_event_id(&app.id, Milestone::Scheduled),
            application_id: app.id.clone(),
            event_type: "FIRST_INTERVIEW_SCHEDULED".into(),
            title: "First Interview Scheduled".into(),
            description: Some("First Interview has been scheduled".into()),
            event_date: app.first_interview_date.unwrap(),
            is_completed: false,
            created_at: app.created_at,
            updated_at: app.updated_at,
        };
        let events = project_timeline(&app, std::slice::from_ref(&stored));
        let matching: Vec<_> = events.iter().filter(|e| e.id == stored.id).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].description, stored.description);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn completion_without_date_is_skipped() {
        let mut app =
            Application::new("app-2".into(), "Acme".into(), "Engineer".into(), Utc::now());
        app.second_interview_completed = true;
        assert!(project_timeline(&app, &[]).is_empty());
    }

    #[test]
    fn record_event_validates_and_defaults_date() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_application(&Application::new("app-1".into(), "Acme".into(), "Eng".into(), now))
            .unwrap();

        let missing = record_event(&db, TimelineEventInput::default(), now);
        assert!(matches!(missing, Err(TrackerError::Validation(_))));

        let orphan = record_event(
            &db,
            TimelineEventInput {
                application_id: Some("ghost".into()),
                event_type: Some("FOLLOW_UP_SENT".into()),
                title: Some("Follow-up".into()),
                ..Default::default()
            },
            now,
        );
        assert!(matches!(orphan, Err(TrackerError::NotFound { .. })));

        let event = record_event(
            &db,
            TimelineEventInput {
                application_id: Some("app-1".into()),
                event_type: Some("FOLLOW_UP_SENT".into()),
                title: Some("Follow-up sent".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(event.event_date, now);
        assert!(!event.is_completed);
        assert_eq!(db.list_timeline_events("app-1").unwrap(), vec![event]);
    }
}
