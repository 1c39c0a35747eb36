//! Partial updates for applications.
//!
//! Each field of [`ApplicationPatch`] is a [`Patch`]: a key missing from the
//! request body leaves the column alone, an explicit `null` (or an empty
//! string) clears it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::dates;
use crate::models::{Application, ApplicationStatus, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Patch::Absent)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the key is present; `#[serde(default)]` covers absence.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl Patch<String> {
    /// `Some(new_value)` when the field changes, `None` when absent.
    /// Empty strings count as a clear.
    fn text_change(&self) -> Option<Option<String>> {
        match self {
            Patch::Absent => None,
            Patch::Clear => Some(None),
            Patch::Set(value) if value.trim().is_empty() => Some(None),
            Patch::Set(value) => Some(Some(value.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationPatch {
    pub company: Patch<String>,
    pub position: Patch<String>,
    pub pay: Patch<String>,
    pub status: Patch<String>,
    pub applied_date: Patch<String>,
    pub initial_call_date: Patch<String>,
    pub initial_call_completed: Patch<bool>,
    pub initial_call_notes: Patch<String>,
    pub first_interview_date: Patch<String>,
    pub first_interview_completed: Patch<bool>,
    pub first_interview_notes: Patch<String>,
    pub second_interview_date: Patch<String>,
    pub second_interview_completed: Patch<bool>,
    pub second_interview_notes: Patch<String>,
    pub third_interview_date: Patch<String>,
    pub third_interview_completed: Patch<bool>,
    pub third_interview_notes: Patch<String>,
    pub negotiations_date: Patch<String>,
    pub negotiations_completed: Patch<bool>,
    pub negotiations_notes: Patch<String>,
    pub notes: Patch<String>,
    pub resume_file: Patch<String>,
    pub cover_letter_file: Patch<String>,
}

impl ApplicationPatch {
    pub fn date(&self, stage: Stage) -> &Patch<String> {
        match stage {
            Stage::Applied => &self.applied_date,
            Stage::InitialCall => &self.initial_call_date,
            Stage::FirstInterview => &self.first_interview_date,
            Stage::SecondInterview => &self.second_interview_date,
            Stage::ThirdInterview => &self.third_interview_date,
            Stage::Negotiations => &self.negotiations_date,
        }
    }

    pub fn completed(&self, stage: Stage) -> Option<&Patch<bool>> {
        match stage {
            Stage::Applied => None,
            Stage::InitialCall => Some(&self.initial_call_completed),
            Stage::FirstInterview => Some(&self.first_interview_completed),
            Stage::SecondInterview => Some(&self.second_interview_completed),
            Stage::ThirdInterview => Some(&self.third_interview_completed),
            Stage::Negotiations => Some(&self.negotiations_completed),
        }
    }

    pub fn stage_notes(&self, stage: Stage) -> Option<&Patch<String>> {
        match stage {
            Stage::Applied => None,
            Stage::InitialCall => Some(&self.initial_call_notes),
            Stage::FirstInterview => Some(&self.first_interview_notes),
            Stage::SecondInterview => Some(&self.second_interview_notes),
            Stage::ThirdInterview => Some(&self.third_interview_notes),
            Stage::Negotiations => Some(&self.negotiations_notes),
        }
    }

    /// Non-empty stage notes carried by this request, if any.
    pub fn supplied_notes(&self, stage: Stage) -> Option<&str> {
        self.stage_notes(stage)
            .and_then(Patch::as_set)
            .map(|notes| notes.trim())
            .filter(|notes| !notes.is_empty())
    }

    /// True when the request sets or clears the stage's date or flag.
    pub fn touches_stage(&self, stage: Stage) -> bool {
        self.date(stage).is_present()
            || self.completed(stage).is_some_and(Patch::is_present)
    }

    /// Merges the patch over `current` and stamps `updated_at`. Required
    /// fields are not checked here.
    pub fn apply_to(&self, current: &Application, now: DateTime<Utc>) -> Application {
        let mut next = current.clone();

        if let Some(company) = self.company.text_change() {
            next.company = company.map(|c| c.trim().to_string()).unwrap_or_default();
        }
        if let Some(position) = self.position.text_change() {
            next.position = position.map(|p| p.trim().to_string()).unwrap_or_default();
        }
        if let Some(pay) = self.pay.text_change() {
            next.pay = pay;
        }
        match &self.status {
            Patch::Absent => {}
            Patch::Clear => next.status = ApplicationStatus::NotApplied,
            Patch::Set(raw) => next.status = ApplicationStatus::parse_lossy(raw),
        }

        for stage in Stage::ALL {
            match self.date(stage) {
                Patch::Absent => {}
                Patch::Clear => next.set_stage_date(stage, None),
                Patch::Set(raw) => next.set_stage_date(stage, dates::parse_date_only(raw)),
            }
            match self.completed(stage) {
                None | Some(Patch::Absent) => {}
                Some(Patch::Clear) => next.set_stage_completed(stage, false),
                Some(Patch::Set(flag)) => next.set_stage_completed(stage, *flag),
            }
            if let Some(notes) = self.stage_notes(stage).and_then(Patch::text_change) {
                next.set_stage_notes(stage, notes);
            }
        }

        if let Some(notes) = self.notes.text_change() {
            next.notes = notes;
        }
        if let Some(resume) = self.resume_file.text_change() {
            next.resume_file = resume;
        }
        if let Some(cover_letter) = self.cover_letter_file.text_change() {
            next.cover_letter_file = cover_letter;
        }

        next.updated_at = now;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Application {
        let mut app =
            Application::new("app-1".into(), "Acme".into(), "Engineer".into(), Utc::now());
        app.pay = Some("$150k".into());
        app.notes = Some("referral".into());
        app
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let patch: ApplicationPatch =
            serde_json::from_str(r#"{"pay": null, "notes": "updated"}"#).unwrap();
        assert_eq!(patch.pay, Patch::Clear);
        assert_eq!(patch.notes, Patch::Set("updated".into()));
        assert_eq!(patch.company, Patch::Absent);

        let next = patch.apply_to(&sample(), Utc::now());
        assert_eq!(next.pay, None);
        assert_eq!(next.notes.as_deref(), Some("updated"));
        assert_eq!(next.company, "Acme");
    }

    #[test]
    fn empty_strings_clear_fields() {
        let patch: ApplicationPatch = serde_json::from_str(r#"{"pay": ""}"#).unwrap();
        let next = patch.apply_to(&sample(), Utc::now());
        assert_eq!(next.pay, None);
        assert_eq!(next.notes.as_deref(), Some("referral"));
    }

    #[test]
    fn stage_fields_merge() {
        let patch: ApplicationPatch = serde_json::from_str(
            r#"{"firstInterviewDate": "2024-04-01", "firstInterviewCompleted": true, "firstInterviewNotes": "Went well"}"#,
        )
        .unwrap();
        assert!(patch.touches_stage(Stage::FirstInterview));
        assert!(!patch.touches_stage(Stage::SecondInterview));
        assert_eq!(patch.supplied_notes(Stage::FirstInterview), Some("Went well"));

        let next = patch.apply_to(&sample(), Utc::now());
        assert_eq!(
            next.first_interview_date.map(|d| dates::to_date_only_string(&d)),
            Some("2024-04-01".to_string())
        );
        assert!(next.first_interview_completed);
        assert_eq!(next.first_interview_notes.as_deref(), Some("Went well"));
    }

    #[test]
    fn status_patch_is_lossy() {
        let patch: ApplicationPatch = serde_json::from_str(r#"{"status": "SOMETHING"}"#).unwrap();
        let mut current = sample();
        current.status = ApplicationStatus::Applied;
        assert_eq!(
            patch.apply_to(&current, Utc::now()).status,
            ApplicationStatus::NotApplied
        );
    }
}
