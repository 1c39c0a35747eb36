use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hiring-pipeline status of an application.
///
/// Serialized as the upper snake-case token (`FIRST_INTERVIEW`). Any token
/// outside the known set reads back as `NotApplied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationStatus {
    #[default]
    NotApplied,
    Applied,
    InitialCall,
    FirstInterview,
    SecondInterview,
    ThirdInterview,
    Negotiations,
    NotAccepted,
    Lost,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 9] = [
        ApplicationStatus::NotApplied,
        ApplicationStatus::Applied,
        ApplicationStatus::InitialCall,
        ApplicationStatus::FirstInterview,
        ApplicationStatus::SecondInterview,
        ApplicationStatus::ThirdInterview,
        ApplicationStatus::Negotiations,
        ApplicationStatus::NotAccepted,
        ApplicationStatus::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::NotApplied => "NOT_APPLIED",
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::InitialCall => "INITIAL_CALL",
            ApplicationStatus::FirstInterview => "FIRST_INTERVIEW",
            ApplicationStatus::SecondInterview => "SECOND_INTERVIEW",
            ApplicationStatus::ThirdInterview => "THIRD_INTERVIEW",
            ApplicationStatus::Negotiations => "NEGOTIATIONS",
            ApplicationStatus::NotAccepted => "NOT_ACCEPTED",
            ApplicationStatus::Lost => "LOST",
        }
    }

    /// Human-readable label used in timeline descriptions and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::NotApplied => "Not Applied",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::InitialCall => "Initial Call",
            ApplicationStatus::FirstInterview => "First Interview",
            ApplicationStatus::SecondInterview => "Second Interview",
            ApplicationStatus::ThirdInterview => "Third Interview",
            ApplicationStatus::Negotiations => "Negotiations",
            ApplicationStatus::NotAccepted => "Not Accepted",
            ApplicationStatus::Lost => "Lost",
        }
    }

    pub fn parse_lossy(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .unwrap_or_default()
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse_lossy).unwrap_or_default())
    }
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Self::parse_lossy)
    }
}

/// A step of the hiring pipeline that carries its own date on the application.
///
/// Every stage except `Applied` is tracked: it also has a completion flag and
/// free-text notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Applied,
    InitialCall,
    FirstInterview,
    SecondInterview,
    ThirdInterview,
    Negotiations,
}

/// Which moment of a stage a timeline entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Scheduled,
    Completed,
}

impl Milestone {
    pub fn as_str(self) -> &'static str {
        match self {
            Milestone::Scheduled => "scheduled",
            Milestone::Completed => "completed",
        }
    }
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Applied,
        Stage::InitialCall,
        Stage::FirstInterview,
        Stage::SecondInterview,
        Stage::ThirdInterview,
        Stage::Negotiations,
    ];

    pub const TRACKED: [Stage; 5] = [
        Stage::InitialCall,
        Stage::FirstInterview,
        Stage::SecondInterview,
        Stage::ThirdInterview,
        Stage::Negotiations,
    ];

    pub fn is_tracked(self) -> bool {
        self != Stage::Applied
    }

    /// Kebab-case name used inside system event ids.
    pub fn slug(self) -> &'static str {
        match self {
            Stage::Applied => "applied",
            Stage::InitialCall => "initial-call",
            Stage::FirstInterview => "first-interview",
            Stage::SecondInterview => "second-interview",
            Stage::ThirdInterview => "third-interview",
            Stage::Negotiations => "negotiations",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Stage::Applied => "APPLIED",
            Stage::InitialCall => "INITIAL_CALL",
            Stage::FirstInterview => "FIRST_INTERVIEW",
            Stage::SecondInterview => "SECOND_INTERVIEW",
            Stage::ThirdInterview => "THIRD_INTERVIEW",
            Stage::Negotiations => "NEGOTIATIONS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Applied => "Applied",
            Stage::InitialCall => "Initial Call",
            Stage::FirstInterview => "First Interview",
            Stage::SecondInterview => "Second Interview",
            Stage::ThirdInterview => "Third Interview",
            Stage::Negotiations => "Negotiations",
        }
    }

    pub fn event_type(self, milestone: Milestone) -> String {
        match self {
            Stage::Applied => "APPLICATION_SUBMITTED".to_string(),
            _ => format!("{}_{}", self.token(), milestone.as_str().to_uppercase()),
        }
    }

    pub fn event_title(self, milestone: Milestone) -> String {
        match (self, milestone) {
            (Stage::Applied, _) => "Application Submitted".to_string(),
            (Stage::Negotiations, Milestone::Scheduled) => "Negotiations Started".to_string(),
            (stage, Milestone::Scheduled) => format!("{} Scheduled", stage.label()),
            (stage, Milestone::Completed) => format!("{} Completed", stage.label()),
        }
    }

    pub fn event_description(self, milestone: Milestone) -> String {
        match (self, milestone) {
            (Stage::Applied, _) => "Application has been submitted".to_string(),
            (Stage::Negotiations, Milestone::Scheduled) => {
                "Salary negotiations have been scheduled".to_string()
            }
            (Stage::Negotiations, Milestone::Completed) => {
                "Salary negotiations have been completed".to_string()
            }
            (stage, Milestone::Scheduled) => format!("{} has been scheduled", stage.label()),
            (stage, Milestone::Completed) => format!("{} has been completed", stage.label()),
        }
    }

    /// Id shared by the write path and the read-time projector for a stage
    /// milestone, so the same milestone is never listed twice.
    pub fn system_event_id(self, application_id: &str, milestone: Milestone) -> String {
        format!(
            "{}-system-{}-{}",
            application_id,
            self.slug(),
            milestone.as_str()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub company: String,
    pub position: String,
    pub pay: Option<String>,
    pub status: ApplicationStatus,
    pub applied_date: Option<DateTime<Utc>>,
    pub initial_call_date: Option<DateTime<Utc>>,
    pub initial_call_completed: bool,
    pub initial_call_notes: Option<String>,
    pub first_interview_date: Option<DateTime<Utc>>,
    pub first_interview_completed: bool,
    pub first_interview_notes: Option<String>,
    pub second_interview_date: Option<DateTime<Utc>>,
    pub second_interview_completed: bool,
    pub second_interview_notes: Option<String>,
    pub third_interview_date: Option<DateTime<Utc>>,
    pub third_interview_completed: bool,
    pub third_interview_notes: Option<String>,
    pub negotiations_date: Option<DateTime<Utc>>,
    pub negotiations_completed: bool,
    pub negotiations_notes: Option<String>,
    pub notes: Option<String>,
    pub resume_file: Option<String>,
    pub cover_letter_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(id: String, company: String, position: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            company,
            position,
            pay: None,
            status: ApplicationStatus::NotApplied,
            applied_date: None,
            initial_call_date: None,
            initial_call_completed: false,
            initial_call_notes: None,
            first_interview_date: None,
            first_interview_completed: false,
            first_interview_notes: None,
            second_interview_date: None,
            second_interview_completed: false,
            second_interview_notes: None,
            third_interview_date: None,
            third_interview_completed: false,
            third_interview_notes: None,
            negotiations_date: None,
            negotiations_completed: false,
            negotiations_notes: None,
            notes: None,
            resume_file: None,
            cover_letter_file: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stage_date(&self, stage: Stage) -> Option<DateTime<Utc>> {
        match stage {
            Stage::Applied => self.applied_date,
            Stage::InitialCall => self.initial_call_date,
            Stage::FirstInterview => self.first_interview_date,
            Stage::SecondInterview => self.second_interview_date,
            Stage::ThirdInterview => self.third_interview_date,
            Stage::Negotiations => self.negotiations_date,
        }
    }

    pub fn set_stage_date(&mut self, stage: Stage, date: Option<DateTime<Utc>>) {
        match stage {
            Stage::Applied => self.applied_date = date,
            Stage::InitialCall => self.initial_call_date = date,
            Stage::FirstInterview => self.first_interview_date = date,
            Stage::SecondInterview => self.second_interview_date = date,
            Stage::ThirdInterview => self.third_interview_date = date,
            Stage::Negotiations => self.negotiations_date = date,
        }
    }

    /// The applied stage has no flag; it counts as completed once dated.
    pub fn stage_completed(&self, stage: Stage) -> bool {
        match stage {
            Stage::Applied => self.applied_date.is_some(),
            Stage::InitialCall => self.initial_call_completed,
            Stage::FirstInterview => self.first_interview_completed,
            Stage::SecondInterview => self.second_interview_completed,
            Stage::ThirdInterview => self.third_interview_completed,
            Stage::Negotiations => self.negotiations_completed,
        }
    }

    pub fn set_stage_completed(&mut self, stage: Stage, completed: bool) {
        match stage {
            Stage::Applied => {}
            Stage::InitialCall => self.initial_call_completed = completed,
            Stage::FirstInterview => self.first_interview_completed = completed,
            Stage::SecondInterview => self.second_interview_completed = completed,
            Stage::ThirdInterview => self.third_interview_completed = completed,
            Stage::Negotiations => self.negotiations_completed = completed,
        }
    }

    pub fn stage_notes(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Applied => None,
            Stage::InitialCall => self.initial_call_notes.as_deref(),
            Stage::FirstInterview => self.first_interview_notes.as_deref(),
            Stage::SecondInterview => self.second_interview_notes.as_deref(),
            Stage::ThirdInterview => self.third_interview_notes.as_deref(),
            Stage::Negotiations => self.negotiations_notes.as_deref(),
        }
    }

    pub fn set_stage_notes(&mut self, stage: Stage, notes: Option<String>) {
        match stage {
            Stage::Applied => {}
            Stage::InitialCall => self.initial_call_notes = notes,
            Stage::FirstInterview => self.first_interview_notes = notes,
            Stage::SecondInterview => self.second_interview_notes = notes,
            Stage::ThirdInterview => self.third_interview_notes = notes,
            Stage::Negotiations => self.negotiations_notes = notes,
        }
    }

    /// Stored file references owned by this row (resume and cover letter).
    pub fn attached_files(&self) -> Vec<String> {
        [&self.resume_file, &self.cover_letter_file]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub application_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub notes: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDocument {
    pub id: String,
    pub application_id: String,
    pub label: Option<String>,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an uploaded file is for. Resume and cover letter occupy a slot on the
/// application row; anything else becomes an `ApplicationDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRole {
    Resume,
    CoverLetter,
    Document,
}

impl DocumentRole {
    /// Prefix of the stored file name.
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentRole::Resume => "resume",
            DocumentRole::CoverLetter => "cover-letter",
            DocumentRole::Document => "document",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentRole::Resume => "resume",
            DocumentRole::CoverLetter => "cover letter",
            DocumentRole::Document => "document",
        }
    }
}

/// List row: an application with its additional documents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<ApplicationDocument>,
}

/// Full read model for one application.
///
/// `timeline_events` holds only stored rows; `timeline` is the projected view
/// that also contains events synthesized from the stage fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub contacts: Vec<Contact>,
    pub timeline_events: Vec<TimelineEvent>,
    pub documents: Vec<ApplicationDocument>,
    pub timeline: Vec<TimelineEvent>,
}
