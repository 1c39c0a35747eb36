//! API endpoint handlers, one module per resource.
//!
//! Handlers parse the request, take the database lock, and delegate to the
//! core modules. The lock is never held across an `.await`.

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

pub mod applications;
pub mod contacts;
pub mod health;
pub mod timeline_events;

/// `?applicationId=` filter shared by the child-resource list endpoints.
#[derive(Debug, Deserialize)]
pub struct ApplicationQuery {
    #[serde(rename = "applicationId")]
    pub application_id: Option<String>,
}

impl ApplicationQuery {
    pub fn require(self) -> Result<String, ApiError> {
        self.application_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Application ID is required".into()))
    }
}

/// Body returned by the delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn deleted(entity: &str) -> Self {
        Self {
            message: format!("{entity} deleted successfully"),
        }
    }
}
