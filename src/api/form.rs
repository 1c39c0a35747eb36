//! Request bodies that arrive either as JSON or as a multipart form.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::documents::UploadedFile;
use crate::patch::ApplicationPatch;

/// Text fields that drive multipart actions and never reach the patch.
const CONTROL_FIELDS: [&str; 6] = [
    "action",
    "label",
    "documentId",
    "documentLabels",
    "resumeFile",
    "coverLetterFile",
];

/// HTML checkbox and plain-text spellings of `true`.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on")
}

/// A fully buffered multipart body, in field order. A file input left blank
/// is kept as `None` so repeated fields still line up by position.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: Vec<(String, String)>,
    files: Vec<(String, Option<UploadedFile>)>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for a file input left blank.
                    let blank = file_name.is_empty() && bytes.is_empty();
                    let file = (!blank).then(|| UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                    form.files.push((name, file));
                }
                None => {
                    let value = field.text().await?;
                    form.texts.push((name, value));
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.texts
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .filter(|(field, _)| field == name)
            .find_map(|(_, file)| file.as_ref())
    }

    /// Non-empty files sent under `name`, each with its position among all
    /// parts of that name, blank ones included.
    pub fn files(&self, name: &str) -> Vec<(usize, &UploadedFile)> {
        self.files
            .iter()
            .filter(|(field, _)| field == name)
            .enumerate()
            .filter_map(|(index, (_, file))| file.as_ref().map(|file| (index, file)))
            .collect()
    }

    /// Converts the application fields of the form into a patch. `*Completed`
    /// fields are read as flags; everything else is text.
    pub fn application_patch(&self) -> Result<ApplicationPatch, ApiError> {
        let mut map = Map::new();
        for (name, value) in &self.texts {
            if CONTROL_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let value = if name.ends_with("Completed") {
                Value::Bool(parse_flag(value))
            } else {
                Value::String(value.clone())
            };
            map.insert(name.clone(), value);
        }
        serde_json::from_value(Value::Object(map))
            .map_err(|e| ApiError::BadRequest(format!("Invalid form data: {e}")))
    }
}

/// Body of `POST /applications` and `PUT /applications/:id`.
#[derive(Debug)]
pub enum ApplicationBody {
    Json(ApplicationPatch),
    Multipart(MultipartForm),
}

#[axum::async_trait]
impl<S> FromRequest<S> for ApplicationBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self::Multipart(MultipartForm::read(multipart).await?))
        } else {
            let Json(patch) = Json::<ApplicationPatch>::from_request(req, state).await?;
            Ok(Self::Json(patch))
        }
    }
}
