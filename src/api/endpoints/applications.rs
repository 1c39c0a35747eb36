//! Application endpoints.
//!
//! - `GET /applications` list, newest first, with documents
//! - `POST /applications` create from JSON or a multipart form with files
//! - `GET /applications/:id` detail with contacts, events, documents, timeline
//! - `PUT /applications/:id` JSON patch, or multipart document action
//! - `DELETE /applications/:id` delete with children and files
//! - `GET /applications/:id/timeline` projected timeline

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;

use crate::api::endpoints::MessageResponse;
use crate::api::error::ApiError;
use crate::api::form::{ApplicationBody, MultipartForm};
use crate::api::types::ApiContext;
use crate::documents::{self, DocumentAction, InitialUploads};
use crate::error::TrackerError;
use crate::models::{Application, ApplicationDetail, ApplicationSummary, TimelineEvent};
use crate::sync;
use crate::timeline::project_timeline;

/// `GET /applications`
pub async fn list(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<ApplicationSummary>>, ApiError> {
    let db = ctx.db()?;
    Ok(Json(db.list_application_summaries()?))
}

fn initial_uploads(form: &MultipartForm) -> InitialUploads {
    let labels = form.texts("documentLabels");
    InitialUploads {
        resume: form.file("resumeFile").cloned(),
        cover_letter: form.file("coverLetterFile").cloned(),
        additional: form
            .files("documentFiles")
            .into_iter()
            .map(|(index, file)| {
                let label = labels.get(index).map(|l| l.to_string());
                (file.clone(), label)
            })
            .collect(),
    }
}

/// `POST /applications`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: ApplicationBody,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    let now = Utc::now();
    let db = ctx.db()?;
    let app = match body {
        ApplicationBody::Json(patch) => sync::create_application(&db, &patch, now)?,
        ApplicationBody::Multipart(form) => {
            let patch = form.application_patch()?;
            documents::create_application_with_uploads(
                &db,
                &ctx.files,
                &patch,
                &initial_uploads(&form),
                now,
            )?
        }
    };
    Ok((StatusCode::CREATED, Json(app)))
}

fn detail_or_404(ctx: &ApiContext, id: &str) -> Result<ApplicationDetail, ApiError> {
    ctx.db()?
        .get_application_detail(id)?
        .ok_or_else(|| TrackerError::not_found("Application").into())
}

/// `GET /applications/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationDetail>, ApiError> {
    Ok(Json(detail_or_404(&ctx, &id)?))
}

/// `PUT /applications/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: ApplicationBody,
) -> Result<Json<ApplicationDetail>, ApiError> {
    let now = Utc::now();
    match body {
        ApplicationBody::Json(patch) => {
            let db = ctx.db()?;
            Ok(Json(sync::apply_application_update(&db, &id, &patch, now)?))
        }
        ApplicationBody::Multipart(form) => {
            let action = form
                .text("action")
                .ok_or_else(|| ApiError::BadRequest("Action is required".into()))?;
            let action = DocumentAction::parse(
                action,
                form.file("file").cloned(),
                form.text("label").map(str::to_string),
                form.text("documentId").map(str::to_string),
            )?;
            {
                let db = ctx.db()?;
                documents::apply_document_action(&db, &ctx.files, &id, &action, now)?;
            }
            Ok(Json(detail_or_404(&ctx, &id)?))
        }
    }
}

/// `DELETE /applications/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = ctx.db()?;
    documents::delete_application(&db, &ctx.files, &id)?;
    Ok(Json(MessageResponse::deleted("Application")))
}

/// `GET /applications/:id/timeline`
pub async fn timeline(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimelineEvent>>, ApiError> {
    let db = ctx.db()?;
    let app = db.require_application(&id)?;
    let stored = db.list_timeline_events(&id)?;
    Ok(Json(project_timeline(&app, &stored)))
}
