//! Stored timeline event endpoints. The projected view lives under
//! `/applications/:id/timeline`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;

use crate::api::endpoints::{ApplicationQuery, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::error::TrackerError;
use crate::models::TimelineEvent;
use crate::timeline::{self, TimelineEventInput};

/// `GET /timeline-events?applicationId=`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<ApplicationQuery>, QueryRejection>,
) -> Result<Json<Vec<TimelineEvent>>, ApiError> {
    let Query(query) = query?;
    let application_id = query.require()?;
    let db = ctx.db()?;
    Ok(Json(db.list_timeline_events(&application_id)?))
}

/// `POST /timeline-events`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<TimelineEventInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TimelineEvent>), ApiError> {
    let Json(input) = payload?;
    let db = ctx.db()?;
    let event = timeline::record_event(&db, input, Utc::now())?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /timeline-events/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TimelineEvent>, ApiError> {
    let db = ctx.db()?;
    let event = db
        .get_timeline_event(&id)?
        .ok_or_else(|| TrackerError::not_found("Timeline event"))?;
    Ok(Json(event))
}

/// `DELETE /timeline-events/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = ctx.db()?;
    db.delete_timeline_event(&id)?;
    Ok(Json(MessageResponse::deleted("Timeline event")))
}
