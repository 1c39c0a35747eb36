//! Contact endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;

use crate::api::endpoints::{ApplicationQuery, MessageResponse};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::contacts::{self, ContactInput};
use crate::error::TrackerError;
use crate::models::Contact;

/// `GET /contacts?applicationId=`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<ApplicationQuery>, QueryRejection>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let Query(query) = query?;
    let application_id = query.require()?;
    let db = ctx.db()?;
    Ok(Json(db.list_contacts(&application_id)?))
}

/// `POST /contacts`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ContactInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let Json(input) = payload?;
    let db = ctx.db()?;
    let contact = contacts::create_contact(&db, input, Utc::now())?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// `GET /contacts/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    let db = ctx.db()?;
    let contact = db
        .get_contact(&id)?
        .ok_or_else(|| TrackerError::not_found("Contact"))?;
    Ok(Json(contact))
}

/// `PUT /contacts/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<ContactInput>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Json(input) = payload?;
    let db = ctx.db()?;
    Ok(Json(contacts::update_contact(&db, &id, input, Utc::now())?))
}

/// `DELETE /contacts/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = ctx.db()?;
    db.delete_contact(&id)?;
    Ok(Json(MessageResponse::deleted("Contact")))
}
