use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use aidlink_types::api::{Claims, CreateRequestForm, SetStatusRequest};
use aidlink_types::events::StoreEvent;
use aidlink_types::models::{AidRequest, RequestStatus};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::reconcile;

pub async fn create_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<CreateRequestForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.title.trim().is_empty() || form.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please fill out the required fields.".to_string(),
        ));
    }

    let requested_at = form
        .requested_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_datetime_local)
        .transpose()?;

    let request = AidRequest {
        id: Uuid::new_v4(),
        title: form.title,
        description: form.description,
        category: form.category,
        urgency: form.urgency,
        requester_id: claims.sub,
        requester_name: claims.name.clone(),
        requester_email: claims.email.clone(),
        volunteer_email: None,
        status: RequestStatus::Pending,
        requested_at,
        created_at: Utc::now(),
    };

    state.db.insert_request(&request)?;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<AidRequest>>, ApiError> {
    Ok(Json(state.db.list_requests()?))
}

pub async fn my_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AidRequest>>, ApiError> {
    Ok(Json(state.db.list_requests_by_owner(claims.sub)?))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<AidRequest>, ApiError> {
    if !state.db.set_request_status(request_id, req.status)? {
        return Err(ApiError::NotFound);
    }

    let updated = state.db.get_request(request_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

/// Claim a request as its volunteer. The update is last-write-wins with
/// no version check; re-claiming overwrites silently. A successful claim
/// runs the auto-chat rule so the requester/volunteer room exists.
pub async fn volunteer(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AidRequest>, ApiError> {
    let request = state.db.get_request(request_id)?.ok_or(ApiError::NotFound)?;

    if request.requester_id == claims.sub {
        return Err(ApiError::Forbidden(
            "You cannot volunteer for your own request.".to_string(),
        ));
    }

    state.db.set_request_volunteer(request_id, &claims.email)?;
    let updated = state.db.get_request(request_id)?.ok_or(ApiError::NotFound)?;

    if reconcile::ensure_chat_exists(&state.db, &updated)?.is_some() {
        state.dispatcher.publish(StoreEvent::ChatsChanged);
    }

    Ok(Json(updated))
}

fn parse_datetime_local(s: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .map(|ndt| ndt.and_utc())
        .map_err(|_| ApiError::Validation("Invalid requested date.".to_string()))
}
