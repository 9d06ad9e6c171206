use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, RequestStatus, Urgency};

// -- JWT Claims --

/// JWT claims shared across aidlink-api (REST middleware) and
/// aidlink-gateway (WebSocket authentication). Canonical definition lives
/// here in aidlink-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub token: String,
}

// -- Requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequestForm {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub urgency: Urgency,
    /// HTML datetime-local value ("2025-03-14T09:30"); omitted means the
    /// request has no target date.
    pub requested_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetStatusRequest {
    pub status: RequestStatus,
}

// -- Boards --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub text: String,
}
