use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

use aidlink_types::api::{Claims, SendMessageRequest};
use aidlink_types::models::{ChatMessage, ChatRoom, RoomRef};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::messages;

/// Chat rooms where the caller is a participant.
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ChatRoom>>, ApiError> {
    Ok(Json(state.db.chats_for_participant(&claims.email)?))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    messages::list_room(state, RoomRef::chat(chat_id)).await
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    messages::send_to_room(state, RoomRef::chat(chat_id), claims, req.text).await
}
