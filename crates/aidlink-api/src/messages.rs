use anyhow::anyhow;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use uuid::Uuid;

use aidlink_types::api::Claims;
use aidlink_types::events::StoreEvent;
use aidlink_types::models::{ChatMessage, RoomKind, RoomRef};

use crate::auth::AppState;
use crate::error::ApiError;

/// Append a message to a room. Whitespace-only text is dropped without an
/// error or a write; otherwise the message gets a server-assigned
/// timestamp and a store-change event. Fire-and-forget: the response does
/// not wait for any recipient.
pub(crate) async fn send_to_room(
    state: AppState,
    room: RoomRef,
    claims: Claims,
    text: String,
) -> Result<Response, ApiError> {
    ensure_room_exists(&state, room)?;

    if text.trim().is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let message = ChatMessage {
        id: Uuid::new_v4(),
        text,
        sender_email: claims.email,
        timestamp: Utc::now(),
    };

    // Run blocking DB insert off the async runtime
    let db = state.db.clone();
    let stored = message.clone();
    tokio::task::spawn_blocking(move || db.insert_message(room, &stored))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    state.dispatcher.publish(StoreEvent::MessageCreated {
        room,
        message: message.clone(),
    });

    Ok((StatusCode::CREATED, Json(message)).into_response())
}

pub(crate) async fn list_room(
    state: AppState,
    room: RoomRef,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    ensure_room_exists(&state, room)?;

    let db = state.db.clone();
    let messages = tokio::task::spawn_blocking(move || db.messages_for_room(room))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(messages))
}

fn ensure_room_exists(state: &AppState, room: RoomRef) -> Result<(), ApiError> {
    let exists = match room.kind {
        RoomKind::Chat => state.db.get_chat(room.id)?.is_some(),
        RoomKind::Board => state.db.get_board(room.id)?.is_some(),
    };
    if exists { Ok(()) } else { Err(ApiError::NotFound) }
}
