use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use aidlink_types::api::{Claims, CreateBoardRequest, SendMessageRequest};
use aidlink_types::events::StoreEvent;
use aidlink_types::models::{ChatMessage, DiscussionBoard, RoomRef};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::messages;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<DiscussionBoard>>, ApiError> {
    Ok(Json(state.db.list_boards()?))
}

/// Create a board with the caller as its first participant. The full
/// document comes back in the response so the client can select it
/// without waiting for the next snapshot.
pub async fn create_board(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please fill out the required fields.".to_string(),
        ));
    }

    let board = DiscussionBoard {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        participants: vec![claims.email.clone()],
        created_by: claims.email,
        created_at: Utc::now(),
    };

    state.db.insert_board(&board)?;
    state.dispatcher.publish(StoreEvent::BoardsChanged);

    Ok((StatusCode::CREATED, Json(board)))
}

/// Append the caller to the board's participants; joining twice is a
/// no-op. The write replaces the whole list, so two users joining at the
/// same moment race last-write-wins and one join can be lost.
pub async fn join_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DiscussionBoard>, ApiError> {
    let mut board = state.db.get_board(board_id)?.ok_or(ApiError::NotFound)?;

    if board.participants.iter().any(|p| p == &claims.email) {
        return Ok(Json(board));
    }

    board.participants.push(claims.email);
    state.db.set_board_participants(board_id, &board.participants)?;
    state.dispatcher.publish(StoreEvent::BoardsChanged);

    Ok(Json(board))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    messages::list_room(state, RoomRef::board(board_id)).await
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    messages::send_to_room(state, RoomRef::board(board_id), claims, req.text).await
}
