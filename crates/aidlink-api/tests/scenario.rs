//! End-to-end flow over an in-memory store: a requester posts a request,
//! a volunteer claims it, the chat room appears exactly once, messages
//! flow in order, and the non-viewing participant's unread count rises
//! and resets.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tokio::sync::broadcast;
use uuid::Uuid;

use aidlink_api::auth::{AppState, AppStateInner};
use aidlink_api::error::ApiError;
use aidlink_api::{chats, requests};
use aidlink_db::Database;
use aidlink_gateway::dispatcher::Dispatcher;
use aidlink_gateway::session::RoomSession;
use aidlink_types::api::{Claims, CreateRequestForm, SendMessageRequest};
use aidlink_types::events::{GatewayCommand, GatewayEvent, StoreEvent};
use aidlink_types::models::{Category, RequestStatus, RoomRef, Urgency};

fn test_state() -> AppState {
    Arc::new(AppStateInner {
        db: Arc::new(Database::open_in_memory().unwrap()),
        jwt_secret: "test-secret".to_string(),
        dispatcher: Dispatcher::new(),
    })
}

fn register(state: &AppState, email: &str, name: &str) -> Claims {
    let id = Uuid::new_v4();
    state
        .db
        .create_user(&id.to_string(), email, name, None, "hash")
        .unwrap();
    Claims {
        sub: id,
        email: email.to_string(),
        name: name.to_string(),
        exp: 0,
    }
}

fn groceries_form(title: &str, description: &str) -> CreateRequestForm {
    CreateRequestForm {
        title: title.to_string(),
        description: description.to_string(),
        category: Category::Groceries,
        urgency: Urgency::Medium,
        requested_at: None,
    }
}

/// Feed every pending store event into a session, as its connection loop
/// would, and collect the resulting gateway events.
fn pump(rx: &mut broadcast::Receiver<StoreEvent>, session: &mut RoomSession) -> Vec<GatewayEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.extend(session.on_store_event(&event).unwrap());
    }
    out
}

#[tokio::test]
async fn request_to_chat_flow() {
    let state = test_state();
    let sam = register(&state, "sam@example.com", "Sam");
    let val = register(&state, "val@example.com", "Val");

    // Sam posts a request
    assert!(
        requests::create_request(
            State(state.clone()),
            Extension(sam.clone()),
            Json(groceries_form("Need groceries", "Weekly shop, can't drive")),
        )
        .await
        .is_ok()
    );

    // ...and it shows up under their own requests, pending and unclaimed
    let mine = requests::my_requests(State(state.clone()), Extension(sam.clone()))
        .await
        .unwrap()
        .0;
    assert_eq!(mine.len(), 1);
    let request = &mine[0];
    assert_eq!(request.title, "Need groceries");
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.volunteer_email, None);

    // Both participants' gateway sessions come up before the claim
    let mut sam_rx = state.dispatcher.subscribe();
    let mut val_rx = state.dispatcher.subscribe();
    let mut sam_session = RoomSession::new(state.db.clone(), sam.email.clone());
    let mut val_session = RoomSession::new(state.db.clone(), val.email.clone());
    sam_session
        .handle_command(GatewayCommand::Subscribe { chats: true, boards: true })
        .unwrap();
    val_session
        .handle_command(GatewayCommand::Subscribe { chats: true, boards: true })
        .unwrap();

    // Val volunteers
    let claimed = requests::volunteer(
        State(state.clone()),
        Path(request.id),
        Extension(val.clone()),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(claimed.volunteer_email.as_deref(), Some("val@example.com"));

    // exactly one chat room, with both participants
    let rooms = state.db.chats_by_request(request.id).unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(
        rooms[0].participants,
        vec!["sam@example.com".to_string(), "val@example.com".to_string()]
    );
    let room = RoomRef::chat(rooms[0].id);

    // the ChatsChanged snapshot reaches both sessions; the new room is
    // their first, so it auto-selects
    pump(&mut sam_rx, &mut sam_session);
    pump(&mut val_rx, &mut val_session);
    assert_eq!(sam_session.active_room(), Some(room));
    assert_eq!(val_session.active_room(), Some(room));

    // Val steps away from the room
    val_session.handle_command(GatewayCommand::DeselectRoom).unwrap();

    // one message from each participant
    let sent = chats::send_message(
        State(state.clone()),
        Path(room.id),
        Extension(sam.clone()),
        Json(SendMessageRequest { text: "Hi! I can shop Saturday.".to_string() }),
    )
    .await
    .unwrap();
    assert_eq!(sent.status(), StatusCode::CREATED);

    let sent = chats::send_message(
        State(state.clone()),
        Path(room.id),
        Extension(val.clone()),
        Json(SendMessageRequest { text: "Saturday works, thank you!".to_string() }),
    )
    .await
    .unwrap();
    assert_eq!(sent.status(), StatusCode::CREATED);

    // messages come back in send order
    let messages = chats::get_messages(
        State(state.clone()),
        Path(room.id),
        Extension(sam.clone()),
    )
    .await
    .unwrap()
    .0;
    let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["Hi! I can shop Saturday.", "Saturday works, thank you!"]);

    // Sam is viewing the room: snapshots, no unread. Val is not viewing:
    // Sam's message counts once, Val's own message doesn't.
    let sam_events = pump(&mut sam_rx, &mut sam_session);
    assert!(sam_events.iter().all(|e| matches!(e, GatewayEvent::RoomMessages { .. })));

    let val_events = pump(&mut val_rx, &mut val_session);
    let unread: Vec<_> = val_events
        .iter()
        .filter_map(|e| match e {
            GatewayEvent::UnreadCounts { counts } => Some(counts.clone()),
            _ => None,
        })
        .collect();
    let last_unread = unread.last().unwrap();
    assert_eq!(last_unread.len(), 1);
    assert_eq!(last_unread[0].room, room);
    assert_eq!(last_unread[0].count, 1);
    assert!(val_events.iter().any(|e| matches!(e, GatewayEvent::Notify { .. })));

    // selecting the room resets Val's counter to zero
    let events = val_session
        .handle_command(GatewayCommand::SelectRoom { room })
        .unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        GatewayEvent::UnreadCounts { counts } if counts.is_empty()
    )));
}

#[tokio::test]
async fn blank_fields_are_rejected_and_nothing_is_written() {
    let state = test_state();
    let sam = register(&state, "sam@example.com", "Sam");

    let result = requests::create_request(
        State(state.clone()),
        Extension(sam.clone()),
        Json(groceries_form("   ", "")),
    )
    .await;

    match result {
        Err(ApiError::Validation(msg)) => {
            assert_eq!(msg, "Please fill out the required fields.")
        }
        Ok(_) => panic!("blank request was accepted"),
        Err(other) => panic!("unexpected error: {:?}", other),
    }

    assert!(state.db.list_requests().unwrap().is_empty());
}

#[tokio::test]
async fn whitespace_message_is_a_silent_no_op() {
    let state = test_state();
    let sam = register(&state, "sam@example.com", "Sam");
    let val = register(&state, "val@example.com", "Val");

    // claimed request with its chat room
    assert!(
        requests::create_request(
            State(state.clone()),
            Extension(sam.clone()),
            Json(groceries_form("Need groceries", "Weekly shop")),
        )
        .await
        .is_ok()
    );
    let request = requests::my_requests(State(state.clone()), Extension(sam.clone()))
        .await
        .unwrap()
        .0
        .remove(0);
    requests::volunteer(State(state.clone()), Path(request.id), Extension(val.clone()))
        .await
        .unwrap();
    let room_id = state.db.chats_by_request(request.id).unwrap()[0].id;

    let sent = chats::send_message(
        State(state.clone()),
        Path(room_id),
        Extension(val.clone()),
        Json(SendMessageRequest { text: "   \n\t ".to_string() }),
    )
    .await
    .unwrap();
    assert_eq!(sent.status(), StatusCode::NO_CONTENT);

    let messages = chats::get_messages(State(state.clone()), Path(room_id), Extension(sam))
        .await
        .unwrap()
        .0;
    assert!(messages.is_empty());
}
