use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChatMessage, ChatRoom, DiscussionBoard, RoomRef};

/// Events sent over the WebSocket gateway. List and message events carry
/// the entire current result set of their subscription: every store-side
/// change republishes the full snapshot, never a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, email: String, name: String },

    /// Full snapshot of the chat rooms the session participates in
    ChatRooms { rooms: Vec<ChatRoom> },

    /// Full snapshot of all discussion boards
    Boards { boards: Vec<DiscussionBoard> },

    /// Full ordered message snapshot for the active room, partitioned
    /// into date buckets ("Today" / "Yesterday" / calendar date)
    RoomMessages {
        room: RoomRef,
        groups: Vec<MessageGroup>,
    },

    /// The session's active room changed (selection, auto-selection, or
    /// deselection)
    RoomSelected { room: Option<RoomRef> },

    /// Per-room unread counters after the latest change
    UnreadCounts { counts: Vec<UnreadCount> },

    /// A message arrived for a room the session participates in but is
    /// not currently viewing
    Notify {
        room: RoomRef,
        sender: String,
        preview: String,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Open live room-list subscriptions
    Subscribe { chats: bool, boards: bool },

    /// Make `room` the active room; its unread count resets to zero
    SelectRoom { room: RoomRef },

    /// Return to the no-room state
    DeselectRoom,
}

/// Ordered run of messages sharing a date bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageGroup {
    pub label: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
    pub room: RoomRef,
    pub count: u32,
}

/// Store-change notifications published by write handlers and consumed by
/// gateway sessions, which re-query and ship fresh snapshots.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    ChatsChanged,
    BoardsChanged,
    MessageCreated { room: RoomRef, message: ChatMessage },
}
