use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::warn;

use aidlink_core::{timeline, unread::UnreadState};
use aidlink_db::Database;
use aidlink_types::events::{GatewayCommand, GatewayEvent, StoreEvent};
use aidlink_types::models::{ChatRoom, DiscussionBoard, RoomKind, RoomRef};

/// Per-connection view state: the live room-list subscriptions, the
/// active room, and the unread fold. States are `no-room` (no active
/// room) and `room-selected`; the first non-empty room-list snapshot
/// auto-selects its first room, in store order.
///
/// Every mutation returns the gateway events the client must receive.
/// List and message events always carry the full re-queried result set:
/// the subscription contract is snapshot replacement, not deltas.
pub struct RoomSession {
    db: Arc<Database>,
    email: String,
    subscribed_chats: bool,
    subscribed_boards: bool,
    chats: Vec<ChatRoom>,
    boards: Vec<DiscussionBoard>,
    active: Option<RoomRef>,
    unread: UnreadState,
}

impl RoomSession {
    pub fn new(db: Arc<Database>, email: String) -> Self {
        Self {
            db,
            email,
            subscribed_chats: false,
            subscribed_boards: false,
            chats: Vec::new(),
            boards: Vec::new(),
            active: None,
            unread: UnreadState::new(),
        }
    }

    pub fn active_room(&self) -> Option<RoomRef> {
        self.active
    }

    pub fn handle_command(&mut self, cmd: GatewayCommand) -> Result<Vec<GatewayEvent>> {
        match cmd {
            GatewayCommand::Identify { .. } => Ok(Vec::new()), // handled at connect
            GatewayCommand::Subscribe { chats, boards } => self.subscribe(chats, boards),
            GatewayCommand::SelectRoom { room } => self.select(room),
            GatewayCommand::DeselectRoom => Ok(self.deselect()),
        }
    }

    pub fn on_store_event(&mut self, event: &StoreEvent) -> Result<Vec<GatewayEvent>> {
        match event {
            StoreEvent::ChatsChanged => {
                if !self.subscribed_chats {
                    return Ok(Vec::new());
                }
                self.refresh_chats()
            }
            StoreEvent::BoardsChanged => {
                if !self.subscribed_boards {
                    return Ok(Vec::new());
                }
                self.refresh_boards()
            }
            StoreEvent::MessageCreated { room, message } => {
                if self.active == Some(*room) {
                    // Viewing the room: republish the full snapshot, no unread.
                    return Ok(vec![self.room_messages(*room)?]);
                }
                if !self.participates_in(*room) {
                    return Ok(Vec::new());
                }
                if self
                    .unread
                    .record(*room, &message.sender_email, self.active, &self.email)
                {
                    Ok(vec![
                        GatewayEvent::UnreadCounts { counts: self.unread.counts() },
                        GatewayEvent::Notify {
                            room: *room,
                            sender: message.sender_email.clone(),
                            preview: message.text.clone(),
                        },
                    ])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    fn subscribe(&mut self, chats: bool, boards: bool) -> Result<Vec<GatewayEvent>> {
        let mut events = Vec::new();
        if chats {
            self.subscribed_chats = true;
            events.extend(self.refresh_chats()?);
        }
        if boards {
            self.subscribed_boards = true;
            events.extend(self.refresh_boards()?);
        }
        Ok(events)
    }

    fn refresh_chats(&mut self) -> Result<Vec<GatewayEvent>> {
        self.chats = self.db.chats_for_participant(&self.email)?;
        let mut events = vec![GatewayEvent::ChatRooms { rooms: self.chats.clone() }];
        events.extend(self.autoselect()?);
        Ok(events)
    }

    fn refresh_boards(&mut self) -> Result<Vec<GatewayEvent>> {
        self.boards = self.db.list_boards()?;
        let mut events = vec![GatewayEvent::Boards { boards: self.boards.clone() }];
        events.extend(self.autoselect()?);
        Ok(events)
    }

    /// First room of the first non-empty snapshot wins, in store order.
    fn autoselect(&mut self) -> Result<Vec<GatewayEvent>> {
        if self.active.is_some() {
            return Ok(Vec::new());
        }
        let first = if self.subscribed_chats && !self.chats.is_empty() {
            Some(RoomRef::chat(self.chats[0].id))
        } else if self.subscribed_boards && !self.boards.is_empty() {
            Some(RoomRef::board(self.boards[0].id))
        } else {
            None
        };
        match first {
            Some(room) => self.select(room),
            None => Ok(Vec::new()),
        }
    }

    fn select(&mut self, room: RoomRef) -> Result<Vec<GatewayEvent>> {
        if !self.knows(room) {
            warn!("{} selected unknown room {:?}", self.email, room);
            return Ok(Vec::new());
        }

        // Switching rooms drops the previous message subscription; the new
        // room's unread counter resets on viewing.
        self.active = Some(room);
        self.unread.mark_viewed(room);

        Ok(vec![
            GatewayEvent::RoomSelected { room: Some(room) },
            self.room_messages(room)?,
            GatewayEvent::UnreadCounts { counts: self.unread.counts() },
        ])
    }

    fn deselect(&mut self) -> Vec<GatewayEvent> {
        self.active = None;
        vec![GatewayEvent::RoomSelected { room: None }]
    }

    fn room_messages(&self, room: RoomRef) -> Result<GatewayEvent> {
        let messages = self.db.messages_for_room(room)?;
        let groups = timeline::group_by_date(&messages, Local::now().date_naive());
        Ok(GatewayEvent::RoomMessages { room, groups })
    }

    fn knows(&self, room: RoomRef) -> bool {
        match room.kind {
            RoomKind::Chat => self.chats.iter().any(|c| c.id == room.id),
            RoomKind::Board => self.boards.iter().any(|b| b.id == room.id),
        }
    }

    /// Whether messages in `room` concern this session: chats are already
    /// filtered to the caller, boards require membership.
    fn participates_in(&self, room: RoomRef) -> bool {
        match room.kind {
            RoomKind::Chat => self.chats.iter().any(|c| c.id == room.id),
            RoomKind::Board => self
                .boards
                .iter()
                .any(|b| b.id == room.id && b.participants.iter().any(|p| p == &self.email)),
        }
    }
}
