//! Database row types; these map directly to SQLite rows. Conversions to
//! the aidlink-types domain models normalize store-native representations
//! (text timestamps, JSON participant lists, enum strings) so callers
//! never see them.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use aidlink_types::models::{
    AidRequest, Category, ChatMessage, ChatRoom, DiscussionBoard, RequestStatus, Urgency,
};

pub struct RequestRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub urgency: String,
    pub requester_id: String,
    pub requester_name: String,
    pub requester_email: String,
    pub volunteer_email: Option<String>,
    pub status: String,
    pub requested_at: Option<String>,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub request_id: String,
    pub request_title: String,
    pub participants: String,
    pub created_at: String,
}

pub struct BoardRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub participants: String,
    pub created_by: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub text: String,
    pub sender_email: String,
    pub timestamp: String,
}

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub password: String,
    pub created_at: String,
}

/// Parse a stored timestamp. Rows written by Rust carry RFC 3339; rows
/// defaulted by SQLite carry "YYYY-MM-DD HH:MM:SS" without timezone,
/// which is parsed as naive UTC.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("bad timestamp '{}': {}", s, e))
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid> {
    s.parse::<Uuid>()
        .map_err(|e| anyhow!("corrupt {} '{}': {}", what, s, e))
}

fn parse_participants(raw: &str, room_id: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("Corrupt participants on room '{}': {}", room_id, e);
            Vec::new()
        }
    }
}

impl RequestRow {
    pub fn into_request(self) -> Result<AidRequest> {
        Ok(AidRequest {
            id: parse_uuid(&self.id, "request id")?,
            category: Category::parse(&self.category)
                .ok_or_else(|| anyhow!("unknown category '{}'", self.category))?,
            urgency: Urgency::parse(&self.urgency)
                .ok_or_else(|| anyhow!("unknown urgency '{}'", self.urgency))?,
            requester_id: parse_uuid(&self.requester_id, "requester id")?,
            status: RequestStatus::parse(&self.status)
                .ok_or_else(|| anyhow!("unknown status '{}'", self.status))?,
            requested_at: self.requested_at.as_deref().map(parse_utc).transpose()?,
            created_at: parse_utc(&self.created_at)?,
            title: self.title,
            description: self.description,
            requester_name: self.requester_name,
            requester_email: self.requester_email,
            volunteer_email: self.volunteer_email,
        })
    }
}

impl ChatRow {
    pub fn into_chat(self) -> Result<ChatRoom> {
        Ok(ChatRoom {
            id: parse_uuid(&self.id, "chat id")?,
            request_id: parse_uuid(&self.request_id, "request id")?,
            participants: parse_participants(&self.participants, &self.id),
            created_at: parse_utc(&self.created_at)?,
            request_title: self.request_title,
        })
    }
}

impl BoardRow {
    pub fn into_board(self) -> Result<DiscussionBoard> {
        Ok(DiscussionBoard {
            id: parse_uuid(&self.id, "board id")?,
            participants: parse_participants(&self.participants, &self.id),
            created_at: parse_utc(&self.created_at)?,
            title: self.title,
            description: self.description,
            created_by: self.created_by,
        })
    }
}

impl MessageRow {
    pub fn into_message(self) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            timestamp: parse_utc(&self.timestamp)?,
            text: self.text,
            sender_email: self.sender_email,
        })
    }
}
