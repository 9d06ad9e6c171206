use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Resolved,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "resolved" => Some(Self::Resolved),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Health,
    Safety,
    Environment,
    Groceries,
    Tutoring,
    Building,
    #[serde(rename = "Carrying Something")]
    Carrying,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Safety => "Safety",
            Self::Environment => "Environment",
            Self::Groceries => "Groceries",
            Self::Tutoring => "Tutoring",
            Self::Building => "Building",
            Self::Carrying => "Carrying Something",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Health" => Some(Self::Health),
            "Safety" => Some(Self::Safety),
            "Environment" => Some(Self::Environment),
            "Groceries" => Some(Self::Groceries),
            "Tutoring" => Some(Self::Tutoring),
            "Building" => Some(Self::Building),
            "Carrying Something" => Some(Self::Carrying),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A community aid request. `volunteer_email` is set at most once (claiming);
/// there is no unclaim path. Requests are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AidRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub urgency: Urgency,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_email: String,
    pub volunteer_email: Option<String>,
    pub status: RequestStatus,
    pub requested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Two-participant room backing the requester/volunteer conversation.
/// Created once per claimed request, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub request_id: Uuid,
    pub request_title: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Topic room anyone can create and join. Joining appends the caller's
/// email to `participants`; the list stays duplicate-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionBoard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub participants: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A message in either room flavor. Immutable once written; the server
/// assigns the timestamp, which orders messages within a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender_email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Chat,
    Board,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Board => "board",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(Self::Chat),
            "board" => Some(Self::Board),
            _ => None,
        }
    }
}

/// Uniform handle for the two room flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomRef {
    pub kind: RoomKind,
    pub id: Uuid,
}

impl RoomRef {
    pub fn chat(id: Uuid) -> Self {
        Self { kind: RoomKind::Chat, id }
    }

    pub fn board(id: Uuid) -> Self {
        Self { kind: RoomKind::Board, id }
    }
}

/// Dashboard summary computed on demand from the full request set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total: u32,
    pub pending: u32,
    pub resolved: u32,
    pub cancelled: u32,
    /// Requests per weekday of `requested_at`, Monday-first (Sunday lands
    /// in bucket 6).
    pub weekly: [u32; 7],
}

impl RequestStats {
    pub fn zero() -> Self {
        Self {
            total: 0,
            pending: 0,
            resolved: 0,
            cancelled: 0,
            weekly: [0; 7],
        }
    }
}
