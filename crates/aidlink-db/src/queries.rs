use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

use aidlink_types::models::{
    AidRequest, ChatMessage, ChatRoom, DiscussionBoard, RequestStatus, RoomRef,
};

use crate::Database;
use crate::models::{BoardRow, ChatRow, MessageRow, RequestRow, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        photo_url: Option<&str>,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, photo_url, password) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, email, name, photo_url, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Requests --

    pub fn insert_request(&self, request: &AidRequest) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO requests (id, title, description, category, urgency,
                     requester_id, requester_name, requester_email, volunteer_email,
                     status, requested_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    request.id.to_string(),
                    request.title,
                    request.description,
                    request.category.as_str(),
                    request.urgency.as_str(),
                    request.requester_id.to_string(),
                    request.requester_name,
                    request.requester_email,
                    request.volunteer_email,
                    request.status.as_str(),
                    request.requested_at.map(|t| t.to_rfc3339()),
                    request.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Full snapshot of every request. No pagination: the request set is
    /// small and callers reduce over all of it.
    pub fn list_requests(&self) -> Result<Vec<AidRequest>> {
        self.with_conn(|conn| {
            query_requests(conn, "SELECT * FROM requests ORDER BY rowid", &[])
        })
    }

    pub fn list_requests_by_owner(&self, owner: Uuid) -> Result<Vec<AidRequest>> {
        self.with_conn(|conn| {
            query_requests(
                conn,
                "SELECT * FROM requests WHERE requester_id = ?1 ORDER BY rowid",
                &[&owner.to_string()],
            )
        })
    }

    /// Requests that have gained a volunteer, for the reconcile sweep.
    pub fn list_claimed_requests(&self) -> Result<Vec<AidRequest>> {
        self.with_conn(|conn| {
            query_requests(
                conn,
                "SELECT * FROM requests WHERE volunteer_email IS NOT NULL ORDER BY rowid",
                &[],
            )
        })
    }

    pub fn get_request(&self, id: Uuid) -> Result<Option<AidRequest>> {
        self.with_conn(|conn| {
            let rows = query_requests(
                conn,
                "SELECT * FROM requests WHERE id = ?1",
                &[&id.to_string()],
            )?;
            Ok(rows.into_iter().next())
        })
    }

    /// Unconditional single-field update, last-write-wins. Returns false
    /// when the id is unknown.
    pub fn set_request_status(&self, id: Uuid, status: RequestStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE requests SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), id.to_string()],
            )?;
            Ok(n > 0)
        })
    }

    /// Records the claiming volunteer. Same last-write-wins semantics as
    /// `set_request_status`; re-applying the same email is a no-op.
    pub fn set_request_volunteer(&self, id: Uuid, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE requests SET volunteer_email = ?1 WHERE id = ?2",
                rusqlite::params![email, id.to_string()],
            )?;
            Ok(n > 0)
        })
    }

    // -- Chats --

    pub fn insert_chat(&self, chat: &ChatRoom) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, request_id, request_title, participants, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    chat.id.to_string(),
                    chat.request_id.to_string(),
                    chat.request_title,
                    serde_json::to_string(&chat.participants)?,
                    chat.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn chats_by_request(&self, request_id: Uuid) -> Result<Vec<ChatRoom>> {
        self.with_conn(|conn| {
            query_chats(
                conn,
                "SELECT id, request_id, request_title, participants, created_at
                 FROM chats WHERE request_id = ?1 ORDER BY rowid",
                &[&request_id.to_string()],
            )
        })
    }

    /// Chat rooms where `email` appears in the participants list. The
    /// participants column holds a JSON array, so the filter runs over the
    /// decoded lists rather than in SQL.
    pub fn chats_for_participant(&self, email: &str) -> Result<Vec<ChatRoom>> {
        let all = self.with_conn(|conn| {
            query_chats(
                conn,
                "SELECT id, request_id, request_title, participants, created_at
                 FROM chats ORDER BY rowid",
                &[],
            )
        })?;
        Ok(all
            .into_iter()
            .filter(|c| c.participants.iter().any(|p| p == email))
            .collect())
    }

    pub fn get_chat(&self, id: Uuid) -> Result<Option<ChatRoom>> {
        self.with_conn(|conn| {
            let rows = query_chats(
                conn,
                "SELECT id, request_id, request_title, participants, created_at
                 FROM chats WHERE id = ?1",
                &[&id.to_string()],
            )?;
            Ok(rows.into_iter().next())
        })
    }

    // -- Boards --

    pub fn insert_board(&self, board: &DiscussionBoard) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO boards (id, title, description, participants, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    board.id.to_string(),
                    board.title,
                    board.description,
                    serde_json::to_string(&board.participants)?,
                    board.created_by,
                    board.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_boards(&self) -> Result<Vec<DiscussionBoard>> {
        self.with_conn(|conn| {
            query_boards(
                conn,
                "SELECT id, title, description, participants, created_by, created_at
                 FROM boards ORDER BY rowid",
                &[],
            )
        })
    }

    pub fn get_board(&self, id: Uuid) -> Result<Option<DiscussionBoard>> {
        self.with_conn(|conn| {
            let rows = query_boards(
                conn,
                "SELECT id, title, description, participants, created_by, created_at
                 FROM boards WHERE id = ?1",
                &[&id.to_string()],
            )?;
            Ok(rows.into_iter().next())
        })
    }

    /// Whole-list replacement of a board's participants. Concurrent joins
    /// race last-write-wins on the full field.
    pub fn set_board_participants(&self, id: Uuid, participants: &[String]) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE boards SET participants = ?1 WHERE id = ?2",
                rusqlite::params![serde_json::to_string(participants)?, id.to_string()],
            )?;
            Ok(n > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, room: RoomRef, message: &ChatMessage) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, room_kind, room_id, text, sender_email, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    message.id.to_string(),
                    room.kind.as_str(),
                    room.id.to_string(),
                    message.text,
                    message.sender_email,
                    // fixed-width so the ORDER BY over the text column is
                    // chronological
                    message
                        .timestamp
                        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
                ],
            )?;
            Ok(())
        })
    }

    /// Full ordered message snapshot for one room. Insertion order breaks
    /// timestamp ties, so the order is total.
    pub fn messages_for_room(&self, room: RoomRef) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, sender_email, timestamp FROM messages
                 WHERE room_kind = ?1 AND room_id = ?2
                 ORDER BY timestamp ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![room.kind.as_str(), room.id.to_string()],
                    |row| {
                        Ok(MessageRow {
                            id: row.get(0)?,
                            text: row.get(1)?,
                            sender_email: row.get(2)?,
                            timestamp: row.get(3)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(|r| r.into_message()).collect()
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, name, photo_url, password, created_at FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                photo_url: row.get(3)?,
                password: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_requests(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<AidRequest>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(RequestRow {
                id: row.get("id")?,
                title: row.get("title")?,
                description: row.get("description")?,
                category: row.get("category")?,
                urgency: row.get("urgency")?,
                requester_id: row.get("requester_id")?,
                requester_name: row.get("requester_name")?,
                requester_email: row.get("requester_email")?,
                volunteer_email: row.get("volunteer_email")?,
                status: row.get("status")?,
                requested_at: row.get("requested_at")?,
                created_at: row.get("created_at")?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(|r| r.into_request()).collect()
}

fn query_chats(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<ChatRoom>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(ChatRow {
                id: row.get(0)?,
                request_id: row.get(1)?,
                request_title: row.get(2)?,
                participants: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(|r| r.into_chat()).collect()
}

fn query_boards(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<DiscussionBoard>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(BoardRow {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                participants: row.get(3)?,
                created_by: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(|r| r.into_board()).collect()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
