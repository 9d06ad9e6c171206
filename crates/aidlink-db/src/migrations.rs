use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            photo_url   TEXT,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS requests (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            category        TEXT NOT NULL,
            urgency         TEXT NOT NULL,
            requester_id    TEXT NOT NULL REFERENCES users(id),
            requester_name  TEXT NOT NULL,
            requester_email TEXT NOT NULL,
            volunteer_email TEXT,
            status          TEXT NOT NULL DEFAULT 'pending',
            requested_at    TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_requests_requester
            ON requests(requester_id);

        -- One chat per request is maintained by the reconcile rule's
        -- existence check, not by a unique index: the concurrent
        -- check-then-create race is an accepted limitation.
        CREATE TABLE IF NOT EXISTS chats (
            id            TEXT PRIMARY KEY,
            request_id    TEXT NOT NULL REFERENCES requests(id),
            request_title TEXT NOT NULL,
            participants  TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chats_request
            ON chats(request_id);

        CREATE TABLE IF NOT EXISTS boards (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            participants  TEXT NOT NULL,
            created_by    TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id           TEXT PRIMARY KEY,
            room_kind    TEXT NOT NULL,
            room_id      TEXT NOT NULL,
            text         TEXT NOT NULL,
            sender_email TEXT NOT NULL,
            timestamp    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_room
            ON messages(room_kind, room_id, timestamp);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
