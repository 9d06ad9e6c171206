use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use aidlink_db::Database;
use aidlink_types::events::StoreEvent;
use aidlink_types::models::{AidRequest, ChatRoom};

use crate::auth::AppState;

/// Get-or-create the chat room for a claimed request. Idempotent across
/// sequential calls by construction of the existence check. The check and
/// the insert are separate statements: two truly concurrent callers can
/// both observe zero rows and create two rooms. Accepted limitation.
pub fn ensure_chat_exists(db: &Database, request: &AidRequest) -> Result<Option<ChatRoom>> {
    let Some(volunteer) = request.volunteer_email.as_deref() else {
        return Ok(None);
    };

    if !db.chats_by_request(request.id)?.is_empty() {
        return Ok(None);
    }

    let chat = ChatRoom {
        id: Uuid::new_v4(),
        request_id: request.id,
        request_title: request.title.clone(),
        participants: vec![request.requester_email.clone(), volunteer.to_string()],
        created_at: Utc::now(),
    };
    db.insert_chat(&chat)?;

    Ok(Some(chat))
}

/// Background sweep: any claimed request without a chat room gets one.
/// Covers requests whose volunteer arrived while the requester was away.
pub async fn run_reconcile_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep(&state.db) {
            Ok(0) => {}
            Ok(count) => {
                info!("Reconcile: created {} chat rooms", count);
                state.dispatcher.publish(StoreEvent::ChatsChanged);
            }
            Err(e) => {
                warn!("Reconcile error: {}", e);
            }
        }
    }
}

fn sweep(db: &Database) -> Result<usize> {
    let mut created = 0;
    for request in db.list_claimed_requests()? {
        if ensure_chat_exists(db, &request)?.is_some() {
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidlink_types::models::{Category, RequestStatus, Urgency};

    fn seed_request(db: &Database, volunteer: Option<&str>) -> AidRequest {
        let requester = Uuid::new_v4();
        db.create_user(
            &requester.to_string(),
            &format!("{}@example.com", requester),
            "Sam",
            None,
            "h",
        )
        .unwrap();
        let request = AidRequest {
            id: Uuid::new_v4(),
            title: "Need groceries".to_string(),
            description: "weekly shop".to_string(),
            category: Category::Groceries,
            urgency: Urgency::Medium,
            requester_id: requester,
            requester_name: "Sam".to_string(),
            requester_email: "sam@example.com".to_string(),
            volunteer_email: volunteer.map(String::from),
            status: RequestStatus::Pending,
            requested_at: None,
            created_at: Utc::now(),
        };
        db.insert_request(&request).unwrap();
        request
    }

    #[test]
    fn creates_exactly_one_room_across_repeated_calls() {
        let db = Database::open_in_memory().unwrap();
        let request = seed_request(&db, Some("val@example.com"));

        let first = ensure_chat_exists(&db, &request).unwrap();
        assert!(first.is_some());

        for _ in 0..5 {
            assert!(ensure_chat_exists(&db, &request).unwrap().is_none());
        }

        let chats = db.chats_by_request(request.id).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(
            chats[0].participants,
            vec!["sam@example.com".to_string(), "val@example.com".to_string()]
        );
    }

    #[test]
    fn unclaimed_request_gets_no_room() {
        let db = Database::open_in_memory().unwrap();
        let request = seed_request(&db, None);

        assert!(ensure_chat_exists(&db, &request).unwrap().is_none());
        assert!(db.chats_by_request(request.id).unwrap().is_empty());
    }

    #[test]
    fn sweep_covers_rooms_missed_while_away() {
        let db = Database::open_in_memory().unwrap();
        let claimed = seed_request(&db, Some("val@example.com"));
        let unclaimed = seed_request(&db, None);

        assert_eq!(sweep(&db).unwrap(), 1);
        assert_eq!(db.chats_by_request(claimed.id).unwrap().len(), 1);
        assert!(db.chats_by_request(unclaimed.id).unwrap().is_empty());

        // a second sweep finds nothing to do
        assert_eq!(sweep(&db).unwrap(), 0);
    }
}
