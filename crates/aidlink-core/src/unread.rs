use std::collections::{HashMap, HashSet};

use aidlink_types::events::UnreadCount;
use aidlink_types::models::{ChatMessage, RoomRef};

/// Count of messages present in `next` but not in `prev` that were
/// authored by someone other than `self_email`. Snapshots are full-state
/// replacements, so "newly arrived" means any id not previously seen.
pub fn unread_delta(prev: &[ChatMessage], next: &[ChatMessage], self_email: &str) -> u32 {
    let seen: HashSet<_> = prev.iter().map(|m| m.id).collect();
    next.iter()
        .filter(|m| !seen.contains(&m.id) && m.sender_email != self_email)
        .count() as u32
}

/// Per-room unread counters, folded over the incoming message stream.
/// A room's counter only grows while it is not the active room and resets
/// to zero exactly when it becomes viewed.
#[derive(Debug, Default)]
pub struct UnreadState {
    counts: HashMap<RoomRef, u32>,
}

impl UnreadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a single arriving message. Returns true when it counted as
    /// unread (sender is someone else and the room is not active).
    pub fn record(
        &mut self,
        room: RoomRef,
        sender_email: &str,
        active: Option<RoomRef>,
        self_email: &str,
    ) -> bool {
        if sender_email == self_email || active == Some(room) {
            return false;
        }
        *self.counts.entry(room).or_insert(0) += 1;
        true
    }

    /// Fold a snapshot replacement for `room`. Returns the number of
    /// messages that counted as unread.
    pub fn apply_snapshot(
        &mut self,
        room: RoomRef,
        prev: &[ChatMessage],
        next: &[ChatMessage],
        active: Option<RoomRef>,
        self_email: &str,
    ) -> u32 {
        if active == Some(room) {
            return 0;
        }
        let delta = unread_delta(prev, next, self_email);
        if delta > 0 {
            *self.counts.entry(room).or_insert(0) += delta;
        }
        delta
    }

    /// The room became the active/viewed room: its counter resets to zero.
    pub fn mark_viewed(&mut self, room: RoomRef) {
        self.counts.insert(room, 0);
    }

    pub fn count(&self, room: RoomRef) -> u32 {
        self.counts.get(&room).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Snapshot of every non-zero counter, for the UnreadCounts event.
    pub fn counts(&self) -> Vec<UnreadCount> {
        let mut counts: Vec<UnreadCount> = self
            .counts
            .iter()
            .filter(|&(_, &c)| c > 0)
            .map(|(&room, &count)| UnreadCount { room, count })
            .collect();
        counts.sort_by_key(|c| c.room.id);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    const ME: &str = "sam@example.com";
    const PEER: &str = "val@example.com";

    fn msg(sender: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            text: "hi".to_string(),
            sender_email: sender.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn room() -> RoomRef {
        RoomRef::chat(Uuid::new_v4())
    }

    #[test]
    fn delta_counts_only_new_foreign_messages() {
        let prev = vec![msg(PEER), msg(ME)];
        let mut next = prev.clone();
        next.push(msg(PEER));
        next.push(msg(ME));

        assert_eq!(unread_delta(&prev, &next, ME), 1);
        assert_eq!(unread_delta(&next, &next, ME), 0);
        assert_eq!(unread_delta(&[], &next, ME), 2);
    }

    #[test]
    fn record_skips_active_room_and_own_messages() {
        let a = room();
        let b = room();
        let mut state = UnreadState::new();

        assert!(state.record(b, PEER, Some(a), ME));
        assert!(state.record(b, PEER, Some(a), ME));
        assert!(!state.record(a, PEER, Some(a), ME)); // active room
        assert!(!state.record(b, ME, Some(a), ME)); // own message

        assert_eq!(state.count(b), 2);
        assert_eq!(state.count(a), 0);
        assert_eq!(state.total(), 2);
    }

    #[test]
    fn viewing_resets_to_zero() {
        let a = room();
        let b = room();
        let mut state = UnreadState::new();

        state.record(b, PEER, Some(a), ME);
        assert_eq!(state.count(b), 1);

        state.mark_viewed(b);
        assert_eq!(state.count(b), 0);
        assert!(state.counts().is_empty());

        // messages arriving while b is viewed do not count
        assert!(!state.record(b, PEER, Some(b), ME));
        assert_eq!(state.count(b), 0);
    }

    #[test]
    fn snapshot_fold_attributes_to_the_right_room() {
        let a = room();
        let b = room();
        let mut state = UnreadState::new();

        let prev = vec![msg(PEER)];
        let mut next = prev.clone();
        next.push(msg(PEER));

        assert_eq!(state.apply_snapshot(b, &prev, &next, Some(a), ME), 1);
        assert_eq!(state.apply_snapshot(a, &prev, &next, Some(a), ME), 0);
        assert_eq!(state.count(b), 1);

        let counts = state.counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].room, b);
        assert_eq!(counts[0].count, 1);
    }
}
