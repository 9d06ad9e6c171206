use chrono::{Days, NaiveDate};

use aidlink_types::events::MessageGroup;
use aidlink_types::models::ChatMessage;

/// Partition an ordered message list into date buckets, keyed "Today",
/// "Yesterday", or the calendar date. Input order is preserved within and
/// across buckets; `today` is the viewer's current date.
pub fn group_by_date(messages: &[ChatMessage], today: NaiveDate) -> Vec<MessageGroup> {
    let yesterday = today.checked_sub_days(Days::new(1));

    let mut groups: Vec<MessageGroup> = Vec::new();
    for msg in messages {
        let date = msg.timestamp.date_naive();
        let label = if date == today {
            "Today".to_string()
        } else if Some(date) == yesterday {
            "Yesterday".to_string()
        } else {
            date.format("%-m/%-d/%Y").to_string()
        };

        match groups.last_mut() {
            Some(group) if group.label == label => group.messages.push(msg.clone()),
            _ => groups.push(MessageGroup {
                label,
                messages: vec![msg.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn msg(ts: chrono::DateTime<Utc>, text: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            text: text.to_string(),
            sender_email: "sam@example.com".to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn buckets_today_yesterday_and_calendar_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let today = now.date_naive();

        let messages = vec![
            msg(now - Duration::days(2), "old one"),
            msg(now - Duration::days(1), "yesterday one"),
            msg(now - Duration::days(1) + Duration::hours(1), "yesterday two"),
            msg(now, "today one"),
        ];

        let groups = group_by_date(&messages, today);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["3/12/2025", "Yesterday", "Today"]);

        assert_eq!(groups[1].messages.len(), 2);
        assert_eq!(groups[1].messages[0].text, "yesterday one");
        assert_eq!(groups[1].messages[1].text, "yesterday two");
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let today = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap().date_naive();
        assert!(group_by_date(&[], today).is_empty());
    }

    #[test]
    fn order_within_bucket_matches_input() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let messages = vec![
            msg(now, "a"),
            msg(now + Duration::minutes(5), "b"),
            msg(now + Duration::minutes(9), "c"),
        ];
        let groups = group_by_date(&messages, now.date_naive());
        assert_eq!(groups.len(), 1);
        let texts: Vec<_> = groups[0].messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }
}
