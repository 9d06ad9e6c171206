use chrono::Datelike;

use aidlink_types::models::{AidRequest, RequestStats, RequestStatus};

/// Reduce the full request set into dashboard counters plus the weekly
/// histogram. Recomputed on demand, never maintained incrementally.
/// Requests without a `requested_at` count toward the totals only.
pub fn compute(requests: &[AidRequest]) -> RequestStats {
    let mut stats = RequestStats::zero();

    for request in requests {
        stats.total += 1;
        match request.status {
            RequestStatus::Pending => stats.pending += 1,
            RequestStatus::Resolved => stats.resolved += 1,
            RequestStatus::Cancelled => stats.cancelled += 1,
        }

        if let Some(requested_at) = request.requested_at {
            // Monday-first: Mon = 0 .. Sun = 6
            let bucket = requested_at.weekday().num_days_from_monday() as usize;
            stats.weekly[bucket] += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidlink_types::models::{Category, Urgency};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn request(status: RequestStatus, requested_at: Option<chrono::DateTime<Utc>>) -> AidRequest {
        AidRequest {
            id: Uuid::new_v4(),
            title: "Need groceries".to_string(),
            description: "weekly shop".to_string(),
            category: Category::Groceries,
            urgency: Urgency::Low,
            requester_id: Uuid::new_v4(),
            requester_name: "Sam".to_string(),
            requester_email: "sam@example.com".to_string(),
            volunteer_email: None,
            status,
            requested_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn weekday_buckets_are_monday_first() {
        // 2025-03-12 is a Wednesday, 2025-03-16 a Sunday
        let wednesday = Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2025, 3, 16, 10, 0, 0).unwrap();

        let stats = compute(&[
            request(RequestStatus::Pending, Some(wednesday)),
            request(RequestStatus::Pending, Some(sunday)),
        ]);

        assert_eq!(stats.weekly, [0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn totals_follow_status() {
        let stats = compute(&[
            request(RequestStatus::Pending, None),
            request(RequestStatus::Pending, None),
            request(RequestStatus::Resolved, None),
            request(RequestStatus::Cancelled, None),
        ]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.weekly, [0; 7]);
    }

    #[test]
    fn empty_set_is_all_zero() {
        assert_eq!(compute(&[]), RequestStats::zero());
    }
}
