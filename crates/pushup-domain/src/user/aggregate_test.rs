#[cfg(test)]
mod tests {
    use super::super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_user_starts_empty() {
        let now = at(2025, 4, 1, 10);
        let user = UserRecord::new("alice", now);

        assert_eq!(user.username(), "alice");
        assert_eq!(user.last_activity(), Some(now));
        assert_eq!(user.pushups_today(), 0);
        assert_eq!(user.total_pushups(), 0);
        assert!(user.last_report_date().is_none());
        assert!(!user.has_reported_on(now.date()));
    }

    #[test]
    fn test_yesterdays_report_does_not_count_today() {
        let yesterday = at(2025, 4, 1, 10);
        let user = UserRecord::restore(
            "alice".to_string(),
            Some(yesterday),
            40,
            Some(yesterday.date()),
            40,
        );

        assert!(user.has_reported_on(yesterday.date()));
        assert!(!user.has_reported_on(yesterday.date() + Duration::days(1)));
    }

    #[test]
    fn test_touch_refreshes_identity() {
        let mut user = UserRecord::new("alice", at(2025, 4, 1, 10));
        let later = at(2025, 4, 2, 9);

        user.touch("alice_new", later);

        assert_eq!(user.username(), "alice_new");
        assert_eq!(user.last_activity(), Some(later));
    }

    #[test]
    fn test_activity_status_without_activity_is_inactive() {
        let user = UserRecord::restore("ghost".to_string(), None, 0, None, 0);
        assert_eq!(
            user.activity_status(at(2025, 4, 1, 10), 4, 2),
            ActivityStatus::Inactive
        );
    }

    #[test]
    fn test_activity_status_active() {
        let now = at(2025, 4, 10, 12);
        let user = UserRecord::new("alice", now - Duration::hours(30));
        assert_eq!(user.activity_status(now, 4, 2), ActivityStatus::Active);
    }

    #[test]
    fn test_activity_status_warning_boundary_is_inclusive() {
        let now = at(2025, 4, 10, 12);
        let user = UserRecord::new("alice", now - Duration::days(2));
        assert_eq!(user.activity_status(now, 4, 2), ActivityStatus::Warning);
    }

    #[test]
    fn test_activity_status_inactive_boundary_is_inclusive() {
        let now = at(2025, 4, 10, 12);
        let user = UserRecord::new("alice", now - Duration::days(4));
        assert_eq!(user.activity_status(now, 4, 2), ActivityStatus::Inactive);
    }

    #[test]
    fn test_partial_days_are_truncated() {
        let now = at(2025, 4, 10, 12);
        let user = UserRecord::new("alice", now - Duration::hours(95));
        // 3 days 23 hours is still only three whole days
        assert_eq!(user.activity_status(now, 4, 2), ActivityStatus::Warning);
    }

    #[test]
    fn test_deserializes_legacy_record_with_missing_fields() {
        let json = serde_json::json!({
            "username": "bob",
            "last_activity": "2025-03-20T21:15:03.123456",
            "last_report_date": "2025-03-20"
        });

        let user: UserRecord = serde_json::from_value(json).unwrap();

        assert_eq!(user.username(), "bob");
        assert_eq!(user.pushups_today(), 0);
        assert_eq!(
            user.last_report_date(),
            NaiveDate::from_ymd_opt(2025, 3, 20)
        );
        assert!(user.last_activity().is_some());
    }
}
