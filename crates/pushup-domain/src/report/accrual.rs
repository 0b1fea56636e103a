use chrono::NaiveDate;

use super::value_objects::ExtractionResult;
use crate::user::UserRecord;

/// How an accepted report changed a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualKind {
    /// First report of the day; the count replaces yesterday's value
    FirstOfDay,
    /// Same-day addition
    Added,
    /// Same-day correction of the whole-day total
    Corrected,
}

/// Merges extracted counts into a user's day and lifetime counters.
///
/// Within one accrual `total_pushups` moves by the same amount as `pushups_today`,
/// except that a downward correction never takes the lifetime total below zero.
pub struct AccrualEngine;

impl AccrualEngine {
    pub fn apply(
        user: &mut UserRecord,
        extraction: ExtractionResult,
        report_date: NaiveDate,
    ) -> AccrualKind {
        let kind = if !user.has_reported_on(report_date) {
            user.pushups_today = extraction.count;
            user.total_pushups = user.total_pushups.saturating_add(extraction.count);
            AccrualKind::FirstOfDay
        } else if extraction.is_total {
            Self::correct_total(user, extraction.count);
            AccrualKind::Corrected
        } else {
            user.pushups_today = user.pushups_today.saturating_add(extraction.count);
            user.total_pushups = user.total_pushups.saturating_add(extraction.count);
            AccrualKind::Added
        };

        user.reported_today = true;
        user.last_report_date = Some(report_date);
        kind
    }

    /// Administrative correction: `target` becomes today's total.
    ///
    /// Always uses the correction rule, even when the stored day is stale.
    pub fn apply_override(user: &mut UserRecord, target: u32, today: NaiveDate) {
        Self::correct_total(user, target);
        user.reported_today = true;
        user.last_report_date = Some(today);
    }

    fn correct_total(user: &mut UserRecord, target: u32) {
        let previous = user.pushups_today;
        user.total_pushups = if target >= previous {
            user.total_pushups.saturating_add(target - previous)
        } else {
            user.total_pushups.saturating_sub(previous - target)
        };
        user.pushups_today = target;
    }
}
