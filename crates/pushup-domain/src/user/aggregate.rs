use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::value_objects::ActivityStatus;

/// Per-member challenge record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) last_activity: Option<NaiveDateTime>,
    #[serde(default)]
    pub(crate) pushups_today: u32,
    /// Legacy persisted flag, written for data-file compatibility and never read.
    /// Whether a user reported on a given day is `has_reported_on(day)`.
    #[serde(default)]
    pub(crate) reported_today: bool,
    #[serde(default)]
    pub(crate) last_report_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) total_pushups: u32,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            username: username.into(),
            last_activity: Some(now),
            pushups_today: 0,
            reported_today: false,
            last_report_date: None,
            total_pushups: 0,
        }
    }

    pub fn restore(
        username: String,
        last_activity: Option<NaiveDateTime>,
        pushups_today: u32,
        last_report_date: Option<NaiveDate>,
        total_pushups: u32,
    ) -> Self {
        Self {
            username,
            last_activity,
            pushups_today,
            reported_today: last_report_date.is_some(),
            last_report_date,
            total_pushups,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn last_activity(&self) -> Option<NaiveDateTime> {
        self.last_activity
    }

    pub fn pushups_today(&self) -> u32 {
        self.pushups_today
    }

    pub fn last_report_date(&self) -> Option<NaiveDate> {
        self.last_report_date
    }

    pub fn total_pushups(&self) -> u32 {
        self.total_pushups
    }

    pub fn has_reported_on(&self, date: NaiveDate) -> bool {
        self.last_report_date == Some(date)
    }

    /// Refresh display name and activity timestamp. Runs for every message, reportable or not.
    pub fn touch(&mut self, username: impl Into<String>, now: NaiveDateTime) {
        self.username = username.into();
        self.last_activity = Some(now);
    }

    /// Classify by whole days elapsed since the last message of any kind.
    ///
    /// Both thresholds are inclusive: reaching `inactivity_days` means inactive.
    pub fn activity_status(
        &self,
        now: NaiveDateTime,
        inactivity_days: u32,
        warning_days: u32,
    ) -> ActivityStatus {
        let Some(last_activity) = self.last_activity else {
            return ActivityStatus::Inactive;
        };

        let idle_days = now.signed_duration_since(last_activity).num_days();

        if idle_days >= i64::from(inactivity_days) {
            ActivityStatus::Inactive
        } else if idle_days >= i64::from(warning_days) {
            ActivityStatus::Warning
        } else {
            ActivityStatus::Active
        }
    }
}
