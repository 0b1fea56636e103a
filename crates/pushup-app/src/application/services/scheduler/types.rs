use chrono::{DateTime, Utc};
use std::fmt;

use pushup_domain::config::ReminderTime;

/// Daily jobs, one tokio task each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    DailyReminder,
    InactivityWarning,
    InactivityRemoval,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [
        JobKind::DailyReminder,
        JobKind::InactivityWarning,
        JobKind::InactivityRemoval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::DailyReminder => "daily_reminder",
            JobKind::InactivityWarning => "inactivity_warning",
            JobKind::InactivityRemoval => "inactivity_removal",
        }
    }

    /// Local wall-clock `(hour, minute)`; only the reminder follows configuration
    pub fn fire_time(&self, reminder_time: ReminderTime) -> (u8, u8) {
        match self {
            JobKind::DailyReminder => (reminder_time.hour(), reminder_time.minute()),
            JobKind::InactivityWarning => (20, 0),
            JobKind::InactivityRemoval => (23, 59),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task metadata for health monitoring
#[derive(Debug, Clone)]
pub(super) struct TaskMetadata {
    pub hour: u8,
    pub minute: u8,
    pub last_execution: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_times() {
        let reminder: ReminderTime = "21:30".parse().unwrap();
        assert_eq!(JobKind::DailyReminder.fire_time(reminder), (21, 30));
        assert_eq!(JobKind::InactivityWarning.fire_time(reminder), (20, 0));
        assert_eq!(JobKind::InactivityRemoval.fire_time(reminder), (23, 59));
    }
}
