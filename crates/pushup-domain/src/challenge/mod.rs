use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Fixed start/end date range over which standings are tracked.
///
/// Both ends are inclusive. The window always satisfies `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeWindow {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// Position of a date inside the challenge window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayInfo {
    pub day_number: u32,
    pub days_remaining: u32,
}

impl ChallengeWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, DomainError> {
        if start_date >= end_date {
            return Err(DomainError::Validation(format!(
                "Challenge start date {start_date} must be before end date {end_date}"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Number of days between start and end
    pub fn total_days(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32
    }

    /// Day number (1-based) and days remaining for `today`.
    ///
    /// Before the start the day number is 0 and the whole window remains.
    /// Past the end the day number is clamped to `total_days` and nothing remains.
    pub fn day_info(&self, today: NaiveDate) -> DayInfo {
        let total = self.total_days();

        if today < self.start_date {
            return DayInfo {
                day_number: 0,
                days_remaining: total,
            };
        }

        let offset = (today - self.start_date).num_days() as u32;
        let day_number = (offset + 1).min(total);

        DayInfo {
            day_number,
            days_remaining: total - day_number,
        }
    }
}
