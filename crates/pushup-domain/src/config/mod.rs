use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::challenge::ChallengeWindow;
use crate::shared::{ChatId, DomainError};

/// Daily wall-clock time in `HH:MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, DomainError> {
        if hour > 23 {
            return Err(DomainError::Validation(
                "Hour must be between 0 and 23".to_string(),
            ));
        }
        if minute > 59 {
            return Err(DomainError::Validation(
                "Minute must be between 0 and 59".to_string(),
            ));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for ReminderTime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::Validation(format!("Invalid reminder_time '{s}' (HH:MM)"));

        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hours.parse::<u8>().map_err(|_| invalid())?;
        let minute = minutes.parse::<u8>().map_err(|_| invalid())?;

        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderTime> for String {
    fn from(value: ReminderTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Bot configuration persisted next to the user records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    pub inactivity_days: u32,
    pub reminder_time: ReminderTime,
    pub warning_days: u32,
    pub challenge_start_date: NaiveDate,
    pub challenge_end_date: NaiveDate,
}

impl BotConfig {
    pub const DEFAULT_INACTIVITY_DAYS: u32 = 4;
    pub const DEFAULT_WARNING_DAYS: u32 = 2;

    pub fn new(
        reminder_time: ReminderTime,
        inactivity_days: u32,
        warning_days: u32,
        challenge_start_date: NaiveDate,
        challenge_end_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        let config = Self {
            chat_id: None,
            inactivity_days,
            reminder_time,
            warning_days,
            challenge_start_date,
            challenge_end_date,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants. Field-level formats are enforced by their types.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.warning_days >= self.inactivity_days {
            return Err(DomainError::Validation(format!(
                "warning_days ({}) must be less than inactivity_days ({})",
                self.warning_days, self.inactivity_days
            )));
        }
        self.challenge().map(|_| ())
    }

    pub fn challenge(&self) -> Result<ChallengeWindow, DomainError> {
        ChallengeWindow::new(self.challenge_start_date, self.challenge_end_date)
    }

    /// Days a warned user has left before removal
    pub fn grace_days(&self) -> u32 {
        self.inactivity_days.saturating_sub(self.warning_days)
    }
}
