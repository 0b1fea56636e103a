use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use pushup_domain::config::{BotConfig, ReminderTime};

use crate::logging::{LogLevel, LogMode};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_DATA_PATH: &str = "data.json";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_REMINDER_TIME: &str = "22:00";
const DEFAULT_CHALLENGE_START: &str = "2025-03-15";
const DEFAULT_CHALLENGE_END: &str = "2025-06-13";

/// Process settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub data_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_level: LogLevel,
    pub reminder_time: ReminderTime,
    pub inactivity_days: u32,
    pub warning_days: u32,
    pub challenge_start: NaiveDate,
    pub challenge_end: NaiveDate,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let Some(telegram_token) = get("TELEGRAM_BOT_TOKEN") else {
            bail!("TELEGRAM_BOT_TOKEN is not set");
        };

        let settings = Self {
            telegram_token,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            data_path: PathBuf::from(get("DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())),
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
            log_mode: parse_or("LOG_MODE", get("LOG_MODE"), LogMode::default())?,
            log_level: parse_or("LOG_LEVEL", get("LOG_LEVEL"), LogLevel::default())?,
            reminder_time: parse_var(
                "DEFAULT_REMINDER_TIME",
                get("DEFAULT_REMINDER_TIME").as_deref().unwrap_or(DEFAULT_REMINDER_TIME),
            )?,
            inactivity_days: parse_or(
                "DEFAULT_INACTIVITY_DAYS",
                get("DEFAULT_INACTIVITY_DAYS"),
                BotConfig::DEFAULT_INACTIVITY_DAYS,
            )?,
            warning_days: parse_or(
                "DEFAULT_WARNING_DAYS",
                get("DEFAULT_WARNING_DAYS"),
                BotConfig::DEFAULT_WARNING_DAYS,
            )?,
            challenge_start: parse_var(
                "CHALLENGE_START",
                get("CHALLENGE_START").as_deref().unwrap_or(DEFAULT_CHALLENGE_START),
            )?,
            challenge_end: parse_var(
                "CHALLENGE_END",
                get("CHALLENGE_END").as_deref().unwrap_or(DEFAULT_CHALLENGE_END),
            )?,
        };

        Url::parse(&settings.openai_base_url).with_context(|| {
            format!("OPENAI_BASE_URL is not a valid URL: {}", settings.openai_base_url)
        })?;

        // fail fast on combinations the bot cannot run with
        settings.bot_config()?;
        Ok(settings)
    }

    /// Default bot configuration for a fresh store
    pub fn bot_config(&self) -> Result<BotConfig> {
        BotConfig::new(
            self.reminder_time,
            self.inactivity_days,
            self.warning_days,
            self.challenge_start,
            self.challenge_end,
        )
        .map_err(|e| anyhow::anyhow!(e.format_with_code()))
        .context("Invalid default bot configuration")
    }

    pub fn inference_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for {key} ({raw:?}): {e}"))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_var(key, &raw),
        None => Ok(default),
    }
}
