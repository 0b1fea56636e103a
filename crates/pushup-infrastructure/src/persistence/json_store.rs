use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use pushup_domain::config::BotConfig;
use pushup_domain::store::{StateStore, StoredState};
use pushup_domain::user::{UserRecord, UserRoster};
use pushup_domain::{DomainError, UserId};

use crate::utils::ResultExt;

/// On-disk layout, borrowed for writing
#[derive(Serialize)]
struct StoreFileRef<'a> {
    config: &'a BotConfig,
    user_data: &'a IndexMap<UserId, UserRecord>,
}

#[derive(Deserialize)]
struct StoreFile {
    config: BotConfig,
    #[serde(default)]
    user_data: IndexMap<UserId, UserRecord>,
}

/// Single JSON document holding config and every user record
pub struct JsonFileStore {
    path: PathBuf,
    defaults: BotConfig,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, defaults: BotConfig) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the default snapshot when no file exists yet. Returns whether it wrote.
    pub fn ensure_initialized(&self) -> Result<bool, DomainError> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&self.defaults, &UserRoster::default())?;
        info!(path = %self.path.display(), "Created data file with default configuration");
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<StoredState, DomainError> {
        let raw = fs::read_to_string(&self.path).to_infra_err()?;
        let file: StoreFile = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Deserialization(e.to_string()))?;

        let config = match file.config.validate() {
            Ok(()) => file.config,
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored configuration is invalid, using defaults"
                );
                self.defaults.clone()
            }
        };

        Ok(StoredState {
            config,
            users: file.user_data,
        })
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> StoredState {
        if !self.exists() {
            warn!(path = %self.path.display(), "Data file not found, using defaults");
            return StoredState::empty(self.defaults.clone());
        }

        match self.read() {
            Ok(state) => {
                debug!(
                    path = %self.path.display(),
                    users = state.users.len(),
                    "Loaded data file"
                );
                state
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e.format_with_code(),
                    "Failed to load data file, using defaults"
                );
                StoredState::empty(self.defaults.clone())
            }
        }
    }

    fn save(&self, config: &BotConfig, users: &UserRoster) -> Result<(), DomainError> {
        let snapshot = StoreFileRef {
            config,
            user_data: users.records(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| DomainError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).to_infra_err()?;
        }

        // write next to the target, then swap it in
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).to_infra_err()?;
            file.write_all(json.as_bytes()).to_infra_err()?;
            file.sync_all().to_infra_err()?;
        }
        fs::rename(&temp_path, &self.path).to_infra_err()?;

        debug!(path = %self.path.display(), users = users.len(), "Saved data file");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pushup_domain::config::ReminderTime;
    use pushup_domain::ChatId;
    use tempfile::TempDir;

    fn defaults() -> BotConfig {
        BotConfig::new(
            "22:00".parse::<ReminderTime>().unwrap(),
            4,
            2,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
        )
        .unwrap()
    }

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("data.json"), defaults())
    }

    fn record(name: &str, total: u32) -> UserRecord {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        UserRecord::restore(
            name.to_string(),
            Some(date.and_hms_opt(10, 15, 0).unwrap()),
            20,
            Some(date),
            total,
        )
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let state = store.load();

        assert!(!store.exists());
        assert_eq!(state.config, defaults());
        assert!(state.users.is_empty());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        let state = store.load();

        assert_eq!(state.config, defaults());
        assert!(state.users.is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order_and_config() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut config = defaults();
        config.chat_id = Some(ChatId::new(-100123));
        let mut roster = UserRoster::default();
        roster.upsert(UserId::new(42), record("zed", 100));
        roster.upsert(UserId::new(7), record("amy", 300));

        store.save(&config, &roster).unwrap();
        let state = store.load();

        assert_eq!(state.config.chat_id, Some(ChatId::new(-100123)));
        let ids: Vec<i64> = state.users.keys().map(|id| id.value()).collect();
        assert_eq!(ids, vec![42, 7]);
        assert_eq!(state.users[&UserId::new(7)].total_pushups(), 300);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_file_layout_uses_string_ids_and_iso_dates() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut roster = UserRoster::default();
        roster.upsert(UserId::new(42), record("zed", 100));

        store.save(&defaults(), &roster).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["config"]["reminder_time"], "22:00");
        assert_eq!(raw["config"]["challenge_start_date"], "2025-03-15");
        assert_eq!(raw["user_data"]["42"]["username"], "zed");
        assert_eq!(raw["user_data"]["42"]["last_report_date"], "2025-04-01");
        assert_eq!(raw["user_data"]["42"]["last_activity"], "2025-04-01T10:15:00");
    }

    #[test]
    fn test_invalid_stored_config_keeps_users() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let raw = serde_json::json!({
            "config": {
                "chat_id": null,
                "inactivity_days": 2,
                "reminder_time": "21:00",
                "warning_days": 3,
                "challenge_start_date": "2025-03-15",
                "challenge_end_date": "2025-06-13"
            },
            "user_data": {
                "5": { "username": "legacy", "total_pushups": 12 }
            }
        });
        fs::write(store.path(), raw.to_string()).unwrap();

        let state = store.load();

        assert_eq!(state.config, defaults());
        assert_eq!(state.users[&UserId::new(5)].username(), "legacy");
        assert_eq!(state.users[&UserId::new(5)].total_pushups(), 12);
    }

    #[test]
    fn test_ensure_initialized_writes_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.ensure_initialized().unwrap());
        assert!(store.exists());
        assert!(!store.ensure_initialized().unwrap());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/state/data.json"), defaults());

        store.save(&defaults(), &UserRoster::default()).unwrap();

        assert!(store.exists());
    }
}
