use indexmap::IndexMap;

use crate::config::BotConfig;
use crate::shared::{DomainError, UserId};
use crate::user::{UserRecord, UserRoster};

/// Everything the bot persists: configuration plus all user records
#[derive(Debug, Clone)]
pub struct StoredState {
    pub config: BotConfig,
    pub users: IndexMap<UserId, UserRecord>,
}

impl StoredState {
    pub fn empty(config: BotConfig) -> Self {
        Self {
            config,
            users: IndexMap::new(),
        }
    }

    pub fn into_parts(self) -> (BotConfig, UserRoster) {
        (self.config, UserRoster::new(self.users))
    }
}

/// Snapshot persistence collaborator
///
/// `load` never fails: a missing or unreadable store yields defaults.
/// `save` overwrites the whole snapshot.
pub trait StateStore: Send + Sync {
    fn load(&self) -> StoredState;

    fn save(&self, config: &BotConfig, users: &UserRoster) -> Result<(), DomainError>;

    fn exists(&self) -> bool;
}
