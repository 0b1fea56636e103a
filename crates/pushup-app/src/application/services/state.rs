use std::sync::Arc;
use tokio::sync::Mutex;

use pushup_domain::config::BotConfig;
use pushup_domain::report::CountExtractor;
use pushup_domain::user::UserRoster;

/// Everything message handling and scheduled jobs mutate
pub struct BotState {
    pub config: BotConfig,
    pub roster: UserRoster,
    pub extractor: CountExtractor,
}

impl BotState {
    pub fn new(config: BotConfig, roster: UserRoster, extractor: CountExtractor) -> Self {
        Self {
            config,
            roster,
            extractor,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

/// One lock for all state: holders run to completion before anyone else
pub type SharedState = Arc<Mutex<BotState>>;
