use std::time::Duration;

/// Configuration for various timeout durations across the bot
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Upper bound for one inference call made while handling a message
    pub inference: Duration,

    /// HTTP request timeout for non-polling calls
    pub http_request: Duration,

    /// Server-side wait for `getUpdates`
    pub long_poll: Duration,

    /// Pause after a failed poll before trying again
    pub poll_backoff: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        GLOBAL_TIMEOUT_CONFIG.clone()
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global timeout configuration
    pub fn global() -> &'static Self {
        &GLOBAL_TIMEOUT_CONFIG
    }

    /// Client-side timeout for a long poll; leaves headroom over the server wait
    pub fn long_poll_request(&self) -> Duration {
        self.long_poll + Duration::from_secs(10)
    }
}

/// Global timeout configuration instance
static GLOBAL_TIMEOUT_CONFIG: TimeoutConfig = TimeoutConfig {
    inference: Duration::from_secs(8),
    http_request: Duration::from_secs(30),
    long_poll: Duration::from_secs(25),
    poll_backoff: Duration::from_secs(5),
};
