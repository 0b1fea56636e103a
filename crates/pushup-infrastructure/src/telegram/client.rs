use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;

use pushup_domain::chat::{ChatTransport, ChatUpdate, MemberRole};
use pushup_domain::{ChatId, DomainError, UserId};

use super::types::{
    ApiResponse, ChatMemberInfo, GetUpdatesRequest, MemberRequest, SendMessageRequest, Update,
};
use crate::config::TimeoutConfig;
use crate::utils::{preview, ResultExt};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Descriptions the Bot API uses when the bot lacks rights in a chat
const PERMISSION_MARKERS: [&str; 3] = ["forbidden", "not enough rights", "chat_admin_required"];

/// Methods with visible side effects. A timed-out attempt may already have
/// been applied server-side, so these are retried only when the connection
/// itself failed.
const NON_IDEMPOTENT_METHODS: [&str; 2] = ["sendMessage", "banChatMember"];

/// HTTP retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 2)
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds (default: 500ms)
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds (default: 5000ms)
    pub max_backoff_ms: u64,
    /// Backoff multiplier (default: 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Failure of one API call, split by whether repeating it may help
#[derive(Debug)]
enum CallError {
    Retryable(DomainError),
    Fatal(DomainError),
}

impl CallError {
    fn into_inner(self) -> DomainError {
        match self {
            CallError::Retryable(e) | CallError::Fatal(e) => e,
        }
    }
}

/// One batch of long-polled updates
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub updates: Vec<ChatUpdate>,
    /// Offset to pass to the next poll, if anything was received
    pub next_offset: Option<i64>,
}

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
    timeouts: TimeoutConfig,
    retry_config: RetryConfig,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, timeouts: TimeoutConfig) -> Result<Self, DomainError> {
        Self::with_base_url(DEFAULT_API_BASE, token, timeouts)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeouts: TimeoutConfig,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeouts.http_request)
            .build()
            .to_infra_err()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeouts,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Fetch pending updates, waiting server-side up to the long-poll timeout
    pub async fn poll_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, DomainError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.timeouts.long_poll.as_secs(),
            allowed_updates: ["message", "chat_member"],
        };

        let updates: Vec<Update> = self
            .call_once("getUpdates", &request, Some(self.timeouts.long_poll_request()))
            .await
            .map_err(CallError::into_inner)?;

        let next_offset = updates.iter().map(|u| u.update_id + 1).max();
        let updates = updates
            .into_iter()
            .filter_map(Update::into_chat_update)
            .collect();

        Ok(UpdateBatch {
            updates,
            next_offset,
        })
    }

    /// Execute a call, retrying transient failures with exponential backoff
    async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, DomainError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;

            match self.call_once(method, payload, None).await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempts", method, attempt);
                    }
                    return Ok(result);
                }
                Err(CallError::Retryable(e)) if attempt <= self.retry_config.max_retries => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                        method, attempt, self.retry_config.max_retries, e, backoff_ms
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = ((backoff_ms as f64 * self.retry_config.backoff_multiplier)
                        as u64)
                        .min(self.retry_config.max_backoff_ms);
                }
                Err(e) => return Err(e.into_inner()),
            }
        }
    }

    async fn call_once<P, T>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> Result<T, CallError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            let error = DomainError::Transport(format!("{method} request failed: {e}"));
            if send_failure_is_retryable(method, e.is_connect(), e.is_timeout() || e.is_request()) {
                CallError::Retryable(error)
            } else {
                CallError::Fatal(error)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CallError::Retryable(DomainError::Transport(format!(
                "{method} response unreadable: {e}"
            )))
        })?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                let error = DomainError::Transport(format!(
                    "{method} returned {status} with unexpected body ({e}): {}",
                    preview(&body, 200)
                ));
                return Err(if is_transient(status) {
                    CallError::Retryable(error)
                } else {
                    CallError::Fatal(error)
                });
            }
        };

        if parsed.ok {
            if let Some(result) = parsed.result {
                return Ok(result);
            }
            return Err(CallError::Fatal(DomainError::Transport(format!(
                "{method} returned ok without a result"
            ))));
        }

        let description = parsed.description.unwrap_or_default();
        let code = parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
        Err(classify_api_error(method, status, code, &description))
    }
}

/// A connect failure never reached the server; a timeout might have
fn send_failure_is_retryable(method: &str, connect: bool, timeout: bool) -> bool {
    connect || (timeout && !NON_IDEMPOTENT_METHODS.contains(&method))
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn classify_api_error(method: &str, status: StatusCode, code: i64, description: &str) -> CallError {
    let lower = description.to_lowercase();
    if code == 403 || PERMISSION_MARKERS.iter().any(|m| lower.contains(m)) {
        return CallError::Fatal(DomainError::PermissionDenied(format!(
            "{method}: {description}"
        )));
    }

    let error = DomainError::Transport(format!("{method} failed with {code}: {description}"));
    if is_transient(status) {
        CallError::Retryable(error)
    } else {
        CallError::Fatal(error)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), DomainError> {
        let request = SendMessageRequest {
            chat_id: chat_id.value(),
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<MemberRole, DomainError> {
        let request = MemberRequest {
            chat_id: chat_id.value(),
            user_id: user_id.value(),
            only_if_banned: None,
        };
        let member: ChatMemberInfo = self.call("getChatMember", &request).await?;
        Ok(member.status)
    }

    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), DomainError> {
        let ban = MemberRequest {
            chat_id: chat_id.value(),
            user_id: user_id.value(),
            only_if_banned: None,
        };
        let _: bool = self.call("banChatMember", &ban).await?;

        // lift the ban right away so the member may rejoin later
        let unban = MemberRequest {
            only_if_banned: Some(true),
            ..ban
        };
        let _: bool = self.call("unbanChatMember", &unban).await?;
        Ok(())
    }
}
