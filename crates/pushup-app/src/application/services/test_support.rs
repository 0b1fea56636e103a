// Hand-written doubles shared by service and scheduler tests

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Mutex;

use pushup_domain::chat::{ChatKind, ChatMember, ChatTransport, IncomingMessage, MemberRole};
use pushup_domain::config::BotConfig;
use pushup_domain::inference::{CommentContext, InferenceClient};
use pushup_domain::report::CountExtractor;
use pushup_domain::store::{StateStore, StoredState};
use pushup_domain::user::{UserRecord, UserRoster};
use pushup_domain::{ChatId, DomainError, UserId};

use super::clock::Clock;
use super::state::{BotState, SharedState};

pub const GROUP: ChatId = ChatId::new(-100);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn config() -> BotConfig {
    BotConfig::new(
        "22:00".parse().unwrap(),
        4,
        2,
        date(2025, 3, 15),
        date(2025, 6, 13),
    )
    .unwrap()
}

pub fn state_with(users: Vec<(i64, UserRecord)>) -> SharedState {
    let mut roster = UserRoster::default();
    for (id, user) in users {
        roster.upsert(UserId::new(id), user);
    }
    BotState::new(config(), roster, CountExtractor::new(None)).into_shared()
}

pub fn member(id: i64, username: Option<&str>) -> ChatMember {
    ChatMember {
        id: UserId::new(id),
        username: username.map(str::to_string),
        first_name: "Иван".to_string(),
        last_name: Some("Петров".to_string()),
        is_bot: false,
    }
}

pub fn group_message(id: i64, username: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: GROUP,
        chat_kind: ChatKind::Supergroup,
        from: member(id, Some(username)),
        text: text.to_string(),
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Records outbound traffic; removals of ids in `failing_removals` fail
pub struct RecordingTransport {
    sent: tokio::sync::RwLock<Vec<(ChatId, String)>>,
    removed: tokio::sync::RwLock<Vec<UserId>>,
    role: Result<MemberRole, String>,
    failing_removals: Vec<UserId>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: tokio::sync::RwLock::new(Vec::new()),
            removed: tokio::sync::RwLock::new(Vec::new()),
            role: Ok(MemberRole::Member),
            failing_removals: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: MemberRole) -> Self {
        self.role = Ok(role);
        self
    }

    pub fn with_role_error(mut self, message: &str) -> Self {
        self.role = Err(message.to_string());
        self
    }

    pub fn with_failing_removal(mut self, user_id: i64) -> Self {
        self.failing_removals.push(UserId::new(user_id));
        self
    }

    pub async fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.read().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.sent.read().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn last_text(&self) -> Option<String> {
        self.sent.read().await.last().map(|(_, t)| t.clone())
    }

    pub async fn removed(&self) -> Vec<UserId> {
        self.removed.read().await.clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), DomainError> {
        self.sent.write().await.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn member_role(
        &self,
        _chat_id: ChatId,
        _user_id: UserId,
    ) -> Result<MemberRole, DomainError> {
        self.role
            .clone()
            .map_err(DomainError::PermissionDenied)
    }

    async fn remove_member(&self, _chat_id: ChatId, user_id: UserId) -> Result<(), DomainError> {
        if self.failing_removals.contains(&user_id) {
            return Err(DomainError::PermissionDenied("not enough rights".to_string()));
        }
        self.removed.write().await.push(user_id);
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory
pub struct MemoryStore {
    saved: Mutex<Option<StoredState>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            saved: Mutex::new(None),
            saves: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn last_saved(&self) -> Option<StoredState> {
        self.saved.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> StoredState {
        self.last_saved()
            .unwrap_or_else(|| StoredState::empty(config()))
    }

    fn save(&self, config: &BotConfig, users: &UserRoster) -> Result<(), DomainError> {
        *self.saved.lock().unwrap() = Some(StoredState {
            config: config.clone(),
            users: users.records().clone(),
        });
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.saved.lock().unwrap().is_some()
    }
}

/// Answers every completion with a fixed reply, or fails
pub struct StubInference {
    answer: Result<String, String>,
    calls: Mutex<Vec<CommentContext>>,
}

impl StubInference {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: Err("upstream unavailable".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<CommentContext> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for StubInference {
    async fn complete(
        &self,
        _prompt: &str,
        context: CommentContext,
    ) -> Result<String, DomainError> {
        self.calls.lock().unwrap().push(context);
        self.answer.clone().map_err(DomainError::Inference)
    }
}
