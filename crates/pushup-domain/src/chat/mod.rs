use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::{ChatId, DomainError, UserId};

/// Kind of chat a message arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Message author as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

impl ChatMember {
    /// Handle used in replies: the username when set, the first name otherwise
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub from: ChatMember,
    pub text: String,
}

/// Inbound event delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    Message(IncomingMessage),
    MembersJoined {
        chat_id: ChatId,
        members: Vec<ChatMember>,
    },
}

/// Member role inside a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, MemberRole::Creator | MemberRole::Administrator)
    }
}

/// Outbound side of the chat platform
///
/// Text uses the lightweight markup subset: `<b>bold</b>` and `<code>literal</code>`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), DomainError>;

    /// Fails with `DomainError::PermissionDenied` when the bot may not inspect members
    async fn member_role(&self, chat_id: ChatId, user_id: UserId)
        -> Result<MemberRole, DomainError>;

    /// Remove a member without banning them permanently
    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> Result<(), DomainError>;
}
