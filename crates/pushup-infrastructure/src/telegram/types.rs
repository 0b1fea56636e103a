use serde::{Deserialize, Serialize};

use pushup_domain::chat::{ChatKind, ChatMember, ChatUpdate, IncomingMessage, MemberRole};
use pushup_domain::{ChatId, UserId};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatMemberUpdated {
    pub chat: Chat,
    pub old_chat_member: ChatMemberInfo,
    pub new_chat_member: ChatMemberInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatMemberInfo {
    pub status: MemberRole,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemberRequest {
    pub chat_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_if_banned: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: [&'static str; 2],
}

impl From<User> for ChatMember {
    fn from(user: User) -> Self {
        ChatMember {
            id: UserId::new(user.id),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_bot: user.is_bot,
        }
    }
}

impl Update {
    /// Domain view of this update, if it is one the bot reacts to.
    /// Joins come only from `chat_member`; the `new_chat_members` service
    /// message for the same join carries no text and is skipped.
    pub fn into_chat_update(self) -> Option<ChatUpdate> {
        if let Some(message) = self.message {
            return message.into_chat_update();
        }

        let change = self.chat_member?;
        let was_outside = matches!(
            change.old_chat_member.status,
            MemberRole::Left | MemberRole::Kicked
        );
        if was_outside && change.new_chat_member.status == MemberRole::Member {
            return Some(ChatUpdate::MembersJoined {
                chat_id: ChatId::new(change.chat.id),
                members: vec![change.new_chat_member.user.into()],
            });
        }
        None
    }
}

impl Message {
    fn into_chat_update(self) -> Option<ChatUpdate> {
        let text = self.text?;
        let from = self.from?;
        Some(ChatUpdate::Message(IncomingMessage {
            chat_id: ChatId::new(self.chat.id),
            chat_kind: self.chat.kind,
            from: from.into(),
            text,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message() {
        let update = parse(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": { "id": 5, "is_bot": false, "first_name": "Ivan", "username": "ivan" },
                "chat": { "id": -100, "type": "supergroup", "title": "Pushups" },
                "date": 1743580800,
                "text": "сделал 30"
            }
        }));

        match update.into_chat_update() {
            Some(ChatUpdate::Message(message)) => {
                assert_eq!(message.chat_id, ChatId::new(-100));
                assert_eq!(message.chat_kind, ChatKind::Supergroup);
                assert_eq!(message.from.id, UserId::new(5));
                assert_eq!(message.from.display_name(), "ivan");
                assert_eq!(message.text, "сделал 30");
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    fn service_join(update_id: i64) -> serde_json::Value {
        json!({
            "update_id": update_id,
            "message": {
                "message_id": 2,
                "from": { "id": 8, "is_bot": false, "first_name": "Petr" },
                "chat": { "id": -100, "type": "supergroup" },
                "new_chat_members": [
                    { "id": 8, "is_bot": false, "first_name": "Petr" }
                ]
            }
        })
    }

    fn member_join(update_id: i64) -> serde_json::Value {
        json!({
            "update_id": update_id,
            "chat_member": {
                "chat": { "id": -100, "type": "supergroup" },
                "from": { "id": 8, "is_bot": false, "first_name": "Petr" },
                "date": 1743580800,
                "old_chat_member": { "status": "left", "user": { "id": 8, "is_bot": false, "first_name": "Petr" } },
                "new_chat_member": { "status": "member", "user": { "id": 8, "is_bot": false, "first_name": "Petr" } }
            }
        })
    }

    #[test]
    fn test_new_chat_members_service_message_is_skipped() {
        assert!(parse(service_join(11)).into_chat_update().is_none());
    }

    #[test]
    fn test_single_join_yields_one_event() {
        let joins: Vec<ChatUpdate> = [service_join(11), member_join(12)]
            .into_iter()
            .filter_map(|value| parse(value).into_chat_update())
            .collect();

        assert_eq!(joins.len(), 1);
        assert!(matches!(
            &joins[0],
            ChatUpdate::MembersJoined { chat_id, members }
                if *chat_id == ChatId::new(-100) && members[0].id == UserId::new(8)
        ));
    }

    #[test]
    fn test_chat_member_join() {
        assert!(matches!(
            parse(member_join(12)).into_chat_update(),
            Some(ChatUpdate::MembersJoined { members, .. }) if members[0].id == UserId::new(8)
        ));
    }

    #[test]
    fn test_promotion_is_not_a_join() {
        let update = parse(json!({
            "update_id": 13,
            "chat_member": {
                "chat": { "id": -100, "type": "supergroup" },
                "old_chat_member": { "status": "member", "user": { "id": 8, "first_name": "Petr" } },
                "new_chat_member": { "status": "administrator", "user": { "id": 8, "first_name": "Petr" } }
            }
        }));

        assert!(update.into_chat_update().is_none());
    }

    #[test]
    fn test_non_text_message_is_skipped() {
        let update = parse(json!({
            "update_id": 14,
            "message": {
                "message_id": 3,
                "from": { "id": 5, "first_name": "Ivan" },
                "chat": { "id": 5, "type": "private" }
            }
        }));

        assert!(update.into_chat_update().is_none());
    }
}
