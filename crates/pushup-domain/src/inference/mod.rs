use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Role tag that selects the system prompt for a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentContext {
    Report,
    DailyStats,
    Personal,
}

impl CommentContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentContext::Report => "report",
            CommentContext::DailyStats => "daily_stats",
            CommentContext::Personal => "personal",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            CommentContext::Report => {
                "Ты строгий и немногословный тренер. Говори лаконично и мотивирующе."
            }
            CommentContext::DailyStats => {
                "Ты старший тренер. Подводишь итоги дня: строго, с уважением и юмором."
            }
            CommentContext::Personal => {
                "Ты опытный наставник. Мотивируешь человека продолжать путь. Будь философски краток."
            }
        }
    }
}

/// Natural-language inference collaborator
///
/// Answers are free-form text. No latency or determinism guarantees.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, prompt: &str, context: CommentContext)
        -> Result<String, DomainError>;
}
