use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use pushup_domain::inference::{CommentContext, InferenceClient};

use super::replies;

/// Short motivational lines from the inference collaborator
pub struct Commentator {
    inference: Option<Arc<dyn InferenceClient>>,
    timeout: Duration,
}

impl Commentator {
    pub fn new(inference: Option<Arc<dyn InferenceClient>>, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    pub fn is_enabled(&self) -> bool {
        self.inference.is_some()
    }

    /// `None` when unconfigured, failed or timed out
    pub async fn comment(&self, prompt: &str, context: CommentContext) -> Option<String> {
        let client = self.inference.as_ref()?;

        match tokio::time::timeout(self.timeout, client.complete(prompt, context)).await {
            Ok(Ok(comment)) => {
                debug!(context = context.as_str(), "Generated comment");
                Some(comment)
            }
            Ok(Err(e)) => {
                warn!(context = context.as_str(), error = %e, "Comment generation failed");
                None
            }
            Err(_) => {
                warn!(context = context.as_str(), "Comment generation timed out");
                None
            }
        }
    }

    /// Reply line after an accepted report; always returns something
    pub async fn report_comment(&self, name: &str, pushups_today: u32) -> String {
        if !self.is_enabled() {
            return replies::DEFAULT_COMMENT.to_string();
        }
        let prompt = replies::report_comment_prompt(name, pushups_today);
        self.comment(&prompt, CommentContext::Report)
            .await
            .unwrap_or_else(|| replies::FAILED_COMMENT.to_string())
    }
}
