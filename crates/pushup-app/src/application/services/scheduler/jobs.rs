use std::sync::Arc;
use tracing::{error, info, warn, Span};

use pushup_domain::chat::ChatTransport;
use pushup_domain::config::ReminderTime;
use pushup_domain::store::StateStore;
use pushup_domain::user::ActivityStatus;
use pushup_domain::{DomainError, UserId};
use pushup_infrastructure::logging;

use super::types::JobKind;
use crate::application::services::clock::Clock;
use crate::application::services::replies;
use crate::application::services::state::SharedState;

/// Bodies of the daily jobs. Each holds the state lock for its whole run.
pub struct JobRunner {
    state: SharedState,
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl JobRunner {
    pub fn new(
        state: SharedState,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            transport,
            store,
            clock,
            span: logging::component("scheduler"),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub async fn reminder_time(&self) -> ReminderTime {
        self.state.lock().await.config.reminder_time
    }

    pub async fn run(&self, kind: JobKind) {
        info!(job = %kind, "Running scheduled job");

        let result = match kind {
            JobKind::DailyReminder => self.send_reminder().await,
            JobKind::InactivityWarning => self.warn_inactive().await,
            JobKind::InactivityRemoval => self.remove_inactive().await,
        };

        match result {
            Ok(affected) => info!(job = %kind, affected, "Scheduled job finished"),
            Err(e) => error!(job = %kind, error = %e.format_with_code(), "Scheduled job failed"),
        }
    }

    /// Post the daily reminder; returns the number of messages sent
    pub async fn send_reminder(&self) -> Result<usize, DomainError> {
        let state = self.state.lock().await;
        let Some(chat_id) = state.config.chat_id else {
            warn!("chat_id is not set, reminder skipped");
            return Ok(0);
        };

        let today = self.clock.today();
        let day = state.config.challenge()?.day_info(today);

        self.transport
            .send_message(chat_id, &replies::reminder(day))
            .await?;

        info!(
            chat_id = chat_id.value(),
            pushups_today = state.roster.total_today(today),
            "Reminder sent"
        );
        Ok(1)
    }

    /// Mention every user in the warning tier; returns the number warned
    pub async fn warn_inactive(&self) -> Result<usize, DomainError> {
        let state = self.state.lock().await;
        let Some(chat_id) = state.config.chat_id else {
            warn!("chat_id is not set, inactivity warnings skipped");
            return Ok(0);
        };

        let config = &state.config;
        let warned = state.roster.with_status(
            ActivityStatus::Warning,
            self.clock.now(),
            config.inactivity_days,
            config.warning_days,
        );

        let mut sent = 0;
        for (user_id, user) in warned {
            let text = replies::inactivity_warning(
                user.username(),
                config.warning_days,
                config.grace_days(),
            );
            match self.transport.send_message(chat_id, &text).await {
                Ok(()) => {
                    info!(user_id = user_id.value(), "Inactivity warning sent");
                    sent += 1;
                }
                Err(e) => {
                    error!(user_id = user_id.value(), error = %e, "Failed to send inactivity warning")
                }
            }
        }
        Ok(sent)
    }

    /// Remove every inactive user from the chat and the roster; returns the number removed
    pub async fn remove_inactive(&self) -> Result<usize, DomainError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(chat_id) = state.config.chat_id else {
            warn!("chat_id is not set, inactive removal skipped");
            return Ok(0);
        };

        let inactive: Vec<(UserId, String)> = state
            .roster
            .with_status(
                ActivityStatus::Inactive,
                self.clock.now(),
                state.config.inactivity_days,
                state.config.warning_days,
            )
            .into_iter()
            .map(|(id, user)| (id, user.username().to_string()))
            .collect();

        let mut removed = 0;
        for (user_id, username) in inactive {
            if let Err(e) = self.transport.remove_member(chat_id, user_id).await {
                error!(user_id = user_id.value(), error = %e, "Failed to remove inactive user");
                continue;
            }

            state.roster.remove(user_id);
            removed += 1;
            info!(user_id = user_id.value(), "Removed for inactivity");

            if let Err(e) = self
                .transport
                .send_message(chat_id, &replies::removed_for_inactivity(&username))
                .await
            {
                error!(user_id = user_id.value(), error = %e, "Failed to announce removal");
            }
        }

        if removed > 0 {
            self.store.save(&state.config, &state.roster)?;
            info!(removed, "Saved after removing inactive users");
        }
        Ok(removed)
    }
}
