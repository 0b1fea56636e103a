use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument, Span};

use pushup_domain::chat::{ChatMember, ChatTransport, ChatUpdate, IncomingMessage};
use pushup_domain::inference::CommentContext;
use pushup_domain::report::AccrualEngine;
use pushup_domain::store::StateStore;
use pushup_domain::user::UserRecord;
use pushup_domain::{ChatId, DomainError};
use pushup_infrastructure::logging;

use super::clock::Clock;
use super::commentator::Commentator;
use super::replies::{self, AdminSummary};
use super::state::{BotState, SharedState};
use crate::application::commands::BotCommand;

/// Handles inbound chat events one at a time
pub struct BotService {
    state: SharedState,
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn StateStore>,
    commentator: Commentator,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl BotService {
    pub fn new(
        state: SharedState,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn StateStore>,
        commentator: Commentator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            transport,
            store,
            commentator,
            clock,
            span: logging::component("bot"),
        }
    }

    pub async fn handle_update(&self, update: ChatUpdate) {
        let result = match update {
            ChatUpdate::Message(message) => {
                self.handle_message(message)
                    .instrument(self.span.clone())
                    .await
            }
            ChatUpdate::MembersJoined { chat_id, members } => {
                self.handle_members_joined(chat_id, &members)
                    .instrument(self.span.clone())
                    .await;
                Ok(())
            }
        };

        if let Err(e) = result {
            error!(
                parent: &self.span,
                code = e.code().code(),
                error = %e,
                "Failed to handle update"
            );
        }
    }

    async fn handle_message(&self, message: IncomingMessage) -> Result<(), DomainError> {
        if message.text.trim().is_empty() {
            debug!("Empty message ignored");
            return Ok(());
        }

        let Some(command) = BotCommand::parse(&message.text) else {
            return self.handle_report(&message).await;
        };

        debug!(
            command = command.name(),
            user_id = message.from.id.value(),
            "Dispatching command"
        );

        match command {
            BotCommand::Start => self.reply(message.chat_id, &replies::start()).await,
            BotCommand::Help => self.reply(message.chat_id, &replies::help()).await,
            BotCommand::MyStats => self.handle_my_stats(&message).await?,
            BotCommand::Stats => self.handle_stats(&message).await?,
            BotCommand::ChangeMyDailyStats(target) => {
                self.handle_change_stats(&message, target).await
            }
            BotCommand::SetGroup => self.handle_set_group(&message).await,
            BotCommand::Config => self.handle_config(&message).await,
            BotCommand::AdminStats => self.handle_admin_stats(&message).await,
        }
        Ok(())
    }

    /// Report pipeline: refresh identity, extract, accrue, persist, acknowledge
    async fn handle_report(&self, message: &IncomingMessage) -> Result<(), DomainError> {
        let now = self.clock.now();
        let today = now.date();
        let user_id = message.from.id;
        let name = message.from.display_name().to_string();

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // identity and activity refresh happens for every message, reportable or not
        if let Some(user) = state.roster.get_mut(user_id) {
            user.touch(name.clone(), now);
        }

        let extraction = state.extractor.extract(message.text.trim()).await;
        if !extraction.is_report() {
            debug!(user_id = user_id.value(), "No pushup count in message");
            return Ok(());
        }

        let mut user = state
            .roster
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserRecord::new(name.clone(), now));
        let kind = AccrualEngine::apply(&mut user, extraction, today);

        info!(
            user_id = user_id.value(),
            count = extraction.count,
            is_total = extraction.is_total,
            accrual = ?kind,
            pushups_today = user.pushups_today(),
            total_pushups = user.total_pushups(),
            "Report accepted"
        );

        let pushups_today = user.pushups_today();
        state.roster.upsert(user_id, user);
        self.persist(state);

        let group_today = state.roster.total_today(today);
        drop(guard);

        let comment = self.commentator.report_comment(&name, pushups_today).await;

        self.reply(
            message.chat_id,
            &replies::report_accepted(&name, pushups_today, group_today, &comment),
        )
        .await;
        Ok(())
    }

    async fn handle_my_stats(&self, message: &IncomingMessage) -> Result<(), DomainError> {
        let today = self.clock.today();
        let state = self.state.lock().await;

        let Some(user) = state.roster.get(message.from.id) else {
            drop(state);
            self.reply(message.chat_id, &replies::no_stats()).await;
            return Ok(());
        };

        let day = state.config.challenge()?.day_info(today);
        let comment = if self.commentator.is_enabled() {
            let prompt =
                replies::personal_comment_prompt(user.username(), user.total_pushups(), day);
            self.commentator.comment(&prompt, CommentContext::Personal).await
        } else {
            None
        };

        let text = replies::my_stats(user, day, comment.as_deref());
        drop(state);
        self.reply(message.chat_id, &text).await;
        Ok(())
    }

    async fn handle_stats(&self, message: &IncomingMessage) -> Result<(), DomainError> {
        let today = self.clock.today();
        let state = self.state.lock().await;

        let day = state.config.challenge()?.day_info(today);
        let total_today = state.roster.total_today(today);
        let ranking = state.roster.ranking_today(today);

        let comment = if self.commentator.is_enabled() && !ranking.is_empty() {
            let prompt = replies::daily_stats_comment_prompt(total_today, ranking.len());
            self.commentator.comment(&prompt, CommentContext::DailyStats).await
        } else {
            None
        };

        let text = replies::group_stats(
            total_today,
            state.roster.total_all_time(),
            day,
            &ranking,
            comment.as_deref(),
        );
        drop(state);
        self.reply(message.chat_id, &text).await;
        Ok(())
    }

    async fn handle_change_stats(&self, message: &IncomingMessage, target: Option<u32>) {
        let Some(target) = target else {
            self.reply(message.chat_id, &replies::change_usage()).await;
            return;
        };

        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(user) = state.roster.get_mut(message.from.id) else {
            drop(guard);
            self.reply(message.chat_id, &replies::no_stats()).await;
            return;
        };

        let old = user.pushups_today();
        AccrualEngine::apply_override(user, target, now.date());
        user.touch(message.from.display_name(), now);

        info!(
            user_id = message.from.id.value(),
            old,
            new = target,
            total_pushups = user.total_pushups(),
            "Daily count overridden"
        );

        self.persist(state);
        drop(guard);
        self.reply(message.chat_id, &replies::changed(old, target)).await;
    }

    async fn handle_set_group(&self, message: &IncomingMessage) {
        if !message.chat_kind.is_group() {
            self.reply(message.chat_id, &replies::groups_only()).await;
            return;
        }

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.config.chat_id = Some(message.chat_id);
            self.persist(state);
        }

        info!(chat_id = message.chat_id.value(), "Main group configured");
        self.reply(message.chat_id, &replies::group_set(message.chat_id))
            .await;
    }

    async fn handle_config(&self, message: &IncomingMessage) {
        let text = {
            let state = self.state.lock().await;
            replies::config(&state.config)
        };
        self.reply(message.chat_id, &text).await;
    }

    async fn handle_admin_stats(&self, message: &IncomingMessage) {
        match self
            .transport
            .member_role(message.chat_id, message.from.id)
            .await
        {
            Ok(role) if role.is_admin() => {}
            Ok(_) => {
                self.reply(message.chat_id, &replies::admins_only()).await;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Admin check failed");
                self.reply(message.chat_id, &replies::admin_unverifiable())
                    .await;
                return;
            }
        }

        let now = self.clock.now();
        let text = {
            let state = self.state.lock().await;
            let summary = AdminSummary {
                total_users: state.roster.len(),
                active_today: state.roster.active_today(now.date()).len(),
                inactive: state
                    .roster
                    .inactive_for_days(state.config.inactivity_days, now)
                    .len(),
                inactivity_days: state.config.inactivity_days,
                never_reported: state.roster.never_reported(),
                top_total: state.roster.ranking_all_time(),
            };
            replies::admin_stats(&summary)
        };
        self.reply(message.chat_id, &text).await;
    }

    async fn handle_members_joined(&self, chat_id: ChatId, members: &[ChatMember]) {
        for member in members.iter().filter(|m| !m.is_bot) {
            let name = member
                .username
                .clone()
                .unwrap_or_else(|| member.full_name());
            info!(user_id = member.id.value(), "New member joined");
            self.reply(chat_id, &replies::welcome(&name)).await;
        }
    }

    fn persist(&self, state: &BotState) {
        if let Err(e) = self.store.save(&state.config, &state.roster) {
            error!(error = %e.format_with_code(), "Failed to persist state");
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.transport.send_message(chat_id, text).await {
            error!(chat_id = chat_id.value(), error = %e, "Failed to send reply");
        }
    }
}
