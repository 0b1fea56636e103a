use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use pushup_domain::chat::ChatTransport;
use pushup_domain::inference::InferenceClient;
use pushup_domain::report::CountExtractor;
use pushup_domain::store::StateStore;
use pushup_infrastructure::config::{Settings, TimeoutConfig};
use pushup_infrastructure::inference::OpenAiClient;
use pushup_infrastructure::persistence::JsonFileStore;
use pushup_infrastructure::telegram::TelegramClient;

use crate::application::services::{
    BotService, BotState, Clock, Commentator, DailyJobScheduler, JobRunner, LocalClock,
};

/// Everything the process needs once startup succeeded
pub struct BotRuntime {
    pub service: Arc<BotService>,
    pub scheduler: DailyJobScheduler,
    pub telegram: Arc<TelegramClient>,
    pub poll_backoff: Duration,
}

pub async fn build_runtime(settings: &Settings) -> Result<BotRuntime> {
    let startup_started_at = Instant::now();
    let timeouts = TimeoutConfig::new();

    let defaults = settings.bot_config()?;
    let store = JsonFileStore::new(&settings.data_path, defaults);
    info!("Data path: {}", store.path().display());

    if store.ensure_initialized()? {
        info!("Created data file with default configuration");
    }

    let started_at = Instant::now();
    let (config, roster) = store.load().into_parts();
    info!(
        users = roster.len(),
        chat_id = ?config.chat_id.map(|id| id.value()),
        "Loaded state ({}ms)",
        started_at.elapsed().as_millis()
    );

    let inference: Option<Arc<dyn InferenceClient>> = match &settings.openai_api_key {
        Some(api_key) => {
            let client = OpenAiClient::new(
                &settings.openai_base_url,
                api_key,
                &settings.openai_model,
                &timeouts,
            )
            .context("Failed to create inference client")?;
            info!(model = client.model(), "Inference enabled");
            Some(Arc::new(client) as Arc<dyn InferenceClient>)
        }
        None => {
            info!("OPENAI_API_KEY not set, inference disabled");
            None
        }
    };

    let extractor =
        CountExtractor::new(inference.clone()).with_inference_timeout(timeouts.inference);
    let state = BotState::new(config, roster, extractor).into_shared();

    let telegram = Arc::new(
        TelegramClient::new(&settings.telegram_token, timeouts.clone())
            .context("Failed to create Telegram client")?,
    );
    let transport: Arc<dyn ChatTransport> = telegram.clone();
    let store: Arc<dyn StateStore> = Arc::new(store);
    let clock: Arc<dyn Clock> = Arc::new(LocalClock);

    let service = Arc::new(BotService::new(
        state.clone(),
        transport.clone(),
        store.clone(),
        Commentator::new(inference, timeouts.inference),
        clock.clone(),
    ));

    let scheduler = DailyJobScheduler::new(JobRunner::new(state, transport, store, clock));

    info!(
        "Startup completed ({}ms)",
        startup_started_at.elapsed().as_millis()
    );

    Ok(BotRuntime {
        service,
        scheduler,
        telegram,
        poll_backoff: timeouts.poll_backoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(data_path: &std::path::Path) -> Settings {
        let data_path = data_path.display().to_string();
        Settings::from_lookup(move |key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            "DATA_PATH" => Some(data_path.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_runtime_creates_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let runtime = build_runtime(&settings_for(&path)).await.unwrap();

        assert!(path.exists());
        assert_eq!(runtime.poll_backoff, Duration::from_secs(5));
        assert_eq!(runtime.scheduler.active_task_count().await, 0);
    }

    #[tokio::test]
    async fn test_build_runtime_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{
                "config": {
                    "chat_id": -100,
                    "inactivity_days": 5,
                    "reminder_time": "21:15",
                    "warning_days": 3,
                    "challenge_start_date": "2025-03-15",
                    "challenge_end_date": "2025-06-13"
                },
                "user_data": {}
            }"#,
        )
        .unwrap();

        build_runtime(&settings_for(&path)).await.unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("21:15"));
    }
}
