use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use pushup_domain::DomainError;
use pushup_infrastructure::telegram::{TelegramClient, UpdateBatch};

use crate::application::services::BotService;

/// Where inbound updates come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn next_batch(&self, offset: Option<i64>) -> Result<UpdateBatch, DomainError>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_batch(&self, offset: Option<i64>) -> Result<UpdateBatch, DomainError> {
        self.poll_updates(offset).await
    }
}

/// Poll until `shutdown` resolves, handling updates strictly one after another.
///
/// Poll failures are logged and retried after `backoff`. Returns the number of updates handled.
pub async fn run_polling<F>(
    source: &dyn UpdateSource,
    service: &BotService,
    backoff: Duration,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut offset = None;
    let mut handled = 0;

    info!("Polling for updates");

    loop {
        let result = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = source.next_batch(offset) => result,
        };

        match result {
            Ok(batch) => {
                if let Some(next) = batch.next_offset {
                    offset = Some(next);
                }
                for update in batch.updates {
                    service.handle_update(update).await;
                    handled += 1;
                }
            }
            Err(e) => {
                warn!(error = %e, "Polling failed, retrying in {}ms", backoff.as_millis());
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    info!(handled, "Polling stopped");
    handled
}
