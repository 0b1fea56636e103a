use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};

use super::jobs::JobRunner;
use super::task_spawner::spawn_job_loop;
use super::types::JobKind;
use super::{MetadataMap, TaskMap};

const CHECK_INTERVAL: Duration = Duration::from_secs(300);

impl super::DailyJobScheduler {
    /// Start health check background task to monitor scheduled tasks
    pub(super) async fn start_health_check_task(&self) {
        let runner = Arc::clone(&self.runner);
        let tasks = Arc::clone(&self.tasks);
        let metadata = Arc::clone(&self.task_metadata);

        let handle = tokio::spawn(async move {
            let mut check_interval = tokio::time::interval(CHECK_INTERVAL);

            loop {
                check_interval.tick().await;
                revive_dead_tasks(&runner, &tasks, &metadata).await;
            }
        });

        let mut health_check = self.health_check_handle.lock().await;
        *health_check = Some(handle);

        info!("Health check task started (checking every 5 minutes)");
    }
}

/// Respawn every finished job task at its recorded time; returns the revived jobs
pub(super) async fn revive_dead_tasks(
    runner: &Arc<JobRunner>,
    tasks: &TaskMap,
    metadata: &MetadataMap,
) -> Vec<JobKind> {
    let mut tasks_lock = tasks.lock().await;
    let mut metadata_lock = metadata.lock().await;
    let mut revived = Vec::new();

    for (kind, handle) in tasks_lock.iter_mut() {
        let Some(meta) = metadata_lock.get_mut(kind) else {
            continue;
        };

        if handle.is_finished() {
            error!(
                job = %kind,
                "Health check: task terminated unexpectedly, respawning at {:02}:{:02}",
                meta.hour,
                meta.minute
            );
            meta.last_execution = None;
            *handle = spawn_job_loop(
                Arc::clone(runner),
                Arc::clone(metadata),
                *kind,
                meta.hour,
                meta.minute,
            );
            revived.push(*kind);
        } else if let Some(last_exec) = meta.last_execution {
            // daily jobs should never go more than 25 hours without running
            let elapsed = Utc::now() - last_exec;
            if elapsed > ChronoDuration::hours(25) {
                warn!(
                    job = %kind,
                    "Health check: task scheduled for {:02}:{:02} hasn't executed in {} hours",
                    meta.hour,
                    meta.minute,
                    elapsed.num_hours()
                );
            }
        }
    }

    revived
}
