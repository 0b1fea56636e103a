use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info, warn, Instrument};

use super::jobs::JobRunner;
use super::types::{JobKind, TaskMetadata};
use super::MetadataMap;

/// Next local `hour:minute` strictly after `now`
pub fn next_occurrence(now: NaiveDateTime, hour: u8, minute: u8) -> Option<NaiveDateTime> {
    let target = now
        .date()
        .and_hms_opt(u32::from(hour), u32::from(minute), 0)?;
    if target <= now {
        Some(target + ChronoDuration::days(1))
    } else {
        Some(target)
    }
}

/// Run `kind` every day at `hour:minute` until aborted
pub(super) fn spawn_job_loop(
    runner: Arc<JobRunner>,
    task_metadata: MetadataMap,
    kind: JobKind,
    hour: u8,
    minute: u8,
) -> JoinHandle<()> {
    let span = runner.span().clone();

    tokio::spawn(
        async move {
            loop {
                let now = Local::now().naive_local();
                let Some(next_run) = next_occurrence(now, hour, minute) else {
                    error!(
                        job = %kind,
                        "Failed to calculate next run time for {:02}:{:02}. Task will exit.",
                        hour,
                        minute
                    );
                    break;
                };

                let duration_until_next =
                    (next_run - now).to_std().unwrap_or(Duration::from_secs(60));

                info!(
                    job = %kind,
                    next_run = %next_run.format("%Y-%m-%d %H:%M:%S"),
                    in_seconds = duration_until_next.as_secs(),
                    "Next run scheduled"
                );

                tokio::time::sleep(duration_until_next).await;

                {
                    let mut metadata = task_metadata.lock().await;
                    if let Some(meta) = metadata.get_mut(&kind) {
                        meta.last_execution = Some(Utc::now());
                    }
                }

                runner.run(kind).await;
            }
        }
        .instrument(span),
    )
}

impl super::DailyJobScheduler {
    pub(super) async fn spawn_job_task(&self, kind: JobKind, hour: u8, minute: u8) {
        info!(job = %kind, "Spawning task at {:02}:{:02}", hour, minute);

        {
            let mut metadata = self.task_metadata.lock().await;
            metadata.insert(
                kind,
                TaskMetadata {
                    hour,
                    minute,
                    last_execution: None,
                },
            );
        }

        let handle = spawn_job_loop(
            Arc::clone(&self.runner),
            Arc::clone(&self.task_metadata),
            kind,
            hour,
            minute,
        );

        let mut tasks = self.tasks.lock().await;
        if let Some(old_handle) = tasks.insert(kind, handle) {
            warn!(job = %kind, "Aborting old task");
            old_handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        assert_eq!(next_occurrence(at(2, 10, 0, 0), 22, 0), Some(at(2, 22, 0, 0)));
    }

    #[test]
    fn test_next_occurrence_already_passed() {
        assert_eq!(next_occurrence(at(2, 23, 0, 0), 20, 0), Some(at(3, 20, 0, 0)));
    }

    #[test]
    fn test_next_occurrence_exact_moment_rolls_over() {
        assert_eq!(next_occurrence(at(2, 23, 59, 0), 23, 59), Some(at(3, 23, 59, 0)));
        assert_eq!(next_occurrence(at(2, 23, 58, 59), 23, 59), Some(at(2, 23, 59, 0)));
    }

    #[test]
    fn test_next_occurrence_rejects_invalid_time() {
        assert_eq!(next_occurrence(at(2, 10, 0, 0), 24, 0), None);
    }
}
