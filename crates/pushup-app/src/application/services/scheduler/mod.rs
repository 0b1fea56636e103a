mod health_check;
mod jobs;
mod task_manager;
mod task_spawner;
mod types;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

pub use jobs::JobRunner;
pub use types::JobKind;

use types::TaskMetadata;

type TaskMap = Arc<Mutex<HashMap<JobKind, JoinHandle<()>>>>;
type MetadataMap = Arc<Mutex<HashMap<JobKind, TaskMetadata>>>;

pub struct DailyJobScheduler {
    runner: Arc<JobRunner>,
    /// Active tasks mapped by job
    tasks: TaskMap,
    /// Task metadata for health monitoring and respawning
    task_metadata: MetadataMap,
    /// Health check task handle
    health_check_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DailyJobScheduler {
    pub fn new(runner: JobRunner) -> Self {
        Self {
            runner: Arc::new(runner),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            task_metadata: Arc::new(Mutex::new(HashMap::new())),
            health_check_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn every daily job plus the health check
    pub async fn start(&self) {
        let reminder_time = self.runner.reminder_time().await;

        for kind in JobKind::ALL {
            let (hour, minute) = kind.fire_time(reminder_time);
            self.spawn_job_task(kind, hour, minute).await;
        }

        self.start_health_check_task().await;

        info!(
            reminder = %reminder_time,
            "Scheduler started: reminder at {}, warnings at 20:00, removals at 23:59",
            reminder_time
        );
    }
}
