use tracing::info;

impl super::DailyJobScheduler {
    /// Stop all scheduled tasks
    pub async fn stop_all_tasks(&self) {
        let mut health_check = self.health_check_handle.lock().await;
        if let Some(handle) = health_check.take() {
            handle.abort();
            info!("Health check task stopped");
        }
        drop(health_check);

        let mut tasks = self.tasks.lock().await;
        let mut metadata = self.task_metadata.lock().await;

        info!("Stopping {} scheduled tasks...", tasks.len());

        for (kind, handle) in tasks.drain() {
            info!(job = %kind, "Stopping task");
            handle.abort();
        }

        metadata.clear();

        info!("All scheduled tasks stopped");
    }

    /// Get count of active tasks
    pub async fn active_task_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn shutdown(self) {
        info!("Shutting down daily job scheduler");
        self.stop_all_tasks().await;
    }
}
