use super::actions::Action;
use crate::api::ApiError;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type TaskId = u64;

#[derive(Debug)]
pub struct BackgroundTask {
    pub id: TaskId,
    pub handle: JoinHandle<()>,
    pub description: String,
    pub started_at: std::time::Instant,
}

impl BackgroundTask {
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

/// Runs API requests off the UI loop and reports their outcome as actions.
pub struct TaskManager {
    tasks: HashMap<TaskId, BackgroundTask>,
    next_task_id: TaskId,
    action_sender: mpsc::UnboundedSender<Action>,
}

impl TaskManager {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();

        (
            Self {
                tasks: HashMap::new(),
                next_task_id: 1,
                action_sender: tx,
            },
            rx,
        )
    }

    /// Sender feeding the same channel, for producers other than spawned requests.
    pub fn action_sender(&self) -> mpsc::UnboundedSender<Action> {
        self.action_sender.clone()
    }

    /// Spawn a request; its result is wrapped by `into_action` and sent back.
    pub fn spawn_request<T, Fut>(
        &mut self,
        description: impl Into<String>,
        request: Fut,
        into_action: impl FnOnce(Result<T, ApiError>) -> Action + Send + 'static,
    ) -> TaskId
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let task_id = self.next_task_id;
        self.next_task_id += 1;

        let description = description.into();
        let action_sender = self.action_sender.clone();
        let desc_for_task = description.clone();

        let handle = tokio::spawn(async move {
            let result = request.await;
            if let Err(e) = &result {
                log::warn!("{desc_for_task} failed: {e}");
            }
            // The receiver only goes away on shutdown
            let _ = action_sender.send(into_action(result));
        });

        log::debug!("Spawned background task {task_id}: {description}");
        self.tasks.insert(
            task_id,
            BackgroundTask {
                id: task_id,
                handle,
                description,
                started_at: std::time::Instant::now(),
            },
        );
        task_id
    }

    /// Check for completed tasks and clean them up
    pub fn cleanup_finished_tasks(&mut self) -> Vec<BackgroundTask> {
        let finished: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.handle.is_finished())
            .map(|(id, _)| *id)
            .collect();

        finished.into_iter().filter_map(|id| self.tasks.remove(&id)).collect()
    }

    /// Cancel all running tasks
    pub fn cancel_all_tasks(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.handle.abort();
        }
    }

    /// Get the number of active tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        // Cancel all tasks when the manager is dropped
        self.cancel_all_tasks();
    }
}
