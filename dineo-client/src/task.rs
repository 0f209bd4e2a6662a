//! Handle for background tasks

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background task that stops when cancelled or dropped
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Cancel the task and wait for it to end
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
