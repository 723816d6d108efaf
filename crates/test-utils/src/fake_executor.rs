use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devstrap::discovery::Task;
use devstrap::errors::{DevstrapError, Result};
use devstrap::exec::{TaskExecutor, TaskOutcome};
use devstrap::scratch::ScratchWorkspace;
use tokio_util::sync::CancellationToken;

/// A fake executor that:
/// - looks up each task's exit code in a script (default 0)
/// - writes a small log and the matching marker, like the real executor
/// - records start order and the peak number of tasks running at once.
///
/// Clones share their records, so keep one handle and give the other to the
/// scheduler.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    exit_codes: HashMap<String, i32>,
    delay: Duration,
    executed: Arc<Mutex<Vec<String>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make task `id` exit with `code`.
    pub fn with_exit(mut self, id: &str, code: i32) -> Self {
        self.exit_codes.insert(id.to_string(), code);
        self
    }

    /// Hold every task for `delay` before it finishes.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Task ids in the order they started.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for ScriptedExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        scratch: &'a ScratchWorkspace,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(task.id.clone());
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            let interrupted = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(self.delay) => false,
            };
            self.running.fetch_sub(1, Ordering::SeqCst);
            if interrupted {
                return Err(DevstrapError::Interrupted { step: None });
            }

            let code = self.exit_codes.get(&task.id).copied().unwrap_or(0);
            std::fs::write(
                scratch.log_path(task),
                format!("{}: scripted output\nexit {code}\n", task.id),
            )?;

            if code == 0 {
                scratch.mark_success(task)?;
                Ok(TaskOutcome::Success)
            } else {
                scratch.mark_failure(task, code)?;
                Ok(TaskOutcome::Failed(code))
            }
        })
    }
}
