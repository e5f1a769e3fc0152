// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::error::TaskError;
use crate::engine::task::{Task, TaskState, TaskStatus};

/// In-process unit of work
pub type TaskFn = Arc<dyn Fn() -> Result<(), TaskError> + Send + Sync>;

/// Task that calls a Rust closure
///
/// An `Err` return or a panic inside the closure both end in `Failed`.
pub struct FunctionTask {
    state: TaskState,
    work: Option<TaskFn>,
}

impl FunctionTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: TaskState::new(name),
            work: None,
        }
    }

    /// Create a task that is ready to run
    pub fn with_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
    {
        let mut task = Self::new(name);
        task.set_fn(Arc::new(f));
        task
    }

    pub fn set_fn(&mut self, work: TaskFn) {
        self.work = Some(work);
        self.state.arm();
    }
}

#[async_trait]
impl Task for FunctionTask {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn status(&self) -> TaskStatus {
        self.state.status()
    }

    async fn run(&self) {
        let work = self.work.clone();
        let name = self.state.name().to_string();
        self.state
            .execute(async move {
                let work = work.ok_or(TaskError::NotConfigured(name))?;
                work()
            })
            .await;
    }

    fn reset(&self) {
        self.state.reset();
    }
}
