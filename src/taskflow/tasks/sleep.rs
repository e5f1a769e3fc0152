// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Duration;

use crate::engine::error::TaskError;
use crate::engine::task::{Task, TaskState, TaskStatus};

/// Task that waits for a fixed duration
pub struct SleepTask {
    state: TaskState,
    duration: Option<Duration>,
}

impl SleepTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: TaskState::new(name),
            duration: None,
        }
    }

    /// Create a task that is ready to run
    pub fn with_duration(name: impl Into<String>, duration: Duration) -> Self {
        let mut task = Self::new(name);
        task.set_duration(duration);
        task
    }

    /// Create a task from a number of seconds, as written in workflow files
    pub fn with_secs(name: impl Into<String>, secs: f64) -> Result<Self, TaskError> {
        let mut task = Self::new(name);
        task.set_secs(secs)?;
        Ok(task)
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
        self.state.arm();
    }

    pub fn set_secs(&mut self, secs: f64) -> Result<(), TaskError> {
        let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
            TaskError::InvalidConfig(format!(
                "sleep task '{}' needs a non-negative duration, got {}",
                self.state.name(),
                secs
            ))
        })?;
        self.set_duration(duration);
        Ok(())
    }
}

#[async_trait]
impl Task for SleepTask {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn status(&self) -> TaskStatus {
        self.state.status()
    }

    async fn run(&self) {
        let duration = self.duration;
        let name = self.state.name().to_string();
        self.state
            .execute(async move {
                let duration = duration.ok_or(TaskError::NotConfigured(name))?;
                tokio::time::sleep(duration).await;
                Ok::<(), TaskError>(())
            })
            .await;
    }

    fn reset(&self) {
        self.state.reset();
    }
}
