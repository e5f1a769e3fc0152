// SPDX-License-Identifier: MIT

//! Task contract - the only thing the workflow engine knows about work
//!
//! This module provides:
//! - `Task` - the capability trait every unit of work implements
//! - `TaskStatus` - the status state machine
//! - `TaskState` - name + status cell shared by the concrete task kinds

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::TaskError;

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Constructed, no work bound yet
    Init,
    /// Configured and eligible to run
    Waiting,
    /// Work in progress
    Running,
    /// Last run succeeded
    Finished,
    /// Last run failed
    Failed,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Init => "init",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Running => "running",
            TaskStatus::Finished => "finished",
            TaskStatus::Failed => "failed",
        }
    }

    /// Fixed color used by external graph renderers
    pub fn color(&self) -> &'static str {
        match self {
            TaskStatus::Init => "blue",
            TaskStatus::Waiting => "orange",
            TaskStatus::Running => "yellow",
            TaskStatus::Finished => "green",
            TaskStatus::Failed => "red",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Core task trait for all task kinds
///
/// The engine only calls `run` on tasks it has observed in
/// `TaskStatus::Waiting`. Implementations must report every failure,
/// including panics in their work, through `TaskStatus::Failed`.
#[async_trait]
pub trait Task: Send + Sync {
    /// Returns the task name (must be unique within a graph)
    fn name(&self) -> &str;

    /// Returns the current status without side effects
    fn status(&self) -> TaskStatus;

    /// Execute the bound work once: `Running`, then `Finished` or `Failed`
    async fn run(&self);

    /// Re-arm the task as `Waiting`
    fn reset(&self);
}

/// Name and status cell for `Task` implementors
#[derive(Debug)]
pub struct TaskState {
    name: String,
    status: Mutex<TaskStatus>,
}

impl TaskState {
    /// Create a new state in `TaskStatus::Init`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Mutex::new(TaskStatus::Init),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        *self.lock()
    }

    /// Mark work as configured; only moves a task out of `Init`
    ///
    /// Reconfiguring a task that already ran leaves its status alone, so
    /// `reset` stays the only way back to `Waiting`.
    pub fn arm(&self) {
        let mut status = self.lock();
        if *status == TaskStatus::Init {
            *status = TaskStatus::Waiting;
        }
    }

    /// Re-arm a configured task; a task without work stays `Init`
    pub fn reset(&self) {
        let mut status = self.lock();
        if *status == TaskStatus::Init {
            log::warn!("Task {} has no work configured, reset ignored", self.name);
            return;
        }
        *status = TaskStatus::Waiting;
    }

    /// Run `work` and record its outcome
    ///
    /// Errors and panics both end in `TaskStatus::Failed`; nothing
    /// propagates to the caller.
    pub async fn execute<F>(&self, work: F)
    where
        F: Future<Output = Result<(), TaskError>> + Send,
    {
        self.set(TaskStatus::Running);
        log::info!("Task {}: starting", self.name);

        let outcome = AssertUnwindSafe(work).catch_unwind().await;

        let status = match outcome {
            Ok(Ok(())) => {
                log::info!("Task {}: finished", self.name);
                TaskStatus::Finished
            }
            Ok(Err(e)) => {
                log::error!("Task {} failed: {}", self.name, e);
                TaskStatus::Failed
            }
            Err(payload) => {
                log::error!(
                    "Task {} panicked: {}",
                    self.name,
                    panic_message(payload.as_ref())
                );
                TaskStatus::Failed
            }
        };

        self.set(status);
    }

    fn set(&self, status: TaskStatus) {
        *self.lock() = status;
    }

    fn lock(&self) -> MutexGuard<'_, TaskStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_init() {
        let state = TaskState::new("t");
        assert_eq!(state.name(), "t");
        assert_eq!(state.status(), TaskStatus::Init);
    }

    #[test]
    fn test_reset_does_not_leave_init() {
        let state = TaskState::new("t");
        state.reset();
        assert_eq!(state.status(), TaskStatus::Init);

        state.arm();
        assert_eq!(state.status(), TaskStatus::Waiting);
    }

    #[tokio::test]
    async fn test_execute_success_finishes() {
        let state = TaskState::new("ok");
        state.arm();
        state.execute(async { Ok(()) }).await;
        assert_eq!(state.status(), TaskStatus::Finished);
    }

    #[tokio::test]
    async fn test_execute_error_fails() {
        let state = TaskState::new("bad");
        state.arm();
        state
            .execute(async { Err(TaskError::failed("This stub fails.")) })
            .await;
        assert_eq!(state.status(), TaskStatus::Failed);

        state.reset();
        assert_eq!(state.status(), TaskStatus::Waiting);
    }

    #[tokio::test]
    async fn test_arm_does_not_rearm_failed_task() {
        let state = TaskState::new("bad");
        state.arm();
        state
            .execute(async { Err(TaskError::failed("This stub fails.")) })
            .await;

        state.arm();
        assert_eq!(state.status(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_execute_panic_fails() {
        let state = TaskState::new("boom");
        state.arm();
        state
            .execute(async {
                let explode = true;
                if explode {
                    panic!("This stub panics.");
                }
                Ok(())
            })
            .await;
        assert_eq!(state.status(), TaskStatus::Failed);
    }

    #[test]
    fn test_status_labels_and_colors() {
        assert_eq!(TaskStatus::Waiting.to_string(), "waiting");
        assert_eq!(TaskStatus::Finished.color(), "green");
        assert_eq!(TaskStatus::Failed.color(), "red");
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert_eq!(
            serde_json::to_string(&TaskStatus::Init).unwrap(),
            "\"init\""
        );
    }
}
