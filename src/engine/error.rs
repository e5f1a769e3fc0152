// SPDX-License-Identifier: MIT

//! Typed error handling for taskflow-rs
//!
//! Task failures never surface through these types during a run: they are
//! recorded in the task status. Errors here describe caller mistakes, broken
//! graph invariants and the configuration of individual tasks.

use thiserror::Error;

/// Top-level error type for taskflow-rs
#[derive(Debug, Error)]
pub enum TaskflowError {
    /// Graph construction and execution errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Task configuration errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Graph-level errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A different task with the same name is already registered
    #[error("Task name '{0}' is already registered by another task")]
    DuplicateTaskName(String),

    /// Lookup of a task name that is not registered
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A dependency would close a cycle
    #[error("Circular dependency detected: {0:?}")]
    CircularDependency(Vec<String>),

    /// Topological ordering lost tasks although edges are checked on insert
    #[error("Graph invariant violated: ordered {ordered} of {total} tasks")]
    InvariantViolation { ordered: usize, total: usize },

    /// A function task refers to a callable that was never registered
    #[error("Function '{0}' is not registered")]
    UnknownFunction(String),

    /// File not found when loading a workflow
    #[error("Workflow file not found: {0}")]
    FileNotFound(String),

    /// Semantically invalid workflow definition
    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),
}

/// Errors produced while configuring or executing a single task
#[derive(Debug, Error)]
pub enum TaskError {
    /// Run was attempted before work was bound
    #[error("Task '{0}' has no work configured")]
    NotConfigured(String),

    /// Rejected configuration, the task stays in `Init`
    #[error("Invalid task configuration: {0}")]
    InvalidConfig(String),

    /// The process could not be started
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("'{program}' exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    /// The task-internal timeout elapsed
    #[error("'{program}' timed out after {secs}s")]
    Timeout { program: String, secs: f64 },

    /// Failure reported by in-process work
    #[error("{0}")]
    Failed(String),
}

impl TaskError {
    /// Create a failure from any message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<&str> for TaskError {
    fn from(s: &str) -> Self {
        Self::Failed(s.to_string())
    }
}

// In-process callables usually return boxed errors
impl From<Box<dyn std::error::Error + Send + Sync>> for TaskError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Failed(err.to_string())
    }
}
