// SPDX-License-Identifier: MIT

//! Engine module - the task contract and the workflow graph
//!
//! The engine depends only on the `Task` trait, never on concrete task kinds.

pub mod error;
pub mod graph;
pub mod task;

pub use error::{TaskError, TaskflowError, WorkflowError};
pub use graph::{RunReport, WorkflowGraph};
pub use task::{Task, TaskState, TaskStatus};
