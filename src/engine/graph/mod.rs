// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! This module provides the workflow graph: acyclic dependency edges,
//! deterministic ordering, and a sequential run that skips the descendants
//! of failed tasks.

mod dag;
pub mod executor;
pub mod snapshot;

pub use dag::WorkflowGraph;
pub use executor::RunReport;
pub use snapshot::{EdgeSnapshot, GraphSnapshot, NodeSnapshot, StatusRow};
