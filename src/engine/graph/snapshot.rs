// SPDX-License-Identifier: MIT

//! Read-only projections of graph state for external display

use serde::Serialize;

use super::dag::WorkflowGraph;
use crate::engine::error::WorkflowError;
use crate::engine::task::TaskStatus;

/// One row of a status table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub name: String,
    pub status: TaskStatus,
}

/// A task as seen by a graph renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub status: TaskStatus,
    pub color: &'static str,
    /// Length of the longest dependency chain leading to this task
    pub layer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSnapshot {
    pub from: String,
    pub to: String,
}

/// Vertices, edges and statuses at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl WorkflowGraph {
    /// (name, status) for every task, in registration order
    pub fn status_table(&self) -> Vec<StatusRow> {
        self.tasks
            .iter()
            .map(|t| StatusRow {
                name: t.name().to_string(),
                status: t.status(),
            })
            .collect()
    }

    /// Snapshot for visualization, nodes listed in topological order
    pub fn snapshot(&self) -> Result<GraphSnapshot, WorkflowError> {
        let order = self.order_indices()?;

        let mut layers = vec![0usize; self.tasks.len()];
        for &node in order {
            for &next in &self.successors[node] {
                layers[next] = layers[next].max(layers[node] + 1);
            }
        }

        let nodes = order
            .iter()
            .map(|&idx| {
                let status = self.tasks[idx].status();
                NodeSnapshot {
                    name: self.tasks[idx].name().to_string(),
                    status,
                    color: status.color(),
                    layer: layers[idx],
                }
            })
            .collect();

        let edges = self
            .edges()
            .into_iter()
            .map(|(from, to)| EdgeSnapshot { from, to })
            .collect();

        Ok(GraphSnapshot { nodes, edges })
    }
}
