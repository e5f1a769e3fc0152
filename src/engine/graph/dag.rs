// SPDX-License-Identifier: MIT

//! Workflow graph structure
//!
//! Vertices are shared task handles, identified by pointer. Edges mean
//! "predecessor must run before successor". The graph is kept acyclic by
//! checking every edge insertion and rolling it back when it closes a cycle.

use once_cell::sync::OnceCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;

use crate::engine::error::WorkflowError;
use crate::engine::task::Task;

/// Directed acyclic graph of tasks
#[derive(Default)]
pub struct WorkflowGraph {
    /// Tasks in registration order
    pub(super) tasks: Vec<Arc<dyn Task>>,
    /// Adjacency list: index -> successor indices, in edge insertion order
    pub(super) successors: Vec<Vec<usize>>,
    /// Topological order, cleared on every mutation
    order_cache: OnceCell<Vec<usize>>,
}

fn same_task(a: &Arc<dyn Task>, b: &Arc<dyn Task>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl WorkflowGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registered tasks in registration order
    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        &self.tasks
    }

    /// Check whether this exact task handle is registered
    pub fn contains(&self, task: &Arc<dyn Task>) -> bool {
        self.index_of(task).is_some()
    }

    /// Get the first task registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// All edges as (predecessor, successor) name pairs
    pub fn edges(&self) -> Vec<(String, String)> {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, tos)| {
                tos.iter().map(move |&to| {
                    (
                        self.tasks[from].name().to_string(),
                        self.tasks[to].name().to_string(),
                    )
                })
            })
            .collect()
    }

    /// Names of the direct predecessors of `name`
    pub fn predecessors(&self, name: &str) -> Vec<String> {
        let Some(idx) = self.index_of_name(name) else {
            return Vec::new();
        };
        self.successors
            .iter()
            .enumerate()
            .filter(|(_, tos)| tos.contains(&idx))
            .map(|(from, _)| self.tasks[from].name().to_string())
            .collect()
    }

    /// Names of the direct successors of `name`
    pub fn successors(&self, name: &str) -> Vec<String> {
        self.index_of_name(name)
            .map(|idx| {
                self.successors[idx]
                    .iter()
                    .map(|&to| self.tasks[to].name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if `to` is reachable from `from` along dependency edges
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.index_of_name(from), self.index_of_name(to)) {
            (Some(from), Some(to)) => self.reaches(&[from], to),
            _ => false,
        }
    }

    /// Register an isolated task
    ///
    /// Adding the same handle twice is a no-op. A different task carrying an
    /// already registered name is rejected.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> Result<(), WorkflowError> {
        self.check_name(&task)?;
        self.insert(task);
        Ok(())
    }

    /// Add the edge `predecessor -> successor`, registering missing tasks
    ///
    /// Returns `Ok(false)` when the edge would close a cycle (a self-loop
    /// always does); the graph is then exactly as before the call. Adding an
    /// existing edge returns `Ok(true)` without changes.
    pub fn add_relation(
        &mut self,
        predecessor: &Arc<dyn Task>,
        successor: &Arc<dyn Task>,
    ) -> Result<bool, WorkflowError> {
        // Validate both endpoints before touching anything
        self.check_name(predecessor)?;
        self.check_name(successor)?;
        if predecessor.name() == successor.name() && !same_task(predecessor, successor) {
            return Err(WorkflowError::DuplicateTaskName(
                successor.name().to_string(),
            ));
        }

        let registered = self.tasks.len();
        let from = self.insert(predecessor.clone());
        let to = self.insert(successor.clone());

        if self.successors[from].contains(&to) {
            return Ok(true);
        }

        self.successors[from].push(to);
        if self.has_cycle() {
            self.successors[from].pop();
            self.tasks.truncate(registered);
            self.successors.truncate(registered);
            self.order_cache.take();
            log::warn!(
                "Rejected dependency {} -> {}: would create a cycle",
                predecessor.name(),
                successor.name()
            );
            return Ok(false);
        }

        self.order_cache.take();
        log::debug!(
            "Added dependency {} -> {}",
            predecessor.name(),
            successor.name()
        );
        Ok(true)
    }

    /// Same as `add_relation` for tasks already registered by name
    pub fn add_relation_by_name(
        &mut self,
        predecessor: &str,
        successor: &str,
    ) -> Result<bool, WorkflowError> {
        let from = self
            .get(predecessor)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownTask(predecessor.to_string()))?;
        let to = self
            .get(successor)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownTask(successor.to_string()))?;
        self.add_relation(&from, &to)
    }

    /// Check the whole graph for a cycle with a DFS and a recursion stack
    ///
    /// The DFS keeps its own stack of (node, next successor position) frames,
    /// so chain length is not bounded by the thread stack.
    pub fn has_cycle(&self) -> bool {
        let mut visited = vec![false; self.tasks.len()];
        let mut on_stack = vec![false; self.tasks.len()];
        let mut frames: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.tasks.len() {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            on_stack[root] = true;
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let (node, pos) = *frame;
                match self.successors[node].get(pos) {
                    Some(&next) => {
                        frame.1 += 1;
                        if on_stack[next] {
                            return true;
                        }
                        if !visited[next] {
                            visited[next] = true;
                            on_stack[next] = true;
                            frames.push((next, 0));
                        }
                    }
                    None => {
                        on_stack[node] = false;
                        frames.pop();
                    }
                }
            }
        }

        false
    }

    /// One valid execution order (Kahn's algorithm)
    ///
    /// Among tasks that are ready at the same time, the one registered first
    /// is scheduled first.
    pub fn topological_order(&self) -> Result<Vec<Arc<dyn Task>>, WorkflowError> {
        Ok(self
            .order_indices()?
            .iter()
            .map(|&idx| self.tasks[idx].clone())
            .collect())
    }

    /// Task names in topological order
    pub fn order_names(&self) -> Result<Vec<String>, WorkflowError> {
        Ok(self
            .order_indices()?
            .iter()
            .map(|&idx| self.tasks[idx].name().to_string())
            .collect())
    }

    pub(super) fn order_indices(&self) -> Result<&[usize], WorkflowError> {
        self.order_cache
            .get_or_try_init(|| self.kahn())
            .map(|order| order.as_slice())
    }

    fn kahn(&self) -> Result<Vec<usize>, WorkflowError> {
        let mut in_degree = vec![0usize; self.tasks.len()];
        for tos in &self.successors {
            for &to in tos {
                in_degree[to] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != self.tasks.len() {
            log::error!(
                "Topological order covers {} of {} tasks, graph contains a cycle",
                order.len(),
                self.tasks.len()
            );
            return Err(WorkflowError::InvariantViolation {
                ordered: order.len(),
                total: self.tasks.len(),
            });
        }

        Ok(order)
    }

    /// BFS forward from `sources`, looking for `target`
    pub(super) fn reaches(&self, sources: &[usize], target: usize) -> bool {
        let mut visited = vec![false; self.tasks.len()];
        let mut queue: VecDeque<usize> = VecDeque::new();

        for &src in sources {
            if !visited[src] {
                visited[src] = true;
                queue.push_back(src);
            }
        }

        while let Some(node) = queue.pop_front() {
            for &next in &self.successors[node] {
                if next == target {
                    return true;
                }
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        false
    }

    pub(super) fn index_of(&self, task: &Arc<dyn Task>) -> Option<usize> {
        self.tasks.iter().position(|t| same_task(t, task))
    }

    pub(super) fn indices_of_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.tasks
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.name() == name)
            .map(|(idx, _)| idx)
    }

    fn index_of_name(&self, name: &str) -> Option<usize> {
        self.indices_of_name(name).next()
    }

    fn check_name(&self, task: &Arc<dyn Task>) -> Result<(), WorkflowError> {
        let clash = self
            .tasks
            .iter()
            .any(|t| t.name() == task.name() && !same_task(t, task));
        if clash {
            return Err(WorkflowError::DuplicateTaskName(task.name().to_string()));
        }
        Ok(())
    }

    fn insert(&mut self, task: Arc<dyn Task>) -> usize {
        if let Some(idx) = self.index_of(&task) {
            return idx;
        }
        self.tasks.push(task);
        self.successors.push(Vec::new());
        self.order_cache.take();
        self.tasks.len() - 1
    }
}
