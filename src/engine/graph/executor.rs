// SPDX-License-Identifier: MIT

//! Graph workflow executor

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use super::dag::WorkflowGraph;
use crate::engine::error::WorkflowError;
use crate::engine::task::TaskStatus;

/// Outcome of one execution pass
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Tasks that ran and finished
    pub finished: Vec<String>,
    /// Tasks that ran and failed
    pub failed: Vec<String>,
    /// Waiting tasks blocked by an upstream failure
    pub skipped: Vec<String>,
    /// Tasks that were not waiting when reached (already run, or never configured)
    pub ignored: Vec<String>,
}

impl RunReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            finished: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Names of every task run during this pass
    pub fn executed(&self) -> Vec<&str> {
        self.finished
            .iter()
            .chain(self.failed.iter())
            .map(String::as_str)
            .collect()
    }

    /// True when nothing failed and nothing was blocked
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

impl WorkflowGraph {
    /// Run every waiting task once, in topological order
    ///
    /// A task is skipped while any task that failed during this pass has a
    /// path to it. Task failures are reported in the returned `RunReport`;
    /// `Err` only signals a broken graph invariant, detected before anything
    /// runs.
    pub async fn run(&self) -> Result<RunReport, WorkflowError> {
        let order = self.order_indices()?.to_vec();
        let mut report = RunReport::start();
        let mut failed: Vec<usize> = Vec::new();

        log::info!("Run {}: {} tasks", report.run_id, order.len());

        for idx in order {
            let task = &self.tasks[idx];
            let name = task.name().to_string();

            if task.status() != TaskStatus::Waiting {
                log::debug!("Task {} is {}, not waiting", name, task.status());
                report.ignored.push(name);
                continue;
            }

            if self.is_blocked(idx, &failed) {
                log::warn!("Task {} skipped: an upstream task failed", name);
                report.skipped.push(name);
                continue;
            }

            task.run().await;

            let status = task.status();
            if !status.is_terminal() {
                // Contract breach by the task; treat it like a failure
                log::error!("Task {} returned from run in status {}", name, status);
                failed.push(idx);
                report.failed.push(name);
            } else if status == TaskStatus::Failed {
                failed.push(idx);
                report.failed.push(name);
            } else {
                report.finished.push(name);
            }
        }

        report.finished_at = Utc::now();
        log::info!(
            "Run {} done: {} finished, {} failed, {} skipped",
            report.run_id,
            report.finished.len(),
            report.failed.len(),
            report.skipped.len()
        );

        Ok(report)
    }

    /// Reset every task named `name` to waiting; returns how many matched
    pub fn reset(&self, name: &str) -> usize {
        let matches: Vec<usize> = self.indices_of_name(name).collect();
        for &idx in &matches {
            self.tasks[idx].reset();
        }
        if matches.is_empty() {
            log::warn!("Reset requested for unknown task {}", name);
        }
        matches.len()
    }

    /// Recomputed per candidate: `failed` grows during a pass
    fn is_blocked(&self, idx: usize, failed: &[usize]) -> bool {
        !failed.is_empty() && self.reaches(failed, idx)
    }

    /// Names of tasks currently in `status`
    pub fn tasks_with_status(&self, status: TaskStatus) -> HashSet<String> {
        self.tasks
            .iter()
            .filter(|t| t.status() == status)
            .map(|t| t.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::TaskError;
    use crate::engine::task::{Task, TaskState};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock task that records its runs into a shared log
    struct MockTask {
        state: TaskState,
        succeed: bool,
        runs: AtomicUsize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl MockTask {
        fn new(name: &str, succeed: bool, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            let state = TaskState::new(name);
            state.arm();
            Arc::new(Self {
                state,
                succeed,
                runs: AtomicUsize::new(0),
                log: log.clone(),
            })
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Task for MockTask {
        fn name(&self) -> &str {
            self.state.name()
        }

        fn status(&self) -> TaskStatus {
            self.state.status()
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(self.name().to_string());
            let succeed = self.succeed;
            self.state
                .execute(async move {
                    if succeed {
                        Ok(())
                    } else {
                        Err(TaskError::failed("mock failure"))
                    }
                })
                .await;
        }

        fn reset(&self) {
            self.state.reset();
        }
    }

    fn as_task(task: &Arc<MockTask>) -> Arc<dyn Task> {
        task.clone()
    }

    #[tokio::test]
    async fn test_diamond_runs_everything_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let t: Vec<Arc<MockTask>> = (1..=5)
            .map(|i| MockTask::new(&format!("t{}", i), true, &log))
            .collect();

        let mut graph = WorkflowGraph::new();
        for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)] {
            assert!(graph
                .add_relation(&as_task(&t[from]), &as_task(&t[to]))
                .unwrap());
        }

        let report = graph.run().await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.finished.len(), 5);
        assert!(t.iter().all(|task| task.status() == TaskStatus::Finished));

        let ran = log.lock().unwrap().clone();
        assert_eq!(ran.first().map(String::as_str), Some("t1"));
        assert_eq!(ran.last().map(String::as_str), Some("t5"));
        let pos = |n: &str| ran.iter().position(|x| x == n).unwrap();
        assert!(pos("t2") < pos("t4") && pos("t3") < pos("t4"));
    }

    #[tokio::test]
    async fn test_failure_blocks_descendants_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = MockTask::new("a", false, &log);
        let b = MockTask::new("b", true, &log);
        let c = MockTask::new("c", true, &log);
        let sibling = MockTask::new("sibling", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_relation(&as_task(&a), &as_task(&b)).unwrap();
        graph.add_relation(&as_task(&b), &as_task(&c)).unwrap();
        graph.add_task(as_task(&sibling)).unwrap();

        let report = graph.run().await.unwrap();

        assert_eq!(a.status(), TaskStatus::Failed);
        assert_eq!(b.status(), TaskStatus::Waiting);
        assert_eq!(c.status(), TaskStatus::Waiting);
        assert_eq!(sibling.status(), TaskStatus::Finished);
        assert_eq!(b.runs(), 0);
        assert_eq!(c.runs(), 0);

        assert_eq!(report.failed, vec!["a"]);
        assert_eq!(report.skipped, vec!["b", "c"]);
        assert_eq!(report.finished, vec!["sibling"]);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_mid_pass_failure_blocks_later_descendants() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let root = MockTask::new("root", true, &log);
        let bad = MockTask::new("bad", false, &log);
        let good = MockTask::new("good", true, &log);
        let join = MockTask::new("join", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_relation(&as_task(&root), &as_task(&bad)).unwrap();
        graph.add_relation(&as_task(&root), &as_task(&good)).unwrap();
        graph.add_relation(&as_task(&bad), &as_task(&join)).unwrap();
        graph.add_relation(&as_task(&good), &as_task(&join)).unwrap();

        let report = graph.run().await.unwrap();

        assert_eq!(report.executed(), vec!["root", "good", "bad"]);
        assert_eq!(good.status(), TaskStatus::Finished);
        assert_eq!(join.status(), TaskStatus::Waiting);
        assert_eq!(report.skipped, vec!["join"]);
    }

    #[tokio::test]
    async fn test_isolated_task_runs_despite_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bad = MockTask::new("bad", false, &log);
        let lonely = MockTask::new("lonely", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_task(as_task(&bad)).unwrap();
        graph.add_task(as_task(&lonely)).unwrap();

        graph.run().await.unwrap();

        assert_eq!(bad.status(), TaskStatus::Failed);
        assert_eq!(lonely.status(), TaskStatus::Finished);
    }

    #[tokio::test]
    async fn test_second_run_ignores_terminal_tasks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = MockTask::new("a", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_task(as_task(&a)).unwrap();

        graph.run().await.unwrap();
        let report = graph.run().await.unwrap();

        assert_eq!(a.runs(), 1);
        assert_eq!(report.ignored, vec!["a"]);
        assert!(report.executed().is_empty());
    }

    #[tokio::test]
    async fn test_reset_rearms_failed_task() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = MockTask::new("a", false, &log);
        let b = MockTask::new("b", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_relation(&as_task(&a), &as_task(&b)).unwrap();

        graph.run().await.unwrap();
        assert_eq!(a.status(), TaskStatus::Failed);
        assert_eq!(a.runs(), 1);

        assert_eq!(graph.reset("a"), 1);
        assert_eq!(a.status(), TaskStatus::Waiting);

        let report = graph.run().await.unwrap();
        assert_eq!(a.runs(), 2);
        assert_eq!(report.failed, vec!["a"]);
        assert_eq!(report.skipped, vec!["b"]);
    }

    #[tokio::test]
    async fn test_task_left_running_counts_as_failed() {
        struct Stuck(TaskState);

        #[async_trait]
        impl Task for Stuck {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn status(&self) -> TaskStatus {
                self.0.status()
            }
            async fn run(&self) {
                // Never records an outcome
            }
            fn reset(&self) {
                self.0.reset();
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let stuck = TaskState::new("stuck");
        stuck.arm();
        let stuck: Arc<dyn Task> = Arc::new(Stuck(stuck));
        let next = MockTask::new("next", true, &log);

        let mut graph = WorkflowGraph::new();
        graph.add_relation(&stuck, &as_task(&next)).unwrap();

        let report = graph.run().await.unwrap();
        assert_eq!(report.failed, vec!["stuck"]);
        assert_eq!(report.skipped, vec!["next"]);
        assert_eq!(next.runs(), 0);
    }

    #[tokio::test]
    async fn test_reset_unknown_name() {
        let graph = WorkflowGraph::new();
        assert_eq!(graph.reset("ghost"), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_task_is_ignored() {
        struct Unconfigured(TaskState);

        #[async_trait]
        impl Task for Unconfigured {
            fn name(&self) -> &str {
                self.0.name()
            }
            fn status(&self) -> TaskStatus {
                self.0.status()
            }
            async fn run(&self) {
                panic!("run must not be called on an Init task");
            }
            fn reset(&self) {
                self.0.reset();
            }
        }

        let mut graph = WorkflowGraph::new();
        graph
            .add_task(Arc::new(Unconfigured(TaskState::new("idle"))))
            .unwrap();

        let report = graph.run().await.unwrap();
        assert_eq!(report.ignored, vec!["idle"]);
        assert_eq!(
            graph.tasks_with_status(TaskStatus::Init),
            HashSet::from(["idle".to_string()])
        );
    }
}
