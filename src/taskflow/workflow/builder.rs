// SPDX-License-Identifier: MIT

//! Workflow builder - turns YAML definitions into runnable graphs
//!
//! Tasks are registered first, in file order, so that ties in the execution
//! order follow the order in which tasks are written. Dependencies are added
//! afterwards; an unknown name or a cycle aborts the build.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::error::{TaskError, TaskflowError, WorkflowError};
use crate::engine::graph::WorkflowGraph;
use crate::engine::task::Task;
use crate::taskflow::tasks::{CommandTask, FunctionTask, SleepTask};
use crate::taskflow::workflow::loader::WorkflowLoader;
use crate::taskflow::workflow::registry::FunctionRegistry;
use crate::taskflow::workflow::types::{TaskDefinition, TaskKind, WorkflowDefinition};

/// A built workflow: definition metadata plus its graph
pub struct Workflow {
    pub name: String,
    pub description: String,
    pub graph: WorkflowGraph,
}

/// High-level builder for constructing workflows from YAML definitions
pub struct Builder {
    loader: WorkflowLoader,
    registry: FunctionRegistry,
}

impl Builder {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            loader: WorkflowLoader::new(),
            registry,
        }
    }

    /// Build a workflow from a YAML file path
    pub async fn build_workflow<P: AsRef<Path>>(&self, path: P) -> Result<Workflow, TaskflowError> {
        let def = self.loader.load_workflow(path)?;
        self.build_from_def(&def).await
    }

    /// Build a workflow from a parsed definition
    pub async fn build_from_def(&self, def: &WorkflowDefinition) -> Result<Workflow, TaskflowError> {
        let mut graph = WorkflowGraph::new();

        for task_def in &def.tasks {
            let task = self.build_task(task_def).await?;
            graph.add_task(task)?;
        }

        for task_def in &def.tasks {
            for dep in task_def.depends_on.to_vec() {
                if graph.get(&dep).is_none() {
                    return Err(WorkflowError::InvalidDefinition(format!(
                        "task '{}' depends on unknown task '{}'",
                        task_def.name, dep
                    ))
                    .into());
                }
                if !graph.add_relation_by_name(&dep, &task_def.name)? {
                    return Err(
                        WorkflowError::CircularDependency(vec![dep, task_def.name.clone()]).into(),
                    );
                }
            }
        }

        log::info!(
            "Built workflow '{}' with {} tasks and {} dependencies",
            def.name,
            graph.len(),
            graph.edges().len()
        );

        Ok(Workflow {
            name: def.name.clone(),
            description: def.description.clone(),
            graph,
        })
    }

    async fn build_task(&self, def: &TaskDefinition) -> Result<Arc<dyn Task>, TaskflowError> {
        let task: Arc<dyn Task> = match &def.kind {
            TaskKind::Sleep { seconds } => Arc::new(SleepTask::with_secs(&def.name, *seconds)?),
            TaskKind::Command {
                command,
                args,
                timeout_secs,
                working_dir,
            } => {
                let mut task = CommandTask::new(&def.name);
                task.set_command(command, args.iter().cloned())?;
                configure_process(&mut task, *timeout_secs, working_dir.as_deref())?;
                Arc::new(task)
            }
            TaskKind::Shell {
                script,
                timeout_secs,
                working_dir,
            } => {
                let mut task = CommandTask::new(&def.name);
                task.set_script(script)?;
                configure_process(&mut task, *timeout_secs, working_dir.as_deref())?;
                Arc::new(task)
            }
            TaskKind::Function { function } => {
                let Some(work) = self.registry.get(function).await else {
                    log::error!(
                        "Function {} is not registered (available: {:?})",
                        function,
                        self.registry.names().await
                    );
                    return Err(WorkflowError::UnknownFunction(function.clone()).into());
                };
                let mut task = FunctionTask::new(&def.name);
                task.set_fn(work);
                Arc::new(task)
            }
        };

        log::debug!("Built task {} ({})", def.name, task.status());
        Ok(task)
    }
}

fn configure_process(
    task: &mut CommandTask,
    timeout_secs: Option<f64>,
    working_dir: Option<&str>,
) -> Result<(), TaskError> {
    if let Some(secs) = timeout_secs {
        let timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
            TaskError::InvalidConfig(format!("invalid timeout for '{}': {}", task.name(), secs))
        })?;
        task.set_timeout(timeout);
    }
    if let Some(dir) = working_dir {
        task.set_working_dir(dir);
    }
    Ok(())
}
