// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

use crate::engine::error::TaskError;
use crate::engine::task::{Task, TaskState, TaskStatus};

/// Program invocation bound to a `CommandTask`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// Task that runs an external program and succeeds on a zero exit status
pub struct CommandTask {
    state: TaskState,
    spec: Option<CommandSpec>,
}

impl CommandTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: TaskState::new(name),
            spec: None,
        }
    }

    /// Bind a program and its arguments
    pub fn set_command<I, S>(&mut self, program: &str, args: I) -> Result<(), TaskError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if program.trim().is_empty() {
            return Err(TaskError::InvalidConfig(format!(
                "command task '{}' needs a program",
                self.state.name()
            )));
        }

        self.spec = Some(CommandSpec {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
            timeout: None,
        });
        self.state.arm();
        Ok(())
    }

    /// Bind a script run through the platform shell
    pub fn set_script(&mut self, script: &str) -> Result<(), TaskError> {
        if script.trim().is_empty() {
            return Err(TaskError::InvalidConfig(format!(
                "shell task '{}' needs a script",
                self.state.name()
            )));
        }

        let (shell, flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        self.set_command(shell, [flag, script])
    }

    /// Kill the process and fail when it runs longer than `timeout`
    pub fn set_timeout(&mut self, timeout: Duration) {
        if let Some(spec) = self.spec.as_mut() {
            spec.timeout = Some(timeout);
        }
    }

    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        if let Some(spec) = self.spec.as_mut() {
            spec.working_dir = Some(dir.into());
        }
    }

    pub fn spec(&self) -> Option<&CommandSpec> {
        self.spec.as_ref()
    }
}

async fn run_command(spec: &CommandSpec) -> Result<(), TaskError> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    log::debug!("Spawning {} {:?}", spec.program, spec.args);

    let status = match spec.timeout {
        Some(limit) => tokio::time::timeout(limit, cmd.status())
            .await
            .map_err(|_| TaskError::Timeout {
                program: spec.program.clone(),
                secs: limit.as_secs_f64(),
            })?,
        None => cmd.status().await,
    }
    .map_err(|source| TaskError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(TaskError::ExitStatus {
            program: spec.program.clone(),
            code: status.code(),
        })
    }
}

#[async_trait]
impl Task for CommandTask {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn status(&self) -> TaskStatus {
        self.state.status()
    }

    async fn run(&self) {
        let spec = self.spec.clone();
        let name = self.state.name().to_string();
        self.state
            .execute(async move {
                let spec = spec.ok_or(TaskError::NotConfigured(name))?;
                run_command(&spec).await
            })
            .await;
    }

    fn reset(&self) {
        self.state.reset();
    }
}
