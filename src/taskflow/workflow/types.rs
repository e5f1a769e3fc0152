// SPDX-License-Identifier: MIT

//! YAML schema types for workflow definitions

use serde::{Deserialize, Serialize};

/// Top-level workflow definition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// A task in the workflow
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TaskDefinition {
    /// Unique task name
    pub name: String,
    /// Kind-specific configuration
    #[serde(flatten)]
    pub kind: TaskKind,
    /// Tasks that must run before this one
    #[serde(default)]
    pub depends_on: DependsOn,
}

/// Concrete task kind, selected by the `kind` field
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskKind {
    Sleep {
        seconds: f64,
    },
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        timeout_secs: Option<f64>,
        working_dir: Option<String>,
    },
    Shell {
        script: String,
        timeout_secs: Option<f64>,
        working_dir: Option<String>,
    },
    Function {
        function: String,
    },
}

/// Dependency specification (single name or list)
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(untagged)]
pub enum DependsOn {
    /// No dependencies (entry task)
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl DependsOn {
    /// Convert to a vector of task names
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            DependsOn::None => vec![],
            DependsOn::Single(s) => vec![s.clone()],
            DependsOn::Multiple(v) => v.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DependsOn::None => true,
            DependsOn::Single(_) => false,
            DependsOn::Multiple(v) => v.is_empty(),
        }
    }
}
