// SPDX-License-Identifier: MIT

use crate::taskflow::tasks::TaskFn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Named in-process callables that `kind: function` tasks bind to
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: Arc<RwLock<HashMap<String, TaskFn>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, name: impl Into<String>, function: TaskFn) {
        let mut functions = self.functions.write().await;
        functions.insert(name.into(), function);
    }

    pub async fn get(&self, name: &str) -> Option<TaskFn> {
        let functions = self.functions.read().await;
        functions.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let functions = self.functions.read().await;
        let mut names: Vec<String> = functions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
