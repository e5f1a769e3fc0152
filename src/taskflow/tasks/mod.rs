// SPDX-License-Identifier: MIT

//! Concrete task kinds
//!
//! - `SleepTask` - waits for a fixed duration
//! - `CommandTask` - runs a program or a shell script
//! - `FunctionTask` - calls an in-process closure
//!
//! Every kind starts in `Init` and becomes `Waiting` once its work is bound.

pub mod command;
pub mod function;
pub mod sleep;

pub use command::{CommandSpec, CommandTask};
pub use function::{FunctionTask, TaskFn};
pub use sleep::SleepTask;
