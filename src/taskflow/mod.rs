// SPDX-License-Identifier: MIT

pub mod tasks;
pub mod workflow;
