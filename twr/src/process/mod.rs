//! Process invocation for the task executable
//!
//! Every query and mutation goes through a [`CommandRunner`]. The production
//! implementation is [`TaskBinary`], which spawns the configured executable with
//! tokio; tests substitute a scripted runner.

mod invocation;
mod runner;

pub use invocation::Invocation;
pub use runner::{CommandRunner, TRACE_TARGET, TaskBinary};

#[cfg(test)]
pub use runner::mock;
