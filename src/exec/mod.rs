// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the commands of scheduled work items with `tokio::process::Command`
//! and reports back to the runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the bounded worker pool.
//! - [`task_runner`] runs one item's command.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`, which tests replace with a fake.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

use std::num::NonZeroUsize;
use std::path::PathBuf;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;

/// Knobs for the production executor.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Maximum number of commands running at once.
    pub parallelism: NonZeroUsize,
    /// Log every successful command, not only failures.
    pub verbose: bool,
    /// Directory commands run in (the manifest's directory).
    pub working_dir: PathBuf,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            parallelism: NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN),
            verbose: false,
            working_dir: PathBuf::from("."),
        }
    }
}
