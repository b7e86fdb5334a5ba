// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ManifestError`]: the manifest cannot be turned into a work order.
//!   Always fatal, raised before anything executes.
//! - [`StallError`]: the scheduler found nothing ready while work remains and
//!   nothing is in flight. Fatal; it means a dependency edge was missed.
//! - Failing commands are *not* errors here. They are recovered by the
//!   scheduler's cascade-skip and show up in the build report.

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("cannot parse manifest: {0}")]
    Parse(String),

    #[error("unexpected input `{detail}` for task '{task}'")]
    MalformedReference { task: TaskName, detail: String },

    #[error("task '{task}' references unknown task '{reference}'")]
    UnknownTask { task: TaskName, reference: TaskName },

    #[error("task '{task}' declares both `command` and `multiCommand`")]
    ConflictingCommands { task: TaskName },

    #[error("task '{task}' runs a single command and must produce one output (resolved {count})")]
    TooManyOutputs { task: TaskName, count: usize },

    #[error(
        "multiCommand task '{task}' must map inputs to outputs 1:1 \
         ({inputs} inputs, {outputs} outputs)"
    )]
    MultiCommandMismatch {
        task: TaskName,
        inputs: usize,
        outputs: usize,
    },

    #[error("output '{output}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        output: String,
        first: TaskName,
        second: TaskName,
    },

    #[error("cannot derive output '{template}' for task '{task}': {detail}")]
    UnresolvedOutput {
        task: TaskName,
        template: String,
        detail: String,
    },

    #[error("invalid glob pattern '{pattern}' in task '{task}': {detail}")]
    InvalidGlob {
        task: TaskName,
        pattern: String,
        detail: String,
    },

    #[error("tasks cannot create a cycle: {}", .tasks.join(", "))]
    Cycle { tasks: Vec<TaskName> },

    #[error("must specify at least one target task")]
    NoTargets,

    #[error(
        "invalid target{} {}",
        if .targets.len() == 1 { "" } else { "s" },
        .targets.iter().map(|t| format!("'{t}'")).collect::<Vec<_>>().join(", ")
    )]
    UnknownTargets { targets: Vec<TaskName> },
}

/// The ready frontier is empty, nothing is queued or running, and yet work
/// remains.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "error processing queue: {} item(s) can never become ready (tasks: {})",
    .pending,
    .tasks.join(", ")
)]
pub struct StallError {
    pub pending: usize,
    pub tasks: Vec<TaskName>,
}

#[derive(Error, Debug)]
pub enum RubeError {
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Scheduler stalled: {0}")]
    Stall(#[from] StallError),

    #[error("Could not find Rubefile (searched {0})")]
    ManifestNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RubeError>;
