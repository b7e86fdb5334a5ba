// src/types.rs

//! Shared vocabulary used across planning, scheduling and execution.

use std::fmt;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Something a work item produces.
///
/// Most work items produce a file. A task that runs a command but declares no
/// outputs still needs a place in the graph, so it produces a synthetic
/// aggregate marker named after the task instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    Path(String),
    Aggregate(TaskName),
}

impl Artifact {
    /// The literal path, if this artifact is a real file.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Artifact::Path(p) => Some(p),
            Artifact::Aggregate(_) => None,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Path(p) => f.write_str(p),
            Artifact::Aggregate(task) => write!(f, "{{task: {task}}}"),
        }
    }
}

/// Outcome of executing one work item's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,
    /// Command failed; carries the exit code (`-1` when the process could
    /// not be spawned or was killed by a signal).
    Failed(i32),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success)
    }
}
