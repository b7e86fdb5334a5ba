// src/device/item_info.rs

//! Per-item scheduling state and dispatch descriptors.

use crate::plan::{ItemId, WorkItem};
use crate::types::{Artifact, TaskName};

/// Lifecycle of one work item.
///
/// `Pending -> Queued -> Running -> {Completed | Failed}`. `Skipped` is only
/// reached through a failure cascade. `touch` returns any terminal state to
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Queued,
    Running,
    Completed,
    /// Command exited unsuccessfully with this code.
    Failed(i32),
    Skipped,
}

impl ItemState {
    /// Handed to the executor and not yet reported back.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ItemState::Queued | ItemState::Running)
    }
}

/// A work item the device wants executed now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledItem {
    pub id: ItemId,
    pub task: TaskName,
    pub command: String,
    pub output: Artifact,
}

impl ScheduledItem {
    pub fn from_work_item(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            task: item.task.clone(),
            command: item.command.clone(),
            output: item.output.clone(),
        }
    }
}
