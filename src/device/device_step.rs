// src/device/device_step.rs

//! Results handed back by the device after each state change.

use crate::device::item_info::ScheduledItem;
use crate::plan::ItemId;
use crate::types::TaskName;

/// A work item whose command failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub id: ItemId,
    pub task: TaskName,
    pub command: String,
    pub exit_code: i32,
}

/// Summary of one drain of the incomplete set. This is the completion
/// signal: it is produced exactly once per drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Monotonically increasing; a `touch` after completion starts a new run.
    pub run_id: u64,
    pub completed: Vec<ItemId>,
    pub failed: Vec<FailedItem>,
    pub skipped: Vec<ItemId>,
    /// Names of tasks with at least one skipped item, deduplicated.
    pub skipped_tasks: Vec<TaskName>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What changed as the result of one call into the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStep {
    /// Items marked Queued in this pass, in work-order order. The caller
    /// must hand all of them to the executor.
    pub dispatched: Vec<ScheduledItem>,
    /// Items moved to Skipped by a failure cascade in this step.
    pub skipped: Vec<ItemId>,
    /// Set when this step drained the incomplete set.
    pub finished: Option<BuildReport>,
}
