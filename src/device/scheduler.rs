// src/device/scheduler.rs

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::device::device_step::{BuildReport, DeviceStep, FailedItem};
use crate::device::item_info::{ItemState, ScheduledItem};
use crate::device::partition::{Partition, cascade_skip, touch_forward};
use crate::errors::StallError;
use crate::plan::{ItemId, WorkOrder};
use crate::types::{ItemOutcome, TaskName};

/// The scheduler: owns the work order and decides what runs next.
///
/// It never executes anything. The caller dispatches what [`Device::run`]
/// returns and reports back through [`Device::started`] and
/// [`Device::completed`], which are the only places item state changes.
#[derive(Debug)]
pub struct Device {
    order: WorkOrder,
    partition: Partition,
    states: Vec<ItemState>,
    /// Items that belong to the current run (initially all of them; after
    /// completion, only what a touch reopened).
    in_run: BTreeSet<ItemId>,
    run_counter: u64,
    completion_sent: bool,
}

impl Device {
    pub fn new(order: WorkOrder) -> Self {
        let partition = Partition::new(&order);
        let states = vec![ItemState::Pending; order.len()];
        let in_run = order.ids().collect();
        Self {
            order,
            partition,
            states,
            in_run,
            run_counter: 1,
            completion_sent: false,
        }
    }

    pub fn state_of(&self, id: ItemId) -> Option<ItemState> {
        self.states.get(id.0).copied()
    }

    /// Items queued or running.
    pub fn in_flight(&self) -> usize {
        self.states.iter().filter(|s| s.is_in_flight()).count()
    }

    pub fn is_drained(&self) -> bool {
        self.partition.is_drained()
    }

    /// Queue every item on the ready frontier.
    ///
    /// Emits the build report when the incomplete set is empty and it has
    /// not been emitted for this run yet. Fails when work remains but
    /// nothing is ready or in flight.
    pub fn run(&mut self) -> Result<DeviceStep, StallError> {
        let mut step = DeviceStep::default();

        if self.partition.is_drained() {
            if !self.completion_sent {
                self.completion_sent = true;
                let report = self.report();
                info!(
                    run_id = report.run_id,
                    completed = report.completed.len(),
                    failed = report.failed.len(),
                    skipped = report.skipped.len(),
                    "build finished"
                );
                step.finished = Some(report);
            }
            return Ok(step);
        }

        let sources = self.partition.sources(&self.order);
        let ready: Vec<ItemId> = self
            .partition
            .incomplete
            .iter()
            .copied()
            .filter(|&id| self.states[id.0] == ItemState::Pending)
            .filter(|&id| {
                self.order
                    .get(id)
                    .is_some_and(|item| item.inputs.iter().all(|p| sources.contains(p.as_str())))
            })
            .collect();

        for &id in &ready {
            self.states[id.0] = ItemState::Queued;
            if let Some(item) = self.order.get(id) {
                debug!(item = %id, task = %item.task, output = %item.output, "queued");
                step.dispatched.push(ScheduledItem::from_work_item(item));
            }
        }

        if step.dispatched.is_empty() && self.in_flight() == 0 {
            return Err(self.stall());
        }

        Ok(step)
    }

    /// The executor picked the item up.
    pub fn started(&mut self, id: ItemId) {
        match self.states.get_mut(id.0) {
            Some(state) if *state == ItemState::Queued => *state = ItemState::Running,
            Some(state) => {
                warn!(item = %id, state = ?state, "start for item that is not queued; ignoring")
            }
            None => warn!(item = %id, "start for unknown item; ignoring"),
        }
    }

    /// Record an item's outcome and schedule whatever it unlocked.
    ///
    /// A failure moves every incomplete item downstream of the failed
    /// item's output to Skipped before rescheduling, so unrelated branches
    /// keep going.
    pub fn completed(
        &mut self,
        id: ItemId,
        outcome: ItemOutcome,
    ) -> Result<DeviceStep, StallError> {
        match self.states.get(id.0) {
            Some(state) if state.is_in_flight() => {}
            Some(state) => {
                warn!(
                    item = %id,
                    state = ?state,
                    "completion for item that is not in flight; ignoring"
                );
                return Ok(DeviceStep::default());
            }
            None => {
                warn!(item = %id, "completion for unknown item; ignoring");
                return Ok(DeviceStep::default());
            }
        }

        self.partition.finish(id);
        let mut skipped = Vec::new();

        match outcome {
            ItemOutcome::Success => {
                self.states[id.0] = ItemState::Completed;
                debug!(item = %id, "completed");
            }
            ItemOutcome::Failed(code) => {
                self.states[id.0] = ItemState::Failed(code);
                if let Some(item) = self.order.get(id) {
                    warn!(
                        task = %item.task,
                        command = %item.command,
                        exit_code = code,
                        "task failed"
                    );

                    let partition = std::mem::take(&mut self.partition);
                    let (partition, moved) = cascade_skip(&self.order, partition, &item.output);
                    self.partition = partition;
                    for &skip in &moved {
                        self.states[skip.0] = ItemState::Skipped;
                    }
                    if !moved.is_empty() {
                        warn!("Skipping dependent tasks: {}", self.task_names(&moved).join(", "));
                    }
                    skipped = moved;
                }
            }
        }

        let mut step = self.run()?;
        step.skipped = skipped;
        Ok(step)
    }

    /// Invalidate artifacts: every finished item that reads or writes one of
    /// `paths`, and transitively everything downstream of it, returns to
    /// Pending. Call [`Device::run`] afterwards.
    ///
    /// Items still in flight are left alone.
    pub fn touch(&mut self, paths: &[String]) -> Vec<ItemId> {
        let partition = std::mem::take(&mut self.partition);
        let (partition, moved) = touch_forward(&self.order, partition, paths);
        self.partition = partition;

        if moved.is_empty() {
            return moved;
        }

        if self.completion_sent {
            self.completion_sent = false;
            self.run_counter += 1;
            self.in_run.clear();
        }
        for &id in &moved {
            self.states[id.0] = ItemState::Pending;
            self.in_run.insert(id);
        }

        info!(
            run_id = self.run_counter,
            paths = ?paths,
            reopened = moved.len(),
            "artifacts touched"
        );
        moved
    }

    /// Report for the current run as it stands.
    pub fn report(&self) -> BuildReport {
        let mut report = BuildReport {
            run_id: self.run_counter,
            ..BuildReport::default()
        };

        for &id in &self.in_run {
            let Some(item) = self.order.get(id) else { continue };
            match self.states[id.0] {
                ItemState::Completed => report.completed.push(id),
                ItemState::Failed(exit_code) => report.failed.push(FailedItem {
                    id,
                    task: item.task.clone(),
                    command: item.command.clone(),
                    exit_code,
                }),
                ItemState::Skipped => report.skipped.push(id),
                ItemState::Pending | ItemState::Queued | ItemState::Running => {}
            }
        }
        report.skipped_tasks = self.task_names(&report.skipped);

        report
    }

    fn stall(&self) -> StallError {
        let pending: Vec<ItemId> = self.partition.incomplete.iter().copied().collect();
        StallError {
            pending: pending.len(),
            tasks: self.task_names(&pending),
        }
    }

    /// Distinct task names of `ids`, in first-seen order.
    fn task_names(&self, ids: &[ItemId]) -> Vec<TaskName> {
        let mut names: Vec<TaskName> = Vec::new();
        for item in ids.iter().filter_map(|&id| self.order.get(id)) {
            if !names.contains(&item.task) {
                names.push(item.task.clone());
            }
        }
        names
    }
}
