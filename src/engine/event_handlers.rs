// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::debug;

use crate::device::{BuildReport, Device, DeviceStep, ScheduledItem};
use crate::engine::RuntimeOptions;
use crate::errors::StallError;
use crate::plan::ItemId;
use crate::types::ItemOutcome;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these items to the executor.
    Dispatch(Vec<ScheduledItem>),
    /// The incomplete set drained; this is the run's completion signal.
    RunFinished(BuildReport),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

/// Seed the first run.
pub fn handle_start(device: &mut Device, options: &RuntimeOptions) -> Result<CoreStep, StallError> {
    let step = device.run()?;
    Ok(into_core_step(step, options))
}

pub fn handle_item_started(device: &mut Device, id: ItemId) -> CoreStep {
    device.started(id);
    CoreStep::idle()
}

pub fn handle_item_finished(
    device: &mut Device,
    options: &RuntimeOptions,
    id: ItemId,
    outcome: ItemOutcome,
) -> Result<CoreStep, StallError> {
    let step = device.completed(id, outcome)?;
    Ok(into_core_step(step, options))
}

/// Reopen touched artifacts and reschedule.
///
/// Touching nothing that has finished is a no-op; in particular it does not
/// re-emit a completion signal.
pub fn handle_artifacts_touched(
    device: &mut Device,
    options: &RuntimeOptions,
    paths: Vec<String>,
) -> Result<CoreStep, StallError> {
    let reopened = device.touch(&paths);
    if reopened.is_empty() {
        debug!(?paths, "touch matched no finished items");
        return Ok(CoreStep::idle());
    }

    let step = device.run()?;
    Ok(into_core_step(step, options))
}

fn into_core_step(step: DeviceStep, options: &RuntimeOptions) -> CoreStep {
    let mut commands = Vec::new();
    let mut keep_running = true;

    if !step.dispatched.is_empty() {
        commands.push(CoreCommand::Dispatch(step.dispatched));
    }
    if let Some(report) = step.finished {
        commands.push(CoreCommand::RunFinished(report));
        if options.exit_when_idle {
            keep_running = false;
        }
    }

    CoreStep {
        commands,
        keep_running,
    }
}
