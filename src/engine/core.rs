// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces a list of commands describing
//! what the IO shell should do next.
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, sending `ScheduledItem`s to the executor and
//! handling Ctrl-C. The core has no Tokio types and performs no IO.

use crate::device::Device;
use crate::engine::event_handlers::{
    CoreStep, handle_artifacts_touched, handle_item_finished, handle_item_started, handle_start,
};
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::errors::StallError;

#[derive(Debug)]
pub struct CoreRuntime {
    device: Device,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(device: Device, options: RuntimeOptions) -> Self {
        Self { device, options }
    }

    /// Compute the first ready frontier.
    pub fn start(&mut self) -> Result<CoreStep, StallError> {
        handle_start(&mut self.device, &self.options)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> Result<CoreStep, StallError> {
        match event {
            RuntimeEvent::ItemStarted { id } => Ok(handle_item_started(&mut self.device, id)),
            RuntimeEvent::ItemFinished { id, outcome } => {
                handle_item_finished(&mut self.device, &self.options, id, outcome)
            }
            RuntimeEvent::ArtifactsTouched { paths } => {
                handle_artifacts_touched(&mut self.device, &self.options, paths)
            }
            RuntimeEvent::ShutdownRequested => Ok(CoreStep {
                commands: Vec::new(),
                keep_running: false,
            }),
        }
    }
}
