// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the device (scheduler)
//! - the main runtime event loop that reacts to:
//!   - items being picked up and finished by the executor
//!   - artifacts touched by the watcher
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::plan::ItemId;
use crate::types::ItemOutcome;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, stop once the first build report has been produced. Watch
    /// mode sets this to false and keeps going.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the executor, watcher and signals.
///
/// The runtime consumes them one at a time; this channel is the single
/// point where device state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A worker acquired a slot and is about to run the item's command.
    ItemStarted { id: ItemId },
    /// The item's command exited.
    ItemFinished { id: ItemId, outcome: ItemOutcome },
    /// Artifacts changed on disk and must be rebuilt.
    ArtifactsTouched { paths: Vec<String> },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
