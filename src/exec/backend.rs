// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can swap in a fake executor that records what was dispatched
//! and emits `ItemStarted` / `ItemFinished` itself.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::device::ScheduledItem;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::exec::ExecOptions;

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled items are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch a batch of items for execution.
    ///
    /// Must not wait for the items to finish: completion is reported later
    /// through the runtime's event channel.
    fn dispatch(
        &mut self,
        items: Vec<ScheduledItem>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Wraps the worker pool started by [`spawn_executor`] and forwards items to
/// it over an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledItem>,
}

impl RealExecutorBackend {
    /// Start the worker pool, wired to the given runtime event sender.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, options: ExecOptions) -> Self {
        let tx = spawn_executor(runtime_tx, options);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch(
        &mut self,
        items: Vec<ScheduledItem>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for item in items {
                tx.send(item).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
