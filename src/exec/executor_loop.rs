// src/exec/executor_loop.rs

//! Bounded worker pool.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info};

use crate::device::ScheduledItem;
use crate::engine::RuntimeEvent;
use crate::exec::ExecOptions;
use crate::exec::task_runner::run_item;

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards items into.
/// Each item runs in its own Tokio task, but only after acquiring one of
/// `options.parallelism` semaphore permits. The permit is held until the
/// item's `ItemFinished` event has been sent, so the runtime never observes
/// more than `parallelism` items between `ItemStarted` and `ItemFinished`.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: ExecOptions,
) -> mpsc::Sender<ScheduledItem> {
    let (tx, mut rx) = mpsc::channel::<ScheduledItem>(64);
    let permits = Arc::new(Semaphore::new(options.parallelism.get()));
    let options = Arc::new(options);

    tokio::spawn(async move {
        info!(parallelism = options.parallelism.get(), "executor loop started");

        while let Some(item) = rx.recv().await {
            let permits = Arc::clone(&permits);
            let runtime_tx = runtime_tx.clone();
            let options = Arc::clone(&options);

            tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    debug!(item = %item.id, "worker pool closed before item could start");
                    return;
                };
                run_item(item, &runtime_tx, &options).await;
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
