// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::device::{BuildReport, ScheduledItem};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the device in response to `RuntimeEvent`s, and delegates actual
/// command execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reports: Option<mpsc::UnboundedSender<BuildReport>>,
    last_report: Option<BuildReport>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reports: None,
            last_report: None,
        }
    }

    /// Also deliver every build report to `tx` as it is produced.
    pub fn with_report_sink(mut self, tx: mpsc::UnboundedSender<BuildReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Main event loop.
    ///
    /// Returns the most recent build report, or `None` when the loop ended
    /// (shutdown or closed channel) before any run finished.
    pub async fn run(mut self) -> Result<Option<BuildReport>> {
        info!("rube runtime started");

        let step = self.core.start()?;
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command).await?;
        }

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event)?;
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                keep_running = false;
            }
        }

        info!("runtime exiting");
        Ok(self.last_report)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(items) => self.dispatch(items).await?,
            CoreCommand::RunFinished(report) => {
                log_report(&report);
                if let Some(tx) = &self.reports {
                    if tx.send(report.clone()).is_err() {
                        debug!("report receiver dropped");
                    }
                }
                self.last_report = Some(report);
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, items: Vec<ScheduledItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let tasks: Vec<_> = items.iter().map(|i| i.task.as_str()).collect();
        debug!(?tasks, count = items.len(), "dispatching ready items");

        self.executor.dispatch(items).await
    }
}

fn log_report(report: &BuildReport) {
    for failed in &report.failed {
        warn!(
            task = %failed.task,
            command = %failed.command,
            exit_code = failed.exit_code,
            "failed"
        );
    }
    if !report.skipped_tasks.is_empty() {
        warn!(tasks = ?report.skipped_tasks, "skipped because of upstream failures");
    }
    if report.is_success() {
        info!(run_id = report.run_id, items = report.completed.len(), "build succeeded");
    } else {
        warn!(run_id = report.run_id, failed = report.failed.len(), "build failed");
    }
}
