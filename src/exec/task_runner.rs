// src/exec/task_runner.rs

//! Runs one work item's command.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::device::ScheduledItem;
use crate::engine::RuntimeEvent;
use crate::exec::ExecOptions;
use crate::types::ItemOutcome;

/// Run a single item and report it to the runtime.
///
/// Always emits `ItemStarted` followed by exactly one `ItemFinished`. A
/// command that cannot be spawned is reported as `Failed(-1)`.
pub async fn run_item(
    item: ScheduledItem,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    options: &ExecOptions,
) {
    if runtime_tx.send(RuntimeEvent::ItemStarted { id: item.id }).await.is_err() {
        debug!(task = %item.task, "runtime gone; not starting item");
        return;
    }

    let outcome = match run_command(&item, options).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(
                task = %item.task,
                command = %item.command,
                error = %err,
                "item execution error"
            );
            ItemOutcome::Failed(-1)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::ItemFinished {
            id: item.id,
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %item.task, "runtime gone; dropping completion");
    }
}

async fn run_command(item: &ScheduledItem, options: &ExecOptions) -> Result<ItemOutcome> {
    debug!(task = %item.task, output = %item.output, command = %item.command, "starting process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&item.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&item.command);
        c
    };

    cmd.current_dir(&options.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", item.task))?;

    let stdout = child.stdout.take().map(|s| forward_lines(item.task.clone(), "stdout", s));
    let stderr = child.stderr.take().map(|s| forward_lines(item.task.clone(), "stderr", s));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", item.task))?;

    // Drain the pipes so every line is logged before completion is reported.
    for handle in [stdout, stderr].into_iter().flatten() {
        let _ = handle.await;
    }

    if status.success() {
        if options.verbose {
            info!("{} | {}", item.task, item.command);
        }
        Ok(ItemOutcome::Success)
    } else {
        let code = status.code().unwrap_or(-1);
        debug!(task = %item.task, exit_code = code, "process exited unsuccessfully");
        Ok(ItemOutcome::Failed(code))
    }
}

fn forward_lines<R>(task: String, stream: &'static str, reader: R) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(task = %task, stream, "{}", line);
        }
    })
}
