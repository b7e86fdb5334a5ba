// src/lib.rs

pub mod cli;
pub mod device;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod manifest;
pub mod plan;
pub mod types;
pub mod watch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::device::{BuildReport, Device};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::ManifestError;
use crate::exec::{ExecOptions, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::glob::FsGlobExpander;
use crate::manifest::{Manifest, load_from_path, locate_manifest};
use crate::plan::{WorkGraph, WorkOrder, trim_to_targets};
use crate::watch::event_handler::SourceSet;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest discovery and loading
/// - planning (normalize, resolve, compile, trim to targets)
/// - device / runtime
/// - executor
/// - (optional) file watcher
/// - Ctrl-C handling
///
/// Returns the last build report, or `None` for a dry run or a run that was
/// shut down before finishing.
pub async fn run(args: CliArgs) -> Result<Option<BuildReport>> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let manifest_path = locate_manifest(fs.as_ref(), args.manifest.as_deref(), &cwd)?;
    let manifest = load_from_path(fs.as_ref(), &manifest_path)?;
    let root = manifest_root(&manifest_path, &cwd);
    info!(manifest = %manifest_path.display(), tasks = manifest.len(), "loaded manifest");

    if args.targets.is_empty() {
        return Err(missing_targets(&mut io::stderr().lock(), &manifest)?.into());
    }

    let globber = FsGlobExpander::new(root.clone(), Arc::clone(&fs));
    let build_plan = plan::plan(&manifest, &globber)?;
    let order = trim_to_targets(&build_plan.order, &build_plan.tasks, &args.targets)?;
    debug!(items = order.len(), targets = ?args.targets, "work order ready");

    if args.dry_run {
        print_dry_run(&mut io::stdout().lock(), &order)?;
        return Ok(None);
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(
        rt_tx.clone(),
        ExecOptions {
            parallelism: args.parallel,
            verbose: args.verbose,
            working_dir: root.clone(),
        },
    );

    let _watcher_handle = if args.watch {
        let sources = SourceSet::new(order.source_paths());
        Some(watch::spawn_watcher(root.clone(), sources, rt_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        exit_when_idle: !args.watch,
    };
    let core = CoreRuntime::new(Device::new(order), options);
    let report = Runtime::new(core, rt_rx, executor).run().await?;
    Ok(report)
}

/// Directory commands run in and globs expand from.
fn manifest_root(manifest_path: &Path, cwd: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd.to_path_buf(),
    }
}

/// No target was named: show what could have been, on the error stream.
fn missing_targets(err: &mut impl Write, manifest: &Manifest) -> io::Result<ManifestError> {
    print_task_listing(err, manifest)?;
    writeln!(err)?;
    Ok(ManifestError::NoTargets)
}

/// List every task with its description, names padded to one column.
pub fn print_task_listing(out: &mut impl Write, manifest: &Manifest) -> io::Result<()> {
    let width = manifest.task_names().map(str::len).max().unwrap_or(0);
    writeln!(out, "Available tasks:")?;
    for (name, decl) in manifest.tasks() {
        match &decl.description {
            Some(desc) => writeln!(out, "  {name:<width$}  {desc}")?,
            None => writeln!(out, "  {name}")?,
        }
    }
    Ok(())
}

/// Print `task | command` for every item, producers before consumers.
pub fn print_dry_run(out: &mut impl Write, order: &WorkOrder) -> io::Result<()> {
    let ids = match WorkGraph::from_order(order).topological_order() {
        Some(ids) => ids,
        None => {
            warn!("work items depend on each other in a loop; listing in declaration order");
            order.ids().collect()
        }
    };

    for item in ids.into_iter().filter_map(|id| order.get(id)) {
        writeln!(out, "{} | {}", item.task, item.command)?;
    }
    debug!("dry-run complete (no execution)");
    Ok(())
}
