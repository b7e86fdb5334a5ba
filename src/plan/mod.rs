// src/plan/mod.rs

//! From manifest to work order.
//!
//! - [`normalize`]: flattens raw declarations and expands globs.
//! - [`resolve`]: closes cross-task references to a fixed point.
//! - [`compile`]: flattens tasks into work items with substituted commands.
//! - [`trim`]: restricts the work order to the requested targets.

pub mod compile;
pub mod graph;
pub mod normalize;
pub mod resolve;
pub mod template;
pub mod trim;
pub mod wildcard;

pub use compile::{ItemId, WorkItem, WorkOrder, compile};
pub use graph::WorkGraph;
pub use normalize::{ResolvedTask, normalize_all};
pub use resolve::{ResolvedTasks, resolve};
pub use trim::{trim_to_targets, validate_targets};

use crate::errors::ManifestError;
use crate::glob::GlobExpander;
use crate::manifest::Manifest;

/// The resolved tasks of a manifest and the work order compiled from them.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub tasks: ResolvedTasks,
    pub order: WorkOrder,
}

/// Normalize, resolve and compile a whole manifest.
pub fn plan(manifest: &Manifest, globber: &dyn GlobExpander) -> Result<BuildPlan, ManifestError> {
    let tasks = resolve(normalize_all(manifest.tasks(), globber)?)?;
    let order = compile(&tasks)?;
    Ok(BuildPlan { tasks, order })
}
