// src/plan/trim.rs

//! Restrict a work order to what the requested targets need.

use std::collections::BTreeSet;

use tracing::debug;

use crate::errors::ManifestError;
use crate::plan::compile::{ItemId, WorkOrder};
use crate::plan::graph::WorkGraph;
use crate::plan::resolve::ResolvedTasks;

/// Check that every target names a declared task.
pub fn validate_targets(tasks: &ResolvedTasks, targets: &[String]) -> Result<(), ManifestError> {
    if targets.is_empty() {
        return Err(ManifestError::NoTargets);
    }

    let unknown: Vec<String> = targets.iter().filter(|t| !tasks.contains(t)).cloned().collect();
    if !unknown.is_empty() {
        return Err(ManifestError::UnknownTargets { targets: unknown });
    }

    Ok(())
}

/// Keep the targets' own work items and, transitively, every item that
/// produces something a kept item consumes. Ids are renumbered.
///
/// A target without a command has no items of its own; the producers of its
/// resolved inputs stand in for it.
pub fn trim_to_targets(
    order: &WorkOrder,
    tasks: &ResolvedTasks,
    targets: &[String],
) -> Result<WorkOrder, ManifestError> {
    validate_targets(tasks, targets)?;

    let mut seeds: BTreeSet<ItemId> = BTreeSet::new();
    for target in targets {
        seeds.extend(order.items().iter().filter(|i| &i.task == target).map(|i| i.id));

        if let Some(task) = tasks.get(target).filter(|t| !t.has_command()) {
            let wanted: BTreeSet<&str> = task.input_paths().collect();
            seeds.extend(
                order
                    .items()
                    .iter()
                    .filter(|i| i.output.as_path().is_some_and(|p| wanted.contains(p)))
                    .map(|i| i.id),
            );
        }
    }

    let keep = WorkGraph::from_order(order).ancestors(seeds);
    let trimmed = WorkOrder::from_items(
        order
            .items()
            .iter()
            .filter(|i| keep.contains(&i.id))
            .cloned(),
    );

    debug!(targets = ?targets, kept = trimmed.len(), total = order.len(), "trimmed work order");
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glob::StaticGlobExpander;
    use crate::manifest::{ManifestFormat, parse_manifest};
    use crate::plan::compile::compile;
    use crate::plan::normalize::normalize_all;
    use crate::plan::resolve::resolve;

    const MANIFEST: &str = r#"{
        "compile": {"input": "a.js", "output": "a.out", "command": "cc $(input) -o $(output)"},
        "bundle": {
            "input": {"task": "compile"},
            "output": "bundle.out",
            "command": "cat $(input) > $(output)"
        },
        "docs": {"input": "README", "output": "docs.html", "command": "md $(input)"},
        "all": {"input": {"tasks": ["bundle", "docs"]}}
    }"#;

    fn plan() -> (WorkOrder, ResolvedTasks) {
        let manifest = parse_manifest(MANIFEST, ManifestFormat::Json).unwrap();
        let normalized = normalize_all(manifest.tasks(), &StaticGlobExpander::new()).unwrap();
        let tasks = resolve(normalized).unwrap();
        (compile(&tasks).unwrap(), tasks)
    }

    fn task_names(order: &WorkOrder) -> Vec<&str> {
        order.items().iter().map(|i| i.task.as_str()).collect()
    }

    #[test]
    fn keeps_target_and_its_producers() {
        let (order, tasks) = plan();
        let trimmed = trim_to_targets(&order, &tasks, &["bundle".to_string()]).unwrap();
        assert_eq!(task_names(&trimmed), vec!["compile", "bundle"]);
        assert_eq!(trimmed.items()[1].id, ItemId(1));
    }

    #[test]
    fn leaf_target_keeps_only_itself() {
        let (order, tasks) = plan();
        let trimmed = trim_to_targets(&order, &tasks, &["docs".to_string()]).unwrap();
        assert_eq!(task_names(&trimmed), vec!["docs"]);
    }

    #[test]
    fn commandless_target_pulls_in_its_inputs() {
        let (order, tasks) = plan();
        let trimmed = trim_to_targets(&order, &tasks, &["all".to_string()]).unwrap();
        assert_eq!(task_names(&trimmed), vec!["compile", "bundle", "docs"]);
    }

    #[test]
    fn unknown_and_missing_targets_are_rejected() {
        let (order, tasks) = plan();
        assert_eq!(trim_to_targets(&order, &tasks, &[]), Err(ManifestError::NoTargets));
        let targets = ["nope".to_string(), "docs".to_string(), "gone".to_string()];
        assert_eq!(
            trim_to_targets(&order, &tasks, &targets),
            Err(ManifestError::UnknownTargets {
                targets: vec!["nope".into(), "gone".into()]
            })
        );
    }
}
