// src/plan/resolve.rs

//! Dependency resolver.
//!
//! Repeatedly replaces cross-task references with the referenced tasks'
//! resolved outputs until every task is `ready`. A reference is only
//! substituted once *all* of the tasks it names are ready, so tasks unlock in
//! dependency order. A pass that readies nothing while tasks remain means the
//! remaining tasks reference each other: that is reported as a cycle.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::ManifestError;
use crate::plan::normalize::{OutputTemplate, PendingInput, ResolvedTask};
use crate::plan::wildcard::has_placeholder;
use crate::types::TaskName;

/// The closed set of tasks after resolution, in declaration order, indexed
/// by name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTasks {
    tasks: Vec<ResolvedTask>,
    index: HashMap<TaskName, usize>,
}

impl ResolvedTasks {
    fn from_vec(tasks: Vec<ResolvedTask>) -> Self {
        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self { tasks, index }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedTask> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTask> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Close every reference in `tasks`.
///
/// Each pass computes replacement records from the previous pass's state,
/// so the order tasks are visited in within a pass has no effect.
pub fn resolve(tasks: Vec<ResolvedTask>) -> Result<ResolvedTasks, ManifestError> {
    let mut set = ResolvedTasks::from_vec(tasks);
    check_references(&set)?;

    let mut pending: Vec<usize> = (0..set.tasks.len()).filter(|&i| !set.tasks[i].ready).collect();
    let mut pass = 0usize;

    while !pending.is_empty() {
        pass += 1;
        let before = pending.len();

        let updates = pending
            .iter()
            .map(|&i| resolve_step(&set.tasks[i], &set).map(|next| (i, next)))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, next) in updates {
            set.tasks[i] = next;
        }
        pending.retain(|&i| !set.tasks[i].ready);

        debug!(
            pass,
            resolved = before - pending.len(),
            remaining = pending.len(),
            "resolution pass finished"
        );

        if pending.len() == before {
            let tasks = pending.iter().map(|&i| set.tasks[i].name.clone()).collect();
            return Err(ManifestError::Cycle { tasks });
        }
    }

    Ok(set)
}

/// Every referenced task must exist.
fn check_references(set: &ResolvedTasks) -> Result<(), ManifestError> {
    for task in &set.tasks {
        for input in &task.inputs {
            if let PendingInput::Reference(r) = input {
                if let Some(missing) = r.names().iter().find(|n| !set.contains(n)) {
                    return Err(ManifestError::UnknownTask {
                        task: task.name.clone(),
                        reference: missing.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// One resolution step for a not-ready task: substitute every reference
/// whose producers are all ready, then finalise outputs if nothing is left
/// unresolved.
fn resolve_step(task: &ResolvedTask, set: &ResolvedTasks) -> Result<ResolvedTask, ManifestError> {
    let mut inputs = Vec::with_capacity(task.inputs.len());

    for input in &task.inputs {
        match input {
            PendingInput::Path(_) => inputs.push(input.clone()),
            PendingInput::Reference(r) => {
                let producers: Vec<&ResolvedTask> =
                    r.names().iter().filter_map(|n| set.get(n)).collect();
                if producers.iter().all(|p| p.ready) {
                    for producer in producers {
                        inputs.extend(producer.outputs.iter().cloned().map(PendingInput::Path));
                    }
                } else {
                    inputs.push(input.clone());
                }
            }
        }
    }

    let ready = inputs.iter().all(|i| i.as_path().is_some());
    let outputs = if ready {
        literal_outputs(task, &inputs)?
    } else {
        Vec::new()
    };

    Ok(ResolvedTask {
        inputs,
        outputs,
        ready,
        ..task.clone()
    })
}

/// Outputs of a task whose input was not a single glob: the declared paths,
/// verbatim. A leftover wildcard has nothing to be filled from. A task that
/// ends up with no inputs has no outputs either.
fn literal_outputs(
    task: &ResolvedTask,
    inputs: &[PendingInput],
) -> Result<Vec<String>, ManifestError> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }
    match &task.output {
        OutputTemplate::None => Ok(Vec::new()),
        OutputTemplate::Paths(paths) => Ok(paths.clone()),
        OutputTemplate::Template(t) if has_placeholder(t) => Err(ManifestError::UnresolvedOutput {
            task: task.name.clone(),
            template: t.clone(),
            detail: "a wildcard output needs a single glob pattern as input".to_string(),
        }),
        OutputTemplate::Template(t) => Ok(vec![t.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glob::StaticGlobExpander;
    use crate::manifest::{ManifestFormat, parse_manifest};
    use crate::plan::normalize::normalize_all;

    fn resolve_json(
        json: &str,
        globber: &StaticGlobExpander,
    ) -> Result<ResolvedTasks, ManifestError> {
        let manifest = parse_manifest(json, ManifestFormat::Json).unwrap();
        resolve(normalize_all(manifest.tasks(), globber)?)
    }

    #[test]
    fn literal_tasks_resolve_in_one_pass_and_stay_put() {
        let set = resolve_json(
            r#"{
                "a": {"input": "a.js", "output": "a.out"},
                "b": {"input": ["x", "y"], "output": "b.out"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();

        let a = set.get("a").unwrap();
        assert!(a.ready);
        assert_eq!(a.outputs, vec!["a.out"]);

        // Resolving an already-closed set changes nothing.
        let again = resolve(set.iter().cloned().collect()).unwrap();
        assert_eq!(
            again.iter().cloned().collect::<Vec<_>>(),
            set.iter().cloned().collect::<Vec<_>>()
        );
    }

    #[test]
    fn reference_is_replaced_by_producer_outputs() {
        let g = StaticGlobExpander::new().with_pattern("src/*.c", ["src/a.c", "src/b.c"]);
        let set = resolve_json(
            r#"{
                "link": {
                    "input": [{"task": "compile"}, "main.o"],
                    "output": "app",
                    "command": "ld"
                },
                "compile": {"input": "src/*.c", "output": "obj/*.o", "multiCommand": "cc"}
            }"#,
            &g,
        )
        .unwrap();

        let link = set.get("link").unwrap();
        assert!(link.ready);
        assert_eq!(
            link.input_paths().collect::<Vec<_>>(),
            vec!["obj/a.o", "obj/b.o", "main.o"]
        );
        assert_eq!(link.outputs, vec!["app"]);
    }

    #[test]
    fn multi_task_reference_waits_for_all_producers() {
        let set = resolve_json(
            r#"{
                "all": {"input": {"tasks": ["b", "a"]}, "output": "all.txt"},
                "a": {"input": "a.in", "output": "a.out"},
                "b": {"input": {"task": "a"}, "output": "b.out"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();

        let all = set.get("all").unwrap();
        assert_eq!(all.input_paths().collect::<Vec<_>>(), vec!["b.out", "a.out"]);
        // declaration order survives
        let names: Vec<_> = set.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["all", "a", "b"]);
    }

    #[test]
    fn mutual_references_are_a_cycle_naming_both() {
        let err = resolve_json(
            r#"{
                "a": {"input": {"task": "b"}, "output": "a.out"},
                "b": {"input": {"task": "a"}, "output": "b.out"},
                "c": {"input": "c.in", "output": "c.out"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ManifestError::Cycle {
                tasks: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = resolve_json(r#"{"a": {"input": {"task": "a"}}}"#, &StaticGlobExpander::new())
            .unwrap_err();
        assert_eq!(
            err,
            ManifestError::Cycle {
                tasks: vec!["a".into()]
            }
        );
    }

    #[test]
    fn unknown_reference_is_reported() {
        let err = resolve_json(r#"{"a": {"input": {"task": "nope"}}}"#, &StaticGlobExpander::new())
            .unwrap_err();
        assert_eq!(
            err,
            ManifestError::UnknownTask {
                task: "a".into(),
                reference: "nope".into()
            }
        );
    }

    #[test]
    fn empty_glob_still_resolves() {
        let set = resolve_json(
            r#"{"docs": {"input": "docs/*.md", "output": "site/*.html", "multiCommand": "md"}}"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();
        let docs = set.get("docs").unwrap();
        assert!(docs.ready && docs.inputs.is_empty() && docs.outputs.is_empty());
    }

    #[test]
    fn wildcard_output_without_glob_input_is_rejected() {
        let err = resolve_json(
            r#"{
                "a": {"input": "a.in", "output": "a.out"},
                "b": {"input": {"task": "a"}, "output": "b/*.min"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::UnresolvedOutput { ref task, .. } if task == "b"));
    }
}
