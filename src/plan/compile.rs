// src/plan/compile.rs

//! Work-order compiler: flattens resolved tasks into atomic work items, one
//! per produced output, with fully substituted commands.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::errors::ManifestError;
use crate::plan::normalize::{ExecSpec, ResolvedTask};
use crate::plan::resolve::ResolvedTasks;
use crate::plan::template::substitute;
use crate::types::{Artifact, TaskName};

/// Position of a work item within its [`WorkOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The atomic unit of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: ItemId,
    pub task: TaskName,
    pub inputs: Vec<String>,
    pub output: Artifact,
    pub command: String,
}

impl WorkItem {
    pub fn consumes(&self, path: &str) -> bool {
        self.inputs.iter().any(|i| i == path)
    }

    /// Whether invalidating `artifact` reaches this item: it either reads
    /// the artifact or produces it.
    pub fn is_affected_by(&self, artifact: &Artifact) -> bool {
        self.output == *artifact || artifact.as_path().is_some_and(|p| self.consumes(p))
    }
}

/// Every work item of a run, in declaration order. Immutable once compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrder {
    items: Vec<WorkItem>,
}

impl WorkOrder {
    /// Build an order from items, renumbering ids to match positions.
    pub fn from_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| WorkItem { id: ItemId(i), ..item })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|i| i.id)
    }

    /// Inputs that no work item produces: the files the build reads but
    /// never writes.
    pub fn source_paths(&self) -> BTreeSet<String> {
        let produced: HashSet<&str> = self
            .items
            .iter()
            .filter_map(|i| i.output.as_path())
            .collect();
        self.items
            .iter()
            .flat_map(|i| i.inputs.iter())
            .filter(|p| !produced.contains(p.as_str()))
            .cloned()
            .collect()
    }
}

/// Compile the resolved task set into a work order.
pub fn compile(tasks: &ResolvedTasks) -> Result<WorkOrder, ManifestError> {
    let mut items = Vec::new();
    for task in tasks.iter() {
        items.extend(compile_task(task)?);
    }

    check_single_producer(&items)?;

    let order = WorkOrder::from_items(items);
    debug!(items = order.len(), "compiled work order");
    Ok(order)
}

fn compile_task(task: &ResolvedTask) -> Result<Vec<WorkItem>, ManifestError> {
    let inputs: Vec<String> = task.input_paths().map(str::to_string).collect();

    let items = match &task.exec {
        ExecSpec::None => Vec::new(),
        ExecSpec::Single(template) => {
            let output = match task.outputs.as_slice() {
                [] => Artifact::Aggregate(task.name.clone()),
                [one] => Artifact::Path(one.clone()),
                many => {
                    return Err(ManifestError::TooManyOutputs {
                        task: task.name.clone(),
                        count: many.len(),
                    });
                }
            };
            vec![item(task, inputs, output, template)]
        }
        ExecSpec::Multi(template) => {
            if inputs.len() != task.outputs.len() {
                return Err(ManifestError::MultiCommandMismatch {
                    task: task.name.clone(),
                    inputs: inputs.len(),
                    outputs: task.outputs.len(),
                });
            }
            inputs
                .into_iter()
                .zip(task.outputs.iter())
                .map(|(input, output)| {
                    item(task, vec![input], Artifact::Path(output.clone()), template)
                })
                .collect()
        }
    };

    Ok(items)
}

fn item(task: &ResolvedTask, inputs: Vec<String>, output: Artifact, template: &str) -> WorkItem {
    let command = substitute(template, &inputs, &output);
    WorkItem {
        id: ItemId(0),
        task: task.name.clone(),
        inputs,
        output,
        command,
    }
}

fn check_single_producer(items: &[WorkItem]) -> Result<(), ManifestError> {
    let mut producers: HashMap<&Artifact, &str> = HashMap::new();
    for item in items {
        if let Some(first) = producers.insert(&item.output, item.task.as_str()) {
            return Err(ManifestError::DuplicateProducer {
                output: item.output.to_string(),
                first: first.to_string(),
                second: item.task.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glob::StaticGlobExpander;
    use crate::manifest::{ManifestFormat, parse_manifest};
    use crate::plan::normalize::normalize_all;
    use crate::plan::resolve::resolve;

    fn compile_json(json: &str, g: &StaticGlobExpander) -> Result<WorkOrder, ManifestError> {
        let manifest = parse_manifest(json, ManifestFormat::Json).unwrap();
        compile(&resolve(normalize_all(manifest.tasks(), g)?)?)
    }

    #[test]
    fn single_command_gets_all_inputs_and_one_output() {
        let order = compile_json(
            r#"{"bundle": {
                "input": ["a.js", "b.js"],
                "output": "app.js",
                "command": "cat $(inputs) > $(output)"
            }}"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();

        assert_eq!(order.len(), 1);
        let item = &order.items()[0];
        assert_eq!(item.inputs, vec!["a.js", "b.js"]);
        assert_eq!(item.output, Artifact::Path("app.js".into()));
        assert_eq!(item.command, "cat a.js b.js > app.js");
    }

    #[test]
    fn single_command_without_outputs_is_an_aggregate() {
        let order = compile_json(
            r#"{"all": {"input": ["x"], "command": "echo done"}}"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();
        assert_eq!(order.items()[0].output, Artifact::Aggregate("all".into()));
    }

    #[test]
    fn single_command_with_many_outputs_fails() {
        let g = StaticGlobExpander::new().with_pattern("src/*.txt", ["src/a.txt", "src/b.txt"]);
        let err = compile_json(
            r#"{"conv": {"input": "src/*.txt", "output": "build/*.out", "command": "conv"}}"#,
            &g,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ManifestError::TooManyOutputs {
                task: "conv".into(),
                count: 2
            }
        );
    }

    #[test]
    fn multi_command_fans_out_positionally() {
        let g = StaticGlobExpander::new().with_pattern("src/*.txt", ["src/a.txt", "src/b.txt"]);
        let order = compile_json(
            r#"{"conv": {
                "input": "src/*.txt",
                "output": "build/*.out",
                "multiCommand": "conv $(input) -o $(output)"
            }}"#,
            &g,
        )
        .unwrap();

        let pairs: Vec<_> = order
            .items()
            .iter()
            .map(|i| format!("{} -> {}: {}", i.inputs.join(" "), i.output, i.command))
            .collect();
        assert_eq!(
            pairs,
            vec![
                "src/a.txt -> build/a.out: conv src/a.txt -o build/a.out",
                "src/b.txt -> build/b.out: conv src/b.txt -o build/b.out",
            ]
        );
        assert_eq!(order.items()[1].id, ItemId(1));
    }

    #[test]
    fn multi_command_length_mismatch_fails() {
        let err = compile_json(
            r#"{"m": {"input": ["a", "b", "c"], "output": ["x", "y"], "multiCommand": "m"}}"#,
            &StaticGlobExpander::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ManifestError::MultiCommandMismatch {
                task: "m".into(),
                inputs: 3,
                outputs: 2
            }
        );
    }

    #[test]
    fn commandless_tasks_yield_nothing_but_still_feed_references() {
        let order = compile_json(
            r#"{
                "sources": {"input": ["a.c"], "output": ["a.c"]},
                "build": {"input": {"task": "sources"}, "output": "a.o", "command": "cc $(input)"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();
        assert_eq!(order.len(), 1);
        assert_eq!(order.items()[0].command, "cc a.c");
    }

    #[test]
    fn two_producers_of_one_output_is_an_error() {
        let err = compile_json(
            r#"{
                "a": {"input": "x", "output": "o", "command": "a"},
                "b": {"input": "y", "output": "o", "command": "b"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ManifestError::DuplicateProducer {
                output: "o".into(),
                first: "a".into(),
                second: "b".into()
            }
        );
    }

    #[test]
    fn source_paths_exclude_produced_files() {
        let order = compile_json(
            r#"{
                "compile": {"input": "a.js", "output": "a.out", "command": "cc"},
                "bundle": {"input": {"task": "compile"}, "output": "bundle.out", "command": "cat"}
            }"#,
            &StaticGlobExpander::new(),
        )
        .unwrap();
        assert_eq!(order.source_paths().into_iter().collect::<Vec<_>>(), vec!["a.js"]);
    }
}
