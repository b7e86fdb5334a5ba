// src/device/partition.rs

//! The incomplete/complete split of a work order, and the two forward
//! propagations over it.
//!
//! Both propagations are pure: they take a partition by value and return
//! the new one together with the items they moved. Traversal uses an
//! explicit worklist of artifacts.

use std::collections::{BTreeSet, HashSet};

use crate::plan::{ItemId, WorkItem, WorkOrder};
use crate::types::Artifact;

/// Every item of the work order is in exactly one of the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub incomplete: BTreeSet<ItemId>,
    pub complete: BTreeSet<ItemId>,
}

impl Partition {
    /// All items start incomplete.
    pub fn new(order: &WorkOrder) -> Self {
        Self {
            incomplete: order.ids().collect(),
            complete: BTreeSet::new(),
        }
    }

    pub fn finish(&mut self, id: ItemId) {
        self.incomplete.remove(&id);
        self.complete.insert(id);
    }

    pub fn is_drained(&self) -> bool {
        self.incomplete.is_empty()
    }

    /// Inputs of incomplete items that no incomplete item produces.
    pub fn sources<'a>(&self, order: &'a WorkOrder) -> HashSet<&'a str> {
        let items: Vec<&WorkItem> = self
            .incomplete
            .iter()
            .filter_map(|&id| order.get(id))
            .collect();
        let produced: HashSet<&str> = items.iter().filter_map(|i| i.output.as_path()).collect();
        items
            .into_iter()
            .flat_map(|i| i.inputs.iter().map(String::as_str))
            .filter(|p| !produced.contains(p))
            .collect()
    }
}

/// Move every incomplete item downstream of `root` to complete.
///
/// An item is downstream if it consumes the artifact or also produces it;
/// each moved item's own output is then followed in turn.
pub fn cascade_skip(
    order: &WorkOrder,
    partition: Partition,
    root: &Artifact,
) -> (Partition, Vec<ItemId>) {
    let Partition {
        mut incomplete,
        mut complete,
    } = partition;
    let moved = propagate(order, &mut incomplete, &mut complete, [root.clone()]);
    (
        Partition {
            incomplete,
            complete,
        },
        moved,
    )
}

/// Move every complete item downstream of any of `paths` back to incomplete.
pub fn touch_forward(
    order: &WorkOrder,
    partition: Partition,
    paths: &[String],
) -> (Partition, Vec<ItemId>) {
    let Partition {
        mut incomplete,
        mut complete,
    } = partition;
    let roots = paths.iter().cloned().map(Artifact::Path);
    let moved = propagate(order, &mut complete, &mut incomplete, roots);
    (
        Partition {
            incomplete,
            complete,
        },
        moved,
    )
}

/// Move items affected by the roots (transitively) from `from` into `to`.
fn propagate(
    order: &WorkOrder,
    from: &mut BTreeSet<ItemId>,
    to: &mut BTreeSet<ItemId>,
    roots: impl IntoIterator<Item = Artifact>,
) -> Vec<ItemId> {
    let mut worklist: Vec<Artifact> = roots.into_iter().collect();
    let mut seen: HashSet<Artifact> = HashSet::new();
    let mut moved = Vec::new();

    while let Some(artifact) = worklist.pop() {
        if !seen.insert(artifact.clone()) {
            continue;
        }

        let hits: Vec<ItemId> = from
            .iter()
            .copied()
            .filter(|&id| order.get(id).is_some_and(|item| item.is_affected_by(&artifact)))
            .collect();

        for id in hits {
            from.remove(&id);
            to.insert(id);
            moved.push(id);
            if let Some(item) = order.get(id) {
                worklist.push(item.output.clone());
            }
        }
    }

    moved.sort();
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(task: &str, inputs: &[&str], output: &str) -> WorkItem {
        WorkItem {
            id: ItemId(0),
            task: task.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: Artifact::Path(output.to_string()),
            command: String::new(),
        }
    }

    fn order() -> WorkOrder {
        WorkOrder::from_items([
            item("compile", &["a.js"], "a.out"),
            item("bundle", &["a.out"], "bundle.out"),
            item("min", &["bundle.out"], "bundle.min"),
            item("docs", &["README"], "docs.html"),
        ])
    }

    #[test]
    fn sources_exclude_incomplete_outputs() {
        let order = order();
        let mut partition = Partition::new(&order);
        let sources = partition.sources(&order);
        assert_eq!(sources, HashSet::from(["a.js", "README"]));

        partition.finish(ItemId(0));
        assert!(partition.sources(&order).contains("a.out"));
    }

    #[test]
    fn cascade_follows_outputs_transitively() {
        let order = order();
        let mut partition = Partition::new(&order);
        partition.finish(ItemId(0));

        let (partition, skipped) = cascade_skip(&order, partition, &Artifact::Path("a.out".into()));
        assert_eq!(skipped, vec![ItemId(1), ItemId(2)]);
        assert_eq!(partition.incomplete, BTreeSet::from([ItemId(3)]));
    }

    #[test]
    fn touch_reopens_everything_downstream() {
        let order = order();
        let mut partition = Partition::new(&order);
        for id in order.ids() {
            partition.finish(id);
        }

        let (partition, moved) = touch_forward(&order, partition, &["a.js".to_string()]);
        assert_eq!(moved, vec![ItemId(0), ItemId(1), ItemId(2)]);
        assert_eq!(partition.complete, BTreeSet::from([ItemId(3)]));
    }

    #[test]
    fn touch_of_an_output_reopens_its_producer() {
        let order = order();
        let mut partition = Partition::new(&order);
        for id in order.ids() {
            partition.finish(id);
        }

        let (_, moved) = touch_forward(&order, partition, &["bundle.out".to_string()]);
        assert_eq!(moved, vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn touch_ignores_incomplete_items_and_unknown_paths() {
        let order = order();
        let partition = Partition::new(&order);
        let paths = ["a.js".to_string(), "nope".to_string()];
        let (after, moved) = touch_forward(&order, partition.clone(), &paths);
        assert!(moved.is_empty());
        assert_eq!(after, partition);
    }
}
