// src/plan/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::plan::compile::{ItemId, WorkOrder};

/// Producer/consumer graph over the items of a [`WorkOrder`].
///
/// Edge direction: producer -> consumer. An item that reads `a.out` gets an
/// edge from whichever item writes `a.out`. Inputs nobody produces add no
/// edges.
#[derive(Debug, Clone)]
pub struct WorkGraph {
    graph: DiGraphMap<ItemId, ()>,
}

impl WorkGraph {
    pub fn from_order(order: &WorkOrder) -> Self {
        let mut graph: DiGraphMap<ItemId, ()> = DiGraphMap::new();

        let producers: HashMap<&str, ItemId> = order
            .items()
            .iter()
            .filter_map(|item| item.output.as_path().map(|p| (p, item.id)))
            .collect();

        for item in order.items() {
            graph.add_node(item.id);
        }
        for item in order.items() {
            for input in &item.inputs {
                if let Some(&producer) = producers.get(input.as_str()) {
                    graph.add_edge(producer, item.id, ());
                }
            }
        }

        Self { graph }
    }

    /// Items ordered so every producer precedes its consumers, or `None`
    /// when the items depend on each other in a loop.
    pub fn topological_order(&self) -> Option<Vec<ItemId>> {
        toposort(&self.graph, None).ok()
    }

    /// The seeds plus everything they transitively consume from.
    pub fn ancestors(&self, seeds: impl IntoIterator<Item = ItemId>) -> BTreeSet<ItemId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<ItemId> = seeds.into_iter().collect();

        while let Some(id) = stack.pop() {
            if !self.graph.contains_node(id) || !seen.insert(id) {
                continue;
            }
            stack.extend(self.graph.neighbors_directed(id, Direction::Incoming));
        }

        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::compile::WorkItem;
    use crate::types::Artifact;

    fn item(task: &str, inputs: &[&str], output: &str) -> WorkItem {
        WorkItem {
            id: ItemId(0),
            task: task.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: Artifact::Path(output.to_string()),
            command: format!("make {output}"),
        }
    }

    fn chain() -> WorkOrder {
        // declared consumer-first so the topological order differs
        WorkOrder::from_items([
            item("bundle", &["a.out", "b.out"], "bundle.out"),
            item("compile", &["a.js"], "a.out"),
            item("compile", &["b.js"], "b.out"),
            item("docs", &["README"], "docs.html"),
        ])
    }

    #[test]
    fn producers_come_before_consumers() {
        let graph = WorkGraph::from_order(&chain());
        let order = graph.topological_order().unwrap();
        let pos = |id: usize| order.iter().position(|&i| i == ItemId(id)).unwrap();
        assert!(pos(1) < pos(0));
        assert!(pos(2) < pos(0));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn ancestors_follow_consumed_artifacts_only() {
        let graph = WorkGraph::from_order(&chain());
        let closure = graph.ancestors([ItemId(0)]);
        assert_eq!(closure, BTreeSet::from([ItemId(0), ItemId(1), ItemId(2)]));
        assert_eq!(graph.ancestors([ItemId(3)]), BTreeSet::from([ItemId(3)]));
    }

    #[test]
    fn self_consuming_item_has_no_topological_order() {
        let order = WorkOrder::from_items([item("loop", &["x"], "x")]);
        assert!(WorkGraph::from_order(&order).topological_order().is_none());
    }
}
