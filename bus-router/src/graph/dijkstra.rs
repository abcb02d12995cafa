use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, hash_map::Entry};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::domain::StopCode;

/// A minimum-cost path through the stop graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    /// Stops in travel order, origin first.
    pub stops: Vec<StopCode>,
    /// Sum of edge weights in minutes.
    pub cost: u32,
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    cost: u32,
    node: NodeIndex,
}

// Min-heap by cost; ties broken by node index so pops are deterministic.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(super) fn shortest_path(
    graph: &DiGraph<StopCode, u32>,
    start: NodeIndex,
    target: NodeIndex,
) -> Option<ShortestPath> {
    let mut distances: HashMap<NodeIndex, u32> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0,
        node: start,
    });
    distances.insert(start, 0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            return Some(ShortestPath {
                stops: reconstruct(graph, &predecessors, start, target)?,
                cost,
            });
        }

        // Stale heap entry
        if distances.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            let next_cost = cost.saturating_add(*edge.weight());

            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, node);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, node);
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    None
}

fn reconstruct(
    graph: &DiGraph<StopCode, u32>,
    predecessors: &HashMap<NodeIndex, NodeIndex>,
    start: NodeIndex,
    target: NodeIndex,
) -> Option<Vec<StopCode>> {
    let mut nodes = vec![target];
    let mut current = target;
    while current != start {
        current = *predecessors.get(&current)?;
        nodes.push(current);
    }
    nodes.reverse();

    nodes
        .into_iter()
        .map(|idx| graph.node_weight(idx).cloned())
        .collect()
}
