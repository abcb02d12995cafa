//! Weighted stop graph.
//!
//! Nodes are stop codes; edges carry travel time in whole minutes. Built
//! per request from whichever segments the active finder selected.

mod dijkstra;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::trace;

use crate::domain::{Segment, StopCode};

pub use dijkstra::ShortestPath;

/// A directed graph over stops with minute weights.
#[derive(Debug, Clone, Default)]
pub struct WeightedDigraph {
    graph: DiGraph<StopCode, u32>,
    nodes: HashMap<StopCode, NodeIndex>,
}

impl WeightedDigraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge, creating either endpoint as needed.
    ///
    /// If the edge already exists the smaller weight is kept.
    pub fn add_edge(&mut self, origin: &StopCode, destination: &StopCode, weight: u32) {
        let a = self.node(origin);
        let b = self.node(destination);

        match self.graph.find_edge(a, b) {
            Some(edge) => {
                if let Some(existing) = self.graph.edge_weight_mut(edge) {
                    *existing = (*existing).min(weight);
                }
            }
            None => {
                self.graph.add_edge(a, b, weight);
            }
        }
    }

    fn node(&mut self, code: &StopCode) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(code) {
            return idx;
        }
        let idx = self.graph.add_node(code.clone());
        self.nodes.insert(code.clone(), idx);
        idx
    }

    pub fn contains(&self, code: &StopCode) -> bool {
        self.nodes.contains_key(code)
    }

    pub fn edge_weight(&self, origin: &StopCode, destination: &StopCode) -> Option<u32> {
        let a = *self.nodes.get(origin)?;
        let b = *self.nodes.get(destination)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Shortest path from `origin` to `destination`, or `None` if either is
    /// absent or unreachable.
    pub fn shortest_path(&self, origin: &StopCode, destination: &StopCode) -> Option<ShortestPath> {
        let start = *self.nodes.get(origin)?;
        let target = *self.nodes.get(destination)?;
        dijkstra::shortest_path(&self.graph, start, target)
    }
}

/// Build a graph with one edge per segment.
pub fn build_graph<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> WeightedDigraph {
    let mut graph = WeightedDigraph::new();
    for segment in segments {
        graph.add_edge(&segment.origin, &segment.destination, segment.travel_time);
    }
    trace!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built stop graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, SegmentType, ServiceKey, TimeWindow};

    fn code(s: &str) -> StopCode {
        StopCode::parse(s).unwrap()
    }

    fn seg(origin: &str, destination: &str, travel_time: u32) -> Segment {
        Segment {
            service: ServiceKey::new("1", Direction::One),
            origin: code(origin),
            destination: code(destination),
            travel_time,
            sequence: 1,
            window: TimeWindow::default(),
            segment_type: SegmentType::Finegrain,
        }
    }

    #[test]
    fn single_edge() {
        let graph = build_graph(&[seg("a", "b", 5)]);
        let path = graph.shortest_path(&code("a"), &code("b")).unwrap();
        assert_eq!(path.stops, vec![code("a"), code("b")]);
        assert_eq!(path.cost, 5);
    }

    #[test]
    fn edges_are_directed() {
        let graph = build_graph(&[seg("a", "b", 5)]);
        assert!(graph.shortest_path(&code("b"), &code("a")).is_none());
    }

    #[test]
    fn unknown_endpoint_has_no_path() {
        let graph = build_graph(&[seg("a", "b", 5)]);
        assert!(graph.shortest_path(&code("a"), &code("z")).is_none());
        assert!(graph.shortest_path(&code("z"), &code("b")).is_none());
    }

    #[test]
    fn duplicate_edge_keeps_minimum() {
        let graph = build_graph(&[seg("a", "b", 7), seg("a", "b", 3), seg("a", "b", 9)]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(&code("a"), &code("b")), Some(3));
    }

    #[test]
    fn prefers_cheaper_longer_path() {
        let graph = build_graph(&[
            seg("a", "d", 20),
            seg("a", "b", 4),
            seg("b", "c", 4),
            seg("c", "d", 4),
        ]);
        let path = graph.shortest_path(&code("a"), &code("d")).unwrap();
        assert_eq!(path.stops, vec![code("a"), code("b"), code("c"), code("d")]);
        assert_eq!(path.cost, 12);
    }

    #[test]
    fn origin_equals_destination() {
        let graph = build_graph(&[seg("a", "b", 5)]);
        let path = graph.shortest_path(&code("a"), &code("a")).unwrap();
        assert_eq!(path.stops, vec![code("a")]);
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn counts() {
        let graph = build_graph(&[seg("a", "b", 1), seg("b", "c", 1), seg("c", "a", 1)]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.contains(&code("c")));
        assert!(!graph.contains(&code("d")));
    }
}
