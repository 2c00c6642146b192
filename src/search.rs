//! Shortest paths over a [`TransitGraph`].
//!
//! Both algorithms run through one best-first loop and differ only in the
//! priority given to a node and in what counts as visited:
//!
//! * [`Algorithm::Dijkstra`] orders the frontier by cost so far. A node is visited
//!   when it is dequeued for the first time, i.e. finalized.
//! * [`Algorithm::AStar`] adds the straight-line distance to the goal. A node is
//!   visited when it is expanded out of the open set.
//!
//! In both cases the goal itself is never marked visited: the search stops as soon
//! as it is taken off the frontier.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
    fmt,
    str::FromStr,
};

use anyhow::anyhow;
use itertools::Itertools;

use crate::{
    geometry::distance,
    graph::TransitGraph,
    network::station::{Station, StationId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Algorithm {
    Dijkstra,
    #[value(name = "astar", alias = "a*")]
    AStar,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Dijkstra, Algorithm::AStar];

    fn heuristic(&self, station: &Station, goal: &Station) -> f64 {
        match self {
            Algorithm::Dijkstra => 0.0,
            Algorithm::AStar => distance(station.coord, goal.coord),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Dijkstra => f.write_str("dijkstra"),
            Algorithm::AStar => f.write_str("astar"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" => Ok(Algorithm::Dijkstra),
            "astar" | "a*" => Ok(Algorithm::AStar),
            other => Err(anyhow!("Unknown algorithm {other:?}")),
        }
    }
}

/// Outcome of one search. An empty `path` means the endpoints were unknown or
/// not connected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    pub path: Vec<Station>,
    pub visited: Vec<Station>,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Total edge weight along the path, read from `graph`. Infinite if two
    /// consecutive stations are not linked there.
    pub fn cost(&self, graph: &TransitGraph) -> f64 {
        self.path
            .iter()
            .tuple_windows()
            .map(|(a, b)| {
                graph
                    .neighbors(&a.id)
                    .iter()
                    .find(|n| n.id == b.id)
                    .map_or(f64::INFINITY, |n| n.weight)
            })
            .sum()
    }
}

/// Seam between the route generator and the search engine.
pub trait PathFinder: Send + Sync {
    fn find_path(
        &self,
        graph: &TransitGraph,
        start: &StationId,
        end: &StationId,
        algorithm: Algorithm,
    ) -> PathResult;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine;

impl PathFinder for SearchEngine {
    fn find_path(
        &self,
        graph: &TransitGraph,
        start: &StationId,
        end: &StationId,
        algorithm: Algorithm,
    ) -> PathResult {
        best_first(graph, start, end, algorithm)
    }
}

pub fn find_shortest_path(graph: &TransitGraph, start: &StationId, end: &StationId) -> PathResult {
    best_first(graph, start, end, Algorithm::Dijkstra)
}

pub fn find_shortest_path_astar(
    graph: &TransitGraph,
    start: &StationId,
    end: &StationId,
) -> PathResult {
    best_first(graph, start, end, Algorithm::AStar)
}

#[derive(Debug)]
struct Entry<'a> {
    priority: f64,
    seq: u64,
    id: &'a StationId,
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry<'_> {}

impl PartialOrd for Entry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry<'_> {
    // Reversed so the max-heap yields the lowest priority, earliest pushed first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Frontier<'a> {
    heap: BinaryHeap<Entry<'a>>,
    pushed: u64,
}

impl<'a> Frontier<'a> {
    fn push(&mut self, id: &'a StationId, priority: f64) {
        self.heap.push(Entry {
            priority,
            seq: self.pushed,
            id,
        });
        self.pushed += 1;
    }

    fn pop(&mut self) -> Option<Entry<'a>> {
        self.heap.pop()
    }
}

fn best_first(
    graph: &TransitGraph,
    start: &StationId,
    end: &StationId,
    algorithm: Algorithm,
) -> PathResult {
    let (Some(start), Some(goal)) = (graph.node(start), graph.station(end)) else {
        return PathResult::default();
    };
    let start = &start.station;

    let score = |id: &StationId, cost: f64| match graph.station(id) {
        Some(station) => cost + algorithm.heuristic(station, goal),
        None => f64::INFINITY,
    };

    let mut costs: HashMap<&StationId, f64> = HashMap::new();
    let mut previous: HashMap<&StationId, &StationId> = HashMap::new();
    let mut open: HashSet<&StationId> = HashSet::new();
    let mut committed: HashSet<&StationId> = HashSet::new();
    let mut visited: Vec<&Station> = vec![];
    let mut frontier = Frontier::default();

    costs.insert(&start.id, 0.0);
    open.insert(&start.id);
    frontier.push(&start.id, score(&start.id, 0.0));

    while let Some(Entry { id, priority, .. }) = frontier.pop() {
        let cost = costs.get(id).copied().unwrap_or(f64::INFINITY);

        match algorithm {
            Algorithm::Dijkstra => {
                if id == &goal.id {
                    break;
                }
                if !committed.insert(id) {
                    continue;
                }
                if let Some(station) = graph.station(id) {
                    visited.push(station);
                }
            }
            Algorithm::AStar => {
                // Stale heap entry for a node whose score has since improved.
                if !open.contains(id) || priority > score(id, cost) {
                    continue;
                }
                if id == &goal.id {
                    break;
                }
                open.remove(id);
                if committed.insert(id) {
                    if let Some(station) = graph.station(id) {
                        visited.push(station);
                    }
                }
            }
        }

        for neighbor in graph.neighbors(id) {
            let alt = cost + neighbor.weight;
            if alt < costs.get(&neighbor.id).copied().unwrap_or(f64::INFINITY) {
                costs.insert(&neighbor.id, alt);
                previous.insert(&neighbor.id, id);
                open.insert(&neighbor.id);
                frontier.push(&neighbor.id, score(&neighbor.id, alt));
            }
        }
    }

    PathResult {
        path: reconstruct(graph, &previous, &start.id, &goal.id),
        visited: visited.into_iter().cloned().collect(),
    }
}

/// Walks predecessors back from `end`. A chain that stops short of `start`
/// means `end` was never reached.
fn reconstruct(
    graph: &TransitGraph,
    previous: &HashMap<&StationId, &StationId>,
    start: &StationId,
    end: &StationId,
) -> Vec<Station> {
    let mut ids = vec![end];
    let mut current = end;

    while current != start {
        match previous.get(current) {
            Some(&prev) => {
                ids.push(prev);
                current = prev;
            }
            None => return vec![],
        }
    }

    ids.into_iter()
        .rev()
        .filter_map(|id| graph.station(id).cloned())
        .collect()
}
