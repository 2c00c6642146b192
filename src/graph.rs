use std::collections::HashMap;

use geo_types::Point;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{ser::SerializeTuple, Serialize, Serializer};

use crate::{
    geometry::{distance, find_nearest_station},
    network::{
        line::Line,
        station::{Station, StationId},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: StationId,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub station: Station,
    pub neighbors: Vec<Neighbor>,
}

/// Segment drawn between two resolved stations, kept only for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugEdge(pub Point, pub Point);

impl Serialize for DebugEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&[self.0.x(), self.0.y()])?;
        tup.serialize_element(&[self.1.x(), self.1.y()])?;
        tup.end()
    }
}

/// Undirected weighted station graph. Built in one go from a full snapshot and
/// read-only afterwards.
///
/// Every edge is stored on both endpoints with the same weight, there is at most
/// one edge per station pair and no station links to itself.
#[derive(Debug, Default)]
pub struct TransitGraph {
    nodes: HashMap<StationId, GraphNode>,
    stations: Vec<Station>,
    debug_edges: Vec<DebugEdge>,
}

fn connect(
    nodes: &mut HashMap<StationId, GraphNode>,
    a: &StationId,
    b: &StationId,
    weight: f64,
) -> bool {
    let linked = |from: &StationId, to: &StationId| {
        nodes
            .get(from)
            .map(|n| n.neighbors.iter().any(|x| &x.id == to))
            .unwrap_or(false)
    };

    if linked(a, b) || linked(b, a) {
        return false;
    }

    for (from, to) in [(a, b), (b, a)] {
        if let Some(node) = nodes.get_mut(from) {
            node.neighbors.push(Neighbor {
                id: to.clone(),
                weight,
            });
        }
    }

    true
}

impl TransitGraph {
    pub fn build(stations: &[Station], lines: &[Line]) -> Self {
        let mut nodes: HashMap<StationId, GraphNode> = HashMap::with_capacity(stations.len());
        let mut accepted: Vec<Station> = Vec::with_capacity(stations.len());

        for station in stations {
            if !station.is_valid() {
                warn!("Skipping station {:?}: missing id or coordinates", station.name);
                continue;
            }
            if nodes.contains_key(&station.id) {
                warn!("Skipping station {}: duplicate id", station.id);
                continue;
            }

            nodes.insert(
                station.id.clone(),
                GraphNode {
                    station: station.clone(),
                    neighbors: vec![],
                },
            );
            accepted.push(station.clone());
        }

        let mut debug_edges = vec![];
        let mut skipped_lines = 0;
        let mut skipped_segments = 0;
        let mut edges = 0;

        for line in lines {
            if line.coords.len() < 2 {
                warn!("Skipping line {}: fewer than two coordinates", line.label());
                skipped_lines += 1;
                continue;
            }

            for (from, to) in line.coords.iter().tuple_windows() {
                let start = find_nearest_station(*from, &accepted);
                let end = find_nearest_station(*to, &accepted);

                let (start, end) = match (start, end) {
                    (Some(start), Some(end)) if start.id != end.id => (start, end),
                    _ => {
                        skipped_segments += 1;
                        continue;
                    }
                };

                let weight = distance(start.coord, end.coord);
                debug_edges.push(DebugEdge(start.coord, end.coord));

                if connect(&mut nodes, &start.id, &end.id, weight) {
                    edges += 1;
                }
            }
        }

        debug!("Skipped {skipped_segments} segments that did not span two stations");
        info!(
            "Built graph with {} stations, {} edges from {} segments ({} lines skipped)",
            accepted.len(),
            edges,
            debug_edges.len(),
            skipped_lines
        );

        Self {
            nodes,
            stations: accepted,
            debug_edges,
        }
    }

    pub fn node(&self, id: &StationId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.nodes.get(id).map(|n| &n.station)
    }

    pub fn neighbors(&self, id: &StationId) -> &[Neighbor] {
        match self.nodes.get(id) {
            Some(node) => &node.neighbors,
            None => &[],
        }
    }

    /// Accepted stations, in input order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn debug_edges(&self) -> &[DebugEdge] {
        &self.debug_edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.neighbors.len()).sum::<usize>() / 2
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn station(id: &str, x: f64, y: f64) -> Station {
        Station::new(StationId::new(id), id.to_uppercase(), Point::new(x, y))
    }

    pub fn line(coords: &[(f64, f64)]) -> Line {
        Line::new(None, coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{line, station};
    use super::*;
    use approx::assert_relative_eq;

    fn id(s: &str) -> StationId {
        StationId::new(s)
    }

    #[test]
    fn builds_symmetric_edges() {
        let stations = vec![station("a", 0.0, 0.0), station("b", 1.0, 0.0), station("c", 1.0, 1.0)];
        let graph = TransitGraph::build(&stations, &[line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])]);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 2);

        for node in graph.stations().iter().filter_map(|s| graph.node(&s.id)) {
            for n in &node.neighbors {
                let back = graph
                    .neighbors(&n.id)
                    .iter()
                    .find(|m| m.id == node.station.id)
                    .expect("edge should be mirrored");
                assert_relative_eq!(back.weight, n.weight);
            }
        }
    }

    #[test]
    fn weights_use_station_coordinates() {
        let stations = vec![station("a", 0.0, 0.0), station("b", 3.0, 4.0)];
        // Line vertices sit near, not on, the stations.
        let graph = TransitGraph::build(&stations, &[line(&[(0.1, 0.1), (2.9, 3.9)])]);

        assert_relative_eq!(graph.neighbors(&id("a"))[0].weight, 5.0);
        assert_eq!(graph.debug_edges()[0], DebugEdge(Point::new(0.0, 0.0), Point::new(3.0, 4.0)));
    }

    #[test]
    fn overlapping_lines_do_not_duplicate_edges() {
        let stations = vec![station("a", 0.0, 0.0), station("b", 1.0, 0.0)];
        let lines = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (0.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]),
        ];
        let graph = TransitGraph::build(&stations, &lines);

        assert_eq!(graph.neighbors(&id("a")).len(), 1);
        assert_eq!(graph.neighbors(&id("b")).len(), 1);
        // Debug edges are recorded before deduplication.
        assert_eq!(graph.debug_edges().len(), 4);
    }

    #[test]
    fn degenerate_segments_are_dropped() {
        let stations = vec![station("a", 0.0, 0.0), station("b", 10.0, 0.0)];
        let graph = TransitGraph::build(&stations, &[line(&[(0.0, 0.0), (0.5, 0.0), (1.0, 0.0)])]);

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.debug_edges().is_empty());
        assert!(graph.neighbors(&id("a")).iter().all(|n| n.id != id("a")));
    }

    #[test]
    fn malformed_input_is_skipped() {
        let stations = vec![
            station("a", 0.0, 0.0),
            station("", 0.5, 0.5),
            station("nan", f64::NAN, 0.0),
            station("a", 9.0, 9.0),
            station("b", 1.0, 0.0),
        ];
        let lines = vec![
            line(&[(0.0, 0.0)]),
            line(&[]),
            line(&[(0.0, 0.0), (f64::NAN, 1.0), (1.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
        ];
        let graph = TransitGraph::build(&stations, &lines);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.station(&id("a")).unwrap().coord, Point::new(0.0, 0.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn no_stations_means_no_edges() {
        let graph = TransitGraph::build(&[], &[line(&[(0.0, 0.0), (1.0, 0.0)])]);

        assert!(graph.is_empty());
        assert!(graph.debug_edges().is_empty());
    }
}
