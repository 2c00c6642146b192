pub mod region;
pub mod session;

use geo_types::Point;
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::{
    commute::region::{nyc_regions, sample_home, Region},
    geometry::{find_nearest_station, serialize_lnglat, serialize_lnglat_seq},
    graph::{DebugEdge, TransitGraph},
    network::{station::Station, Network},
    search::{Algorithm, PathFinder, SearchEngine},
};

const ANCHOR_ID: &str = "roosevelt-1";
const ANCHOR_NAME: &str = "Roosevelt A";
const ANCHOR_COLOR: &str = "#d7263d";

/// Generation parameters.
#[derive(Debug, Clone)]
pub struct CommuteConfig {
    /// Where every commute ends.
    pub destination: Point,
    pub anchor_home: Point,
    pub regions: Vec<Region>,
    pub colors: Vec<String>,
    /// Start delays are drawn from `[0, max_start_delay)`.
    pub max_start_delay: f64,
    pub preview_size: usize,
    pub full_size: usize,
}

impl Default for CommuteConfig {
    fn default() -> Self {
        Self {
            destination: Point::new(-74.0139, 40.7179),
            anchor_home: Point::new(-73.9497, 40.7616),
            regions: nyc_regions(),
            colors: ["#e63946", "#457b9d", "#2a9d8f", "#f4a261", "#e9c46a"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_start_delay: 0.2,
            preview_size: 20,
            full_size: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_lnglat")]
    pub home: Point,
    pub color: String,
    /// Home, then every station on the path, then the destination.
    #[serde(serialize_with = "serialize_lnglat_seq")]
    pub route: Vec<Point>,
    pub start_delay: f64,
    #[serde(serialize_with = "serialize_lnglat_seq")]
    pub visited_path: Vec<Point>,
    pub is_fixed: bool,
}

impl Student {
    /// Return trip for the same commuter, as a new record.
    pub fn reversed(&self) -> Student {
        Student {
            id: format!("{}-return", self.id),
            route: self.route.iter().rev().copied().collect(),
            visited_path: self.visited_path.iter().rev().copied().collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBatch {
    pub students: Vec<Student>,
    pub debug_edges: Vec<DebugEdge>,
}

impl StudentBatch {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Mean number of stations each search committed to.
    pub fn average_visited(&self) -> f64 {
        if self.students.is_empty() {
            return 0.0;
        }
        let total: usize = self.students.iter().map(|s| s.visited_path.len()).sum();
        total as f64 / self.students.len() as f64
    }
}

/// Who is commuting, before a route is attached.
struct Commuter {
    id: String,
    name: String,
    home: Point,
    color: String,
    is_fixed: bool,
}

pub struct Generator<'a, F: PathFinder + ?Sized> {
    graph: &'a TransitGraph,
    finder: &'a F,
    config: &'a CommuteConfig,
}

impl<'a, F: PathFinder + ?Sized> Generator<'a, F> {
    pub fn new(graph: &'a TransitGraph, finder: &'a F, config: &'a CommuteConfig) -> Self {
        Self {
            graph,
            finder,
            config,
        }
    }

    /// Builds `count` sampled commuters plus the anchor record. An empty graph
    /// yields an empty batch.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        algorithm: Algorithm,
        rng: &mut R,
    ) -> StudentBatch {
        let stations = self.graph.stations();
        let Some(school) = find_nearest_station(self.config.destination, stations) else {
            warn!("No stations to route through, generating nothing");
            return StudentBatch::default();
        };

        let mut students = Vec::with_capacity(count + 1);
        let anchor = Commuter {
            id: ANCHOR_ID.to_owned(),
            name: ANCHOR_NAME.to_owned(),
            home: self.config.anchor_home,
            color: ANCHOR_COLOR.to_owned(),
            is_fixed: true,
        };
        students.push(self.commute(anchor, school, algorithm, rng));

        for i in 0..count {
            let home = sample_home(&self.config.regions, rng).unwrap_or_else(|| {
                debug!("No regions configured, s-{i} starts at the anchor home");
                self.config.anchor_home
            });
            let color = match self.config.colors.len() {
                0 => ANCHOR_COLOR.to_owned(),
                n => self.config.colors[i % n].clone(),
            };

            let commuter = Commuter {
                id: format!("s-{i}"),
                name: format!("Student {}", i + 1),
                home,
                color,
                is_fixed: false,
            };
            students.push(self.commute(commuter, school, algorithm, rng));
        }

        let batch = StudentBatch {
            students,
            debug_edges: self.graph.debug_edges().to_vec(),
        };
        info!(
            "Generated {} commutes with {algorithm}, {:.2} stations visited on average",
            batch.len(),
            batch.average_visited()
        );

        batch
    }

    fn commute<R: Rng + ?Sized>(
        &self,
        commuter: Commuter,
        school: &Station,
        algorithm: Algorithm,
        rng: &mut R,
    ) -> Student {
        let Commuter {
            id,
            name,
            home,
            color,
            is_fixed,
        } = commuter;
        let destination = self.config.destination;
        let result = find_nearest_station(home, self.graph.stations())
            .map(|start| self.finder.find_path(self.graph, &start.id, &school.id, algorithm))
            .unwrap_or_default();

        let route = if result.is_empty() {
            debug!("No path for {id}, falling back to a direct route");
            vec![home, destination]
        } else {
            std::iter::once(home)
                .chain(result.path.iter().map(|s| s.coord))
                .chain(std::iter::once(destination))
                .collect()
        };

        Student {
            id,
            name,
            home,
            color,
            route,
            start_delay: rng.gen::<f64>() * self.config.max_start_delay,
            visited_path: result.visited.iter().map(|s| s.coord).collect(),
            is_fixed,
        }
    }
}

/// One-shot generation straight from a station/line snapshot with the default
/// configuration.
pub fn generate_random_students<R: Rng + ?Sized>(
    count: usize,
    network: &Network,
    algorithm: Algorithm,
    rng: &mut R,
) -> StudentBatch {
    if network.stations.is_empty() {
        return StudentBatch::default();
    }

    let graph = TransitGraph::build(&network.stations, &network.lines);
    let config = CommuteConfig::default();
    Generator::new(&graph, &SearchEngine, &config).generate(count, algorithm, rng)
}

#[cfg(test)]
pub mod fixtures {
    use crate::graph::fixtures::{line, station};
    use crate::network::Network;

    /// A handful of stations around New York, all connected.
    pub fn nyc() -> Network {
        let bronx = (-73.89, 40.86);
        let harlem = (-73.95, 40.80);
        let midtown = (-73.98, 40.75);
        let queens = (-73.81, 40.75);
        let brooklyn = (-73.95, 40.68);
        let downtown = (-74.01, 40.71);

        Network {
            stations: vec![
                station("bronx", bronx.0, bronx.1),
                station("harlem", harlem.0, harlem.1),
                station("midtown", midtown.0, midtown.1),
                station("queens", queens.0, queens.1),
                station("brooklyn", brooklyn.0, brooklyn.1),
                station("downtown", downtown.0, downtown.1),
            ],
            lines: vec![
                line(&[bronx, harlem, midtown, downtown, brooklyn]),
                line(&[queens, midtown]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::nyc;
    use super::*;
    use crate::graph::fixtures::station;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(count: usize, algorithm: Algorithm, seed: u64) -> StudentBatch {
        let network = nyc();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_random_students(count, &network, algorithm, &mut rng)
    }

    #[test]
    fn yields_count_plus_anchor() {
        for count in [0, 1, 13, 100] {
            let batch = generate(count, Algorithm::Dijkstra, 11);

            assert_eq!(batch.len(), count + 1);
            assert!(batch.students.iter().all(|s| s.route.len() >= 2));
            assert_eq!(batch.debug_edges.len(), 5);
        }
    }

    #[test]
    fn anchor_comes_first_and_is_routed() {
        let batch = generate(3, Algorithm::AStar, 5);
        let anchor = &batch.students[0];
        let config = CommuteConfig::default();

        assert_eq!(anchor.id, "roosevelt-1");
        assert!(anchor.is_fixed);
        assert_eq!(anchor.home, config.anchor_home);
        // home, midtown, downtown, destination
        assert_eq!(anchor.route.len(), 4);
        assert_eq!(anchor.route[0], config.anchor_home);
        assert_eq!(anchor.route[3], config.destination);
        assert!(batch.students[1..].iter().all(|s| !s.is_fixed));
    }

    #[test]
    fn records_are_well_formed() {
        let batch = generate(50, Algorithm::Dijkstra, 99);
        let config = CommuteConfig::default();

        for (i, s) in batch.students[1..].iter().enumerate() {
            assert_eq!(s.id, format!("s-{i}"));
            assert_eq!(s.name, format!("Student {}", i + 1));
            assert_eq!(s.color, config.colors[i % config.colors.len()]);
            assert!((0.0..0.2).contains(&s.start_delay));
            assert!(config.regions.iter().any(|r| r.contains(s.home)));
            assert_eq!(s.route.first(), Some(&s.home));
            assert_eq!(s.route.last(), Some(&config.destination));
        }
    }

    #[test]
    fn same_seed_same_batch() {
        assert_eq!(generate(20, Algorithm::AStar, 42), generate(20, Algorithm::AStar, 42));
        assert_ne!(generate(20, Algorithm::AStar, 42), generate(20, Algorithm::AStar, 43));
    }

    #[test]
    fn average_visited_is_mean_of_visited_paths() {
        let batch = generate(30, Algorithm::Dijkstra, 8);
        let total: usize = batch.students.iter().map(|s| s.visited_path.len()).sum();

        assert_relative_eq!(batch.average_visited(), total as f64 / 31.0);
        assert_relative_eq!(StudentBatch::default().average_visited(), 0.0);
    }

    #[test]
    fn astar_is_cheaper_on_average() {
        let dijkstra = generate(200, Algorithm::Dijkstra, 21);
        let astar = generate(200, Algorithm::AStar, 21);

        assert!(astar.average_visited() <= dijkstra.average_visited());
        // Same homes, same paths.
        for (d, a) in dijkstra.students.iter().zip(&astar.students) {
            assert_eq!(d.route, a.route);
        }
    }

    #[test]
    fn empty_station_list_yields_empty_batch() {
        let network = Network {
            stations: vec![],
            lines: nyc().lines,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let batch = generate_random_students(5, &network, Algorithm::Dijkstra, &mut rng);

        assert_eq!(batch, StudentBatch::default());
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            serde_json::json!({"students": [], "debugEdges": []})
        );
    }

    #[test]
    fn unreachable_station_falls_back_to_direct_route() {
        let mut network = nyc();
        network.stations.push(station("island", -73.0, 41.5));
        let graph = TransitGraph::build(&network.stations, &network.lines);
        let config = CommuteConfig {
            regions: vec![Region::new("island", (41.49, 41.51), (-73.01, -72.99))],
            ..CommuteConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let generator = Generator::new(&graph, &SearchEngine, &config);
        let batch = generator.generate(10, Algorithm::AStar, &mut rng);

        assert_eq!(batch.len(), 11);
        for s in &batch.students[1..] {
            assert_eq!(s.route, vec![s.home, config.destination]);
            assert_eq!(s.visited_path, vec![Point::new(-73.0, 41.5)]);
        }
    }

    #[test]
    fn reversed_is_a_new_record() {
        let batch = generate(1, Algorithm::Dijkstra, 2);
        let original = batch.students[1].clone();
        let back = original.reversed();

        assert_eq!(batch.students[1], original);
        assert_eq!(back.id, "s-0-return");
        assert_eq!(back.route.first(), original.route.last());
        assert_eq!(back.route.last(), original.route.first());
        assert_eq!(back.route.len(), original.route.len());
    }

    #[test]
    fn serializes_camel_case_lnglat() {
        let batch = generate(0, Algorithm::Dijkstra, 1);
        let json = serde_json::to_value(&batch).unwrap();
        let anchor = &json["students"][0];

        assert_eq!(anchor["id"], "roosevelt-1");
        assert_eq!(anchor["home"], serde_json::json!([-73.9497, 40.7616]));
        assert!(anchor["startDelay"].is_number());
        assert!(anchor["visitedPath"].is_array());
        assert_eq!(anchor["isFixed"], true);
        assert_eq!(json["debugEdges"][0], serde_json::json!([[-73.89, 40.86], [-73.95, 40.80]]));
    }
}
