use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use geo_types::Point;
use itertools::Itertools;

use commute_routing::{
    commute::{session::Session, CommuteConfig, StudentBatch},
    graph::TransitGraph,
    network::{station::StationId, Network},
    search::{Algorithm, PathFinder, SearchEngine},
};

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Inputs {
    /// GeoJSON FeatureCollection of station points
    stations_path: PathBuf,
    /// GeoJSON FeatureCollection of line geometries
    lines_path: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Find a single route between two stations
    Route {
        #[command(flatten)]
        inputs: Inputs,
        /// Id of the origin station
        from: String,
        /// Id of the destination station
        to: String,
        #[arg(long, value_enum, default_value_t = Algorithm::Dijkstra)]
        algorithm: Algorithm,
    },
    /// Generate synthetic commutes and write them as JSON
    Generate {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long, value_enum, default_value_t = Algorithm::Dijkstra)]
        algorithm: Algorithm,
        /// Size of the full batch
        #[arg(long, default_value_t = 2000)]
        count: usize,
        /// Size of the preview batch
        #[arg(long, default_value_t = 20)]
        preview: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Commute destination as LNG,LAT
        #[arg(long, value_parser = parse_lnglat)]
        destination: Option<Point>,
        /// Output file, stdout if omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare the average search cost of both algorithms
    Compare {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long, default_value_t = 2000)]
        count: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn parse_lnglat(s: &str) -> anyhow::Result<Point> {
    let (lng, lat) = s
        .split_once(',')
        .context("Expected LNG,LAT")?;
    Ok(Point::new(lng.trim().parse()?, lat.trim().parse()?))
}

fn load(inputs: &Inputs) -> anyhow::Result<TransitGraph> {
    let now = Instant::now();
    let network = Network::read(&inputs.stations_path, &inputs.lines_path)?;
    let graph = TransitGraph::build(&network.stations, &network.lines);
    println!(
        "Built graph of {} stations and {} edges in {:?}",
        graph.len(),
        graph.edge_count(),
        now.elapsed()
    );

    Ok(graph)
}

fn report(label: &str, algorithm: Algorithm, batch: &StudentBatch) {
    println!(
        "{label} {algorithm} batch: {} commutes, {:.2} stations visited on average",
        batch.len(),
        batch.average_visited()
    );
}

fn route(graph: &TransitGraph, from: &str, to: &str, algorithm: Algorithm) -> anyhow::Result<()> {
    let from = StationId::new(from);
    let to = StationId::new(to);
    for id in [&from, &to] {
        if graph.node(id).is_none() {
            return Err(anyhow!("Unknown station {id}"));
        }
    }

    let now = Instant::now();
    let result = SearchEngine.find_path(graph, &from, &to, algorithm);
    println!("Searched with {algorithm} in {:?}", now.elapsed());

    if result.is_empty() {
        println!("No route from {from} to {to}, visited {} stations", result.visited.len());
        return Ok(());
    }

    println!(
        "{}",
        result.path.iter().map(|s| format!("{} ({})", s.name, s.id)).join(" -> ")
    );
    println!(
        "{} stops, cost {:.5}, visited {} stations",
        result.path.len(),
        result.cost(graph),
        result.visited.len()
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Route {
            inputs,
            from,
            to,
            algorithm,
        } => {
            let graph = load(&inputs)?;
            route(&graph, &from, &to, algorithm)?;
        }
        Command::Generate {
            inputs,
            algorithm,
            count,
            preview,
            seed,
            destination,
            output,
        } => {
            let graph = Arc::new(load(&inputs)?);
            let defaults = CommuteConfig::default();
            let config = CommuteConfig {
                destination: destination.unwrap_or(defaults.destination),
                preview_size: preview,
                full_size: count,
                ..defaults
            };
            let mut session = Session::new(graph, Arc::new(SearchEngine), config, seed);

            let now = Instant::now();
            let selection = session.select(algorithm);
            report("Preview", algorithm, selection.batch());
            println!("Preview ready in {:?}", now.elapsed());

            let batch = session
                .wait(algorithm)?
                .context("Full batch was never started")?;
            report("Full", algorithm, &batch);
            println!("Full batch ready in {:?}", now.elapsed());

            let json = serde_json::to_string(batch.as_ref())?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Compare {
            inputs,
            count,
            seed,
        } => {
            let graph = Arc::new(load(&inputs)?);
            let config = CommuteConfig {
                full_size: count,
                ..CommuteConfig::default()
            };
            let mut session = Session::new(graph, Arc::new(SearchEngine), config, seed);

            for algorithm in Algorithm::ALL {
                let now = Instant::now();
                session.select(algorithm);
                if let Some(batch) = session.wait(algorithm)? {
                    report("Full", algorithm, &batch);
                }
                println!("{algorithm} done in {:?}", now.elapsed());
            }

            let now = Instant::now();
            let first = Algorithm::ALL[0];
            let selection = session.select(first);
            println!(
                "Switched back to {first} in {:?} (cached: {})",
                now.elapsed(),
                selection.is_cached()
            );
        }
    }

    Ok(())
}
