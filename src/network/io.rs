use std::path::Path;

use anyhow::{anyhow, Context};
use geo_types::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Value};
use log::{info, warn};

use crate::network::{
    line::Line,
    station::{Station, StationId},
};

fn read_feature_collection<P: AsRef<Path>>(path: P) -> anyhow::Result<FeatureCollection> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_feature_collection(&contents)
        .with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

fn parse_feature_collection(s: &str) -> anyhow::Result<FeatureCollection> {
    match s.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(anyhow!("Expected a FeatureCollection")),
    }
}

pub fn read_stations<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Station>> {
    let fc = read_feature_collection(path)?;
    let stations = stations_from_features(&fc.features);
    info!("Loaded {} stations", stations.len());

    Ok(stations)
}

pub fn read_lines<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Line>> {
    let fc = read_feature_collection(path)?;
    let lines = lines_from_features(&fc.features);
    info!("Loaded {} lines", lines.len());

    Ok(lines)
}

fn position_to_point(position: &[f64]) -> Option<Point> {
    match position {
        [lng, lat, ..] => Some(Point::new(*lng, *lat)),
        _ => None,
    }
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn stations_from_features(features: &[Feature]) -> Vec<Station> {
    let mut stations = vec![];

    for (n, feature) in features.iter().enumerate() {
        let coord = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(position)) => position_to_point(position),
            _ => None,
        };

        let Some(coord) = coord else {
            warn!("Skipping feature {n}: not a point station");
            continue;
        };

        // Ids come from the position among accepted stations only, so they never collide.
        let index = stations.len();
        let id = StationId::new(&format!("station-{index}"));
        let name = string_property(feature, "name").unwrap_or_else(|| format!("Station {index}"));
        stations.push(Station::new(id, name, coord));
    }

    stations
}

/// Breaks a coordinate run wherever a position is malformed, so the vertices on
/// either side of it are never joined into a segment.
fn split_at_gaps(feature: usize, name: Option<&str>, positions: &[Vec<f64>]) -> Vec<Line> {
    let mut runs = vec![];
    let mut current = vec![];

    for (i, position) in positions.iter().enumerate() {
        match position_to_point(position) {
            Some(p) => current.push(p),
            None => {
                warn!("Feature {feature}: dropping malformed position {i}, splitting the line");
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() || runs.is_empty() {
        runs.push(current);
    }

    runs.into_iter()
        .map(|coords| Line::new(name.map(str::to_owned), coords))
        .collect()
}

pub fn lines_from_features(features: &[Feature]) -> Vec<Line> {
    let mut lines = vec![];

    for (n, feature) in features.iter().enumerate() {
        let name = string_property(feature, "name")
            .or_else(|| string_property(feature, "rt_symbol"))
            .or_else(|| string_property(feature, "id"));

        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(positions)) => {
                lines.extend(split_at_gaps(n, name.as_deref(), positions));
            }
            Some(Value::MultiLineString(parts)) => {
                for positions in parts {
                    lines.extend(split_at_gaps(n, name.as_deref(), positions));
                }
            }
            _ => warn!("Skipping feature {n}: not a line geometry"),
        }
    }

    lines
}

#[cfg(test)]
pub fn parse_stations(s: &str) -> anyhow::Result<Vec<Station>> {
    Ok(stations_from_features(&parse_feature_collection(s)?.features))
}

#[cfg(test)]
pub fn parse_lines(s: &str) -> anyhow::Result<Vec<Line>> {
    Ok(lines_from_features(&parse_feature_collection(s)?.features))
}
