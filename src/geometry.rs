//! Planar distance helpers. Longitude and latitude degrees are treated as a flat
//! plane, which is a city-scale approximation and not a geodesic distance.

use geo_types::Point;
use serde::{ser::SerializeSeq, Serialize, Serializer};

use crate::network::station::Station;

/// Euclidean distance between two `(lng, lat)` points. Used as edge weight and as
/// the heuristic of the guided search.
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Linear scan for the station closest to `point`.
///
/// Ties go to the station seen first. Returns `None` for an empty station slice,
/// which callers must rule out before relying on a result, and for a point with
/// non-finite coordinates.
pub fn find_nearest_station(point: Point, stations: &[Station]) -> Option<&Station> {
    let mut nearest: Option<(&Station, f64)> = None;

    for station in stations {
        let d = distance(point, station.coord);
        if d.is_nan() {
            continue;
        }
        match nearest {
            Some((_, best)) if d >= best => {}
            _ => nearest = Some((station, d)),
        }
    }

    nearest.map(|(station, _)| station)
}

/// Writes a point as a `[lng, lat]` pair.
pub fn serialize_lnglat<S: Serializer>(point: &Point, serializer: S) -> Result<S::Ok, S::Error> {
    [point.x(), point.y()].serialize(serializer)
}

/// Writes a sequence of points as `[[lng, lat], ...]`.
pub fn serialize_lnglat_seq<S: Serializer>(
    points: &[Point],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(points.len()))?;
    for p in points {
        seq.serialize_element(&[p.x(), p.y()])?;
    }
    seq.end()
}
