use geo_types::Point;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(String);

impl StationId {
    pub fn new(str: &str) -> Self {
        Self(str.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// x is longitude, y is latitude
    pub coord: Point,
}

impl Station {
    pub fn new(id: StationId, name: String, coord: Point) -> Self {
        Self { id, name, coord }
    }

    /// A station can join a graph only with a non-empty id and finite coordinates.
    pub fn is_valid(&self) -> bool {
        !self.id.as_str().trim().is_empty()
            && self.coord.x().is_finite()
            && self.coord.y().is_finite()
    }
}
