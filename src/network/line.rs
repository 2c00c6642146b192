use geo_types::Point;

/// Ordered geometry of a transit line. Stations are attached to it only by proximity.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: Option<String>,
    pub coords: Vec<Point>,
}

impl Line {
    pub fn new(name: Option<String>, coords: Vec<Point>) -> Self {
        Self { name, coords }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
