pub mod io;
pub mod line;
pub mod station;

use std::path::Path;

use crate::network::{io::read_lines, io::read_stations, line::Line, station::Station};

/// Full snapshot of the input data. Graphs are always built from one of these.
pub struct Network {
    pub stations: Vec<Station>,
    pub lines: Vec<Line>,
}

impl Network {
    pub fn read<P: AsRef<Path>, Q: AsRef<Path>>(
        stations_path: P,
        lines_path: Q,
    ) -> anyhow::Result<Self> {
        let stations = read_stations(stations_path)?;
        let lines = read_lines(lines_path)?;

        Ok(Self { stations, lines })
    }
}
