//! Bilinear interpolation within one lattice cell.
//!
//! Corner naming follows the usual NTv2 convention:
//!
//! ```text
//!   C ---- D      +lat
//!   |      |       ^
//!   A ---- B       +--> +lon (positive west)
//! ```

use crate::shift::GridShift;

/// Blend four corner values using fractional cell offsets `x` (longitude)
/// and `y` (latitude), both in `[0, 1)`.
pub fn interpolate(a: f64, b: f64, c: f64, d: f64, x: f64, y: f64) -> f64 {
    a + (b - a) * x + (c - a) * y + (a + d - b - c) * x * y
}

/// Position of a coordinate inside the lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Longitude column of corner A.
    pub column: usize,
    /// Latitude row of corner A.
    pub row: usize,
    /// Fractional offset along longitude.
    pub x: f64,
    /// Fractional offset along latitude.
    pub y: f64,
    columns: usize,
}

impl Cell {
    /// Locate `(lon, lat)` in a lattice with origin `(min_lon, min_lat)`.
    ///
    /// Returns `None` for coordinates below the origin or not a number.
    pub fn locate(
        lon: f64,
        lat: f64,
        min_lon: f64,
        min_lat: f64,
        lon_interval: f64,
        lat_interval: f64,
        columns: usize,
    ) -> Option<Cell> {
        let col_f = ((lon - min_lon) / lon_interval).floor();
        let row_f = ((lat - min_lat) / lat_interval).floor();
        if !(col_f >= 0.0 && row_f >= 0.0) {
            return None;
        }
        let column = col_f as usize;
        let row = row_f as usize;

        let x = (lon - (min_lon + lon_interval * column as f64)) / lon_interval;
        let y = (lat - (min_lat + lat_interval * row as f64)) / lat_interval;

        Some(Cell {
            column,
            row,
            x,
            y,
            columns,
        })
    }

    /// Flattened node indices of corners A, B, C and D.
    pub fn corners(&self) -> [usize; 4] {
        let a = self.column + self.row * self.columns;
        let c = a + self.columns;
        [a, a + 1, c, c + 1]
    }
}

/// Corner values of every series for one cell, ordered A, B, C, D.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CornerValues {
    pub lat_shift: [f32; 4],
    pub lon_shift: [f32; 4],
    pub accuracy: Option<([f32; 4], [f32; 4])>,
}

impl CornerValues {
    /// Regroup node records (`[lat, lon, lat_acc, lon_acc]` per corner) by series.
    pub fn from_nodes(nodes: [[f32; 4]; 4]) -> Self {
        let series = |field: usize| nodes.map(|node| node[field]);
        Self {
            lat_shift: series(0),
            lon_shift: series(1),
            accuracy: Some((series(2), series(3))),
        }
    }

    /// Interpolate every series present at the cell offsets.
    pub fn interpolate(&self, cell: &Cell) -> Interpolated {
        let blend = |v: &[f32; 4]| {
            interpolate(
                v[0] as f64,
                v[1] as f64,
                v[2] as f64,
                v[3] as f64,
                cell.x,
                cell.y,
            )
        };
        Interpolated {
            lat_shift: blend(&self.lat_shift),
            lon_shift: blend(&self.lon_shift),
            accuracy: self
                .accuracy
                .as_ref()
                .map(|(lat, lon)| (blend(lat), blend(lon))),
        }
    }
}

/// Interpolated values, ready to be written into a [`GridShift`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interpolated {
    pub lat_shift: f64,
    pub lon_shift: f64,
    pub accuracy: Option<(f64, f64)>,
}

impl Interpolated {
    pub fn apply(&self, gs: &mut GridShift) {
        gs.set_lat_shift_seconds(self.lat_shift);
        gs.set_lon_shift_positive_west_seconds(self.lon_shift);
        gs.set_lat_accuracy_seconds(self.accuracy.map(|(lat, _)| lat));
        gs.set_lon_accuracy_seconds(self.accuracy.map(|(_, lon)| lon));
    }
}
