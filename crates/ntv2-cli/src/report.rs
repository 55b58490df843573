//! Human-readable and JSON output.

use ntv2_grid::{GridShift, GridShiftFile, SubGrid};
use serde::Serialize;
use std::fmt::{self, Write};

/// Result of shifting one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftReport {
    pub from: String,
    pub to: String,
    pub sub_grid: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub shifted_lat: f64,
    pub shifted_lon: f64,
    /// Latitude shift in seconds.
    pub lat_shift_seconds: f64,
    /// Longitude shift in seconds, positive east.
    pub lon_shift_seconds: f64,
    pub lat_accuracy_seconds: Option<f64>,
    pub lon_accuracy_seconds: Option<f64>,
}

impl ShiftReport {
    pub fn new(file: &GridShiftFile, shift: &GridShift, reverse: bool) -> Self {
        let (from, to) = if reverse {
            (file.to_system(), file.from_system())
        } else {
            (file.from_system(), file.to_system())
        };
        Self {
            from: from.to_string(),
            to: to.to_string(),
            sub_grid: shift.sub_grid_name().map(str::to_string),
            lat: shift.lat_seconds() / ntv2_grid::SECONDS_PER_DEGREE,
            lon: -shift.lon_positive_west_seconds() / ntv2_grid::SECONDS_PER_DEGREE,
            shifted_lat: shift.shifted_lat_degrees(),
            shifted_lon: shift.shifted_lon_degrees(),
            lat_shift_seconds: shift.lat_shift_seconds(),
            lon_shift_seconds: -shift.lon_shift_positive_west_seconds(),
            lat_accuracy_seconds: shift.lat_accuracy_seconds(),
            lon_accuracy_seconds: shift.lon_accuracy_seconds(),
        }
    }
}

impl fmt::Display for ShiftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.from, self.to)?;
        writeln!(f, "  Input   : {:.9}, {:.9}", self.lat, self.lon)?;
        writeln!(f, "  Output  : {:.9}, {:.9}", self.shifted_lat, self.shifted_lon)?;
        writeln!(
            f,
            "  Shift   : {:.6}\" lat, {:.6}\" lon",
            self.lat_shift_seconds, self.lon_shift_seconds
        )?;
        if let (Some(lat), Some(lon)) = (self.lat_accuracy_seconds, self.lon_accuracy_seconds) {
            writeln!(f, "  Accuracy: {:.6}\" lat, {:.6}\" lon", lat, lon)?;
        }
        if let Some(name) = &self.sub_grid {
            writeln!(f, "  Sub-grid: {}", name)?;
        }
        Ok(())
    }
}

/// Describe the overview header and every sub-grid, indented by depth.
pub fn describe_file(file: &GridShiftFile) -> String {
    let header = file.header();
    let mut out = String::new();
    let _ = writeln!(out, "Type     : {}", header.shift_type);
    let _ = writeln!(out, "Version  : {}", header.version);
    let _ = writeln!(out, "From     : {}", header.from_system);
    let _ = writeln!(out, "To       : {}", header.to_system);
    let _ = writeln!(out, "Byte ord : {:?}", header.byte_order);
    let _ = writeln!(out, "Sub grids: {}", header.sub_grid_count);
    for root in file.roots() {
        describe_sub_grid(&mut out, root, 0);
    }
    out
}

fn describe_sub_grid(out: &mut String, grid: &SubGrid, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push('\n');
    for line in grid.details().lines() {
        let _ = writeln!(out, "{}{}", indent, line);
    }
    for child in grid.children() {
        describe_sub_grid(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_omits_missing_accuracy() {
        let report = ShiftReport {
            from: "NAD27".to_string(),
            to: "NAD83".to_string(),
            sub_grid: Some("QUEBEC".to_string()),
            lat: 45.5,
            lon: -73.6,
            shifted_lat: 45.50008,
            shifted_lon: -73.59951,
            lat_shift_seconds: 0.288,
            lon_shift_seconds: 1.764,
            lat_accuracy_seconds: None,
            lon_accuracy_seconds: None,
        };
        let text = report.to_string();
        assert!(text.starts_with("NAD27 -> NAD83"));
        assert!(text.contains("Sub-grid: QUEBEC"));
        assert!(!text.contains("Accuracy"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sub_grid"], "QUEBEC");
        assert!(json["lat_accuracy_seconds"].is_null());
    }
}
