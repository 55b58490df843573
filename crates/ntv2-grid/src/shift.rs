//! Coordinate and result carrier for a grid shift.

use serde::Serialize;

/// Seconds of arc per degree.
pub const SECONDS_PER_DEGREE: f64 = 3600.0;

/// A coordinate to shift together with the shift computed for it.
///
/// Longitudes are positive west, in seconds of arc, matching the NTv2
/// convention. Latitudes are seconds of arc, positive north.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridShift {
    lat_seconds: f64,
    lon_positive_west_seconds: f64,
    lat_shift_seconds: f64,
    lon_shift_positive_west_seconds: f64,
    lat_accuracy_seconds: f64,
    lon_accuracy_seconds: f64,
    lat_accuracy_available: bool,
    lon_accuracy_available: bool,
    sub_grid_name: Option<String>,
}

impl GridShift {
    /// Create a request from seconds of arc (longitude positive west).
    pub fn new(lat_seconds: f64, lon_positive_west_seconds: f64) -> Self {
        Self {
            lat_seconds,
            lon_positive_west_seconds,
            ..Self::default()
        }
    }

    /// Create a request from decimal degrees (longitude positive east).
    pub fn from_degrees(lat: f64, lon_positive_east: f64) -> Self {
        Self::new(
            lat * SECONDS_PER_DEGREE,
            -lon_positive_east * SECONDS_PER_DEGREE,
        )
    }

    /// Request latitude in seconds.
    pub fn lat_seconds(&self) -> f64 {
        self.lat_seconds
    }

    /// Request longitude in positive west seconds.
    pub fn lon_positive_west_seconds(&self) -> f64 {
        self.lon_positive_west_seconds
    }

    /// Set the request latitude in seconds.
    pub fn set_lat_seconds(&mut self, lat_seconds: f64) {
        self.lat_seconds = lat_seconds;
    }

    /// Set the request longitude in positive west seconds.
    pub fn set_lon_positive_west_seconds(&mut self, lon: f64) {
        self.lon_positive_west_seconds = lon;
    }

    /// Latitude shift in seconds.
    pub fn lat_shift_seconds(&self) -> f64 {
        self.lat_shift_seconds
    }

    /// Longitude shift in positive west seconds.
    pub fn lon_shift_positive_west_seconds(&self) -> f64 {
        self.lon_shift_positive_west_seconds
    }

    /// Set the latitude shift in seconds.
    pub fn set_lat_shift_seconds(&mut self, shift: f64) {
        self.lat_shift_seconds = shift;
    }

    /// Set the longitude shift in positive west seconds.
    pub fn set_lon_shift_positive_west_seconds(&mut self, shift: f64) {
        self.lon_shift_positive_west_seconds = shift;
    }

    /// Latitude accuracy in seconds, if the grid carries accuracy values.
    pub fn lat_accuracy_seconds(&self) -> Option<f64> {
        self.lat_accuracy_available.then_some(self.lat_accuracy_seconds)
    }

    /// Longitude accuracy in seconds, if the grid carries accuracy values.
    pub fn lon_accuracy_seconds(&self) -> Option<f64> {
        self.lon_accuracy_available.then_some(self.lon_accuracy_seconds)
    }

    /// Check whether a latitude accuracy was produced.
    pub fn is_lat_accuracy_available(&self) -> bool {
        self.lat_accuracy_available
    }

    /// Check whether a longitude accuracy was produced.
    pub fn is_lon_accuracy_available(&self) -> bool {
        self.lon_accuracy_available
    }

    /// Set or clear the latitude accuracy.
    pub fn set_lat_accuracy_seconds(&mut self, accuracy: Option<f64>) {
        self.lat_accuracy_available = accuracy.is_some();
        self.lat_accuracy_seconds = accuracy.unwrap_or(0.0);
    }

    /// Set or clear the longitude accuracy.
    pub fn set_lon_accuracy_seconds(&mut self, accuracy: Option<f64>) {
        self.lon_accuracy_available = accuracy.is_some();
        self.lon_accuracy_seconds = accuracy.unwrap_or(0.0);
    }

    /// Name of the sub-grid that produced the last shift.
    pub fn sub_grid_name(&self) -> Option<&str> {
        self.sub_grid_name.as_deref()
    }

    /// Record the sub-grid that produced the shift.
    pub fn set_sub_grid_name(&mut self, name: Option<String>) {
        self.sub_grid_name = name;
    }

    /// Shifted latitude in seconds.
    pub fn shifted_lat_seconds(&self) -> f64 {
        self.lat_seconds + self.lat_shift_seconds
    }

    /// Shifted longitude in positive west seconds.
    pub fn shifted_lon_positive_west_seconds(&self) -> f64 {
        self.lon_positive_west_seconds + self.lon_shift_positive_west_seconds
    }

    /// Shifted latitude in decimal degrees.
    pub fn shifted_lat_degrees(&self) -> f64 {
        self.shifted_lat_seconds() / SECONDS_PER_DEGREE
    }

    /// Shifted longitude in decimal degrees, positive east.
    pub fn shifted_lon_degrees(&self) -> f64 {
        -self.shifted_lon_positive_west_seconds() / SECONDS_PER_DEGREE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_degrees_converts_to_positive_west_seconds() {
        let gs = GridShift::from_degrees(45.5, -75.25);
        assert_relative_eq!(gs.lat_seconds(), 163_800.0);
        assert_relative_eq!(gs.lon_positive_west_seconds(), 270_900.0);
    }

    #[test]
    fn test_shifted_coordinates() {
        let mut gs = GridShift::from_degrees(45.0, -75.0);
        gs.set_lat_shift_seconds(0.36);
        gs.set_lon_shift_positive_west_seconds(-1.8);

        assert_relative_eq!(gs.shifted_lat_degrees(), 45.0001, epsilon = 1e-12);
        assert_relative_eq!(gs.shifted_lon_degrees(), -74.9995, epsilon = 1e-12);
    }

    #[test]
    fn test_accuracy_availability() {
        let mut gs = GridShift::default();
        assert_eq!(gs.lat_accuracy_seconds(), None);

        gs.set_lat_accuracy_seconds(Some(0.05));
        assert!(gs.is_lat_accuracy_available());
        assert_eq!(gs.lat_accuracy_seconds(), Some(0.05));

        gs.set_lat_accuracy_seconds(None);
        assert!(!gs.is_lat_accuracy_available());
        assert!(!gs.is_lon_accuracy_available());
    }
}
