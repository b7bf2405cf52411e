//! Generators for synthetic swaths.
//!
//! These generators create predictable, verifiable scenes that can be used
//! across the test suite, either in memory or as JSON manifests on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use geometry::{BoundingGeometry, LineString, Point, Polygon, TimeAxis};
use matchup_core::{AcquisitionInfo, ProductSize};
use serde_json::json;

use crate::fixtures::{
    utc, AffinePixelLocator, InMemoryScene, LineTimeLocator, FILL_VALUE,
};

/// A swath on a regular lon/lat grid with line-based timing.
///
/// Pixel `(x, y)` has its upper-left corner at `origin + (x, y) * step` and
/// is acquired at `start + y * line_duration_ms`.
#[derive(Debug, Clone)]
pub struct SyntheticSwath {
    pub sensor: String,
    pub nx: i32,
    pub ny: i32,
    pub lon_origin: f64,
    pub lat_origin: f64,
    pub lon_step: f64,
    pub lat_step: f64,
    pub start: DateTime<Utc>,
    pub line_duration_ms: i64,
    pub variables: HashMap<String, Vec<f64>>,
}

impl SyntheticSwath {
    pub fn new(sensor: &str, nx: i32, ny: i32) -> Self {
        Self {
            sensor: sensor.to_string(),
            nx,
            ny,
            lon_origin: 0.0,
            lat_origin: 0.0,
            lon_step: 1.0,
            lat_step: 1.0,
            start: utc(2016, 3, 2, 10, 0, 0),
            line_duration_ms: 1_000,
            variables: HashMap::new(),
        }
    }

    pub fn origin(mut self, lon: f64, lat: f64) -> Self {
        self.lon_origin = lon;
        self.lat_origin = lat;
        self
    }

    pub fn step(mut self, lon_step: f64, lat_step: f64) -> Self {
        self.lon_step = lon_step;
        self.lat_step = lat_step;
        self
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn line_duration_ms(mut self, millis: i64) -> Self {
        self.line_duration_ms = millis;
        self
    }

    /// Add a variable with values computed per pixel.
    pub fn variable(mut self, name: &str, value: impl Fn(i32, i32) -> f64) -> Self {
        let mut data = Vec::with_capacity((self.nx * self.ny) as usize);
        for y in 0..self.ny {
            for x in 0..self.nx {
                data.push(value(x, y));
            }
        }
        self.variables.insert(name.to_string(), data);
        self
    }

    pub fn stop(&self) -> DateTime<Utc> {
        self.start + Duration::milliseconds(self.ny as i64 * self.line_duration_ms)
    }

    fn point_at(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.lon_origin + x * self.lon_step,
            self.lat_origin + y * self.lat_step,
        )
    }

    pub fn footprint(&self) -> Polygon {
        let (nx, ny) = (self.nx as f64, self.ny as f64);
        Polygon::new(&[
            self.point_at(0.0, 0.0),
            self.point_at(nx, 0.0),
            self.point_at(nx, ny),
            self.point_at(0.0, ny),
        ])
        .expect("valid swath footprint")
    }

    /// Center-column time axis from first to last line.
    pub fn time_axis(&self) -> TimeAxis {
        let center = self.nx as f64 / 2.0;
        let line = LineString::new(&[
            self.point_at(center, 0.0),
            self.point_at(center, self.ny as f64),
        ])
        .expect("valid swath axis");
        TimeAxis::new(line, self.start, self.stop()).expect("non-degenerate swath axis")
    }

    pub fn build(&self) -> InMemoryScene {
        InMemoryScene {
            sensor: self.sensor.clone(),
            info: AcquisitionInfo {
                sensing_start: self.start,
                sensing_stop: self.stop(),
                bounding_geometry: BoundingGeometry::Single(self.footprint()),
                time_axes: vec![self.time_axis()],
            },
            size: ProductSize::new(self.nx, self.ny),
            pixel_locator: Arc::new(AffinePixelLocator {
                nx: self.nx,
                ny: self.ny,
                lon_origin: self.lon_origin,
                lat_origin: self.lat_origin,
                lon_step: self.lon_step,
                lat_step: self.lat_step,
            }),
            sub_scene_locators: Vec::new(),
            time_locator: Arc::new(LineTimeLocator {
                start_millis: self.start.timestamp_millis(),
                line_duration_ms: self.line_duration_ms,
            }),
            variables: self.variables.clone(),
            scale_factor: 1.0,
        }
    }

    /// Scene manifest in the JSON layout of the scene reader.
    pub fn manifest_json(&self) -> serde_json::Value {
        let variables: serde_json::Map<String, serde_json::Value> = self
            .variables
            .iter()
            .map(|(name, values)| {
                (
                    name.clone(),
                    json!({ "values": values, "fill_value": FILL_VALUE }),
                )
            })
            .collect();
        json!({
            "sensor": self.sensor,
            "nx": self.nx,
            "ny": self.ny,
            "lon_origin": self.lon_origin,
            "lat_origin": self.lat_origin,
            "lon_step": self.lon_step,
            "lat_step": self.lat_step,
            "start_time": self.start.to_rfc3339(),
            "line_duration_ms": self.line_duration_ms,
            "variables": variables,
        })
    }

    /// Write the manifest to `dir/file_name` and return its path.
    pub fn write_manifest(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        let content = serde_json::to_string_pretty(&self.manifest_json()).expect("serializable manifest");
        fs::write(&path, content).expect("writable manifest");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swath_timing_and_footprint() {
        let swath = SyntheticSwath::new("mhs-n18", 4, 10).line_duration_ms(500);
        assert_eq!(swath.stop(), swath.start + Duration::seconds(5));
        assert!((swath.footprint().area() - 40.0).abs() < 1e-9);
        assert_eq!(swath.time_axis().end_time(), swath.stop());
    }

    #[test]
    fn test_manifest_json() {
        let swath = SyntheticSwath::new("mhs-n18", 2, 1).variable("tb", |x, _| x as f64);
        let json = swath.manifest_json();
        assert_eq!(json["nx"], 2);
        assert_eq!(json["variables"]["tb"]["values"], json!([0.0, 1.0]));
    }
}
