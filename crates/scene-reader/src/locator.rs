//! Affine pixel and line-based time locators.

use geometry::Point;
use matchup_core::{PixelLocator, PixelPos, TimeLocator};

use crate::manifest::SceneManifest;

/// Regular lon/lat raster geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub nx: i32,
    pub ny: i32,
    pub lon_origin: f64,
    pub lat_origin: f64,
    pub lon_step: f64,
    pub lat_step: f64,
}

impl GridGeometry {
    pub fn from_manifest(manifest: &SceneManifest) -> Self {
        Self {
            nx: manifest.nx,
            ny: manifest.ny,
            lon_origin: manifest.lon_origin,
            lat_origin: manifest.lat_origin,
            lon_step: manifest.lon_step,
            lat_step: manifest.lat_step,
        }
    }

    /// Location of a continuous raster position without bounds checks.
    pub fn point_at(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.lon_origin + x * self.lon_step,
            self.lat_origin + y * self.lat_step,
        )
    }

    /// Location of the center of pixel `(x, y)`.
    pub fn pixel_center(&self, x: i32, y: i32) -> Point {
        self.point_at(x as f64 + 0.5, y as f64 + 0.5)
    }

    pub fn contains_pixel(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.nx && y >= 0 && y < self.ny
    }
}

/// Pixel locator over the lines `[first_line, last_line)`.
#[derive(Debug, Clone, Copy)]
pub struct GridPixelLocator {
    grid: GridGeometry,
    first_line: i32,
    last_line: i32,
}

impl GridPixelLocator {
    pub fn new(grid: GridGeometry) -> Self {
        Self::for_lines(grid, 0, grid.ny)
    }

    pub fn for_lines(grid: GridGeometry, first_line: i32, last_line: i32) -> Self {
        Self {
            grid,
            first_line,
            last_line,
        }
    }

    fn covers(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && x <= self.grid.nx as f64 && y >= self.first_line as f64 && y <= self.last_line as f64
    }
}

impl PixelLocator for GridPixelLocator {
    fn geo_location(&self, x: f64, y: f64) -> Option<Point> {
        self.covers(x, y).then(|| self.grid.point_at(x, y))
    }

    fn pixel_location(&self, lon: f64, lat: f64) -> Vec<PixelPos> {
        let x = (lon - self.grid.lon_origin) / self.grid.lon_step;
        let y = (lat - self.grid.lat_origin) / self.grid.lat_step;
        let inside = x >= 0.0
            && x < self.grid.nx as f64
            && y >= self.first_line as f64
            && y < self.last_line as f64;
        if inside {
            vec![PixelPos::new(x, y)]
        } else {
            Vec::new()
        }
    }
}

/// Every pixel of a line shares the line's acquisition time.
#[derive(Debug, Clone, Copy)]
pub struct LineTimeLocator {
    start_millis: i64,
    line_duration_ms: i64,
}

impl LineTimeLocator {
    pub fn new(start_millis: i64, line_duration_ms: i64) -> Self {
        Self {
            start_millis,
            line_duration_ms,
        }
    }
}

impl TimeLocator for LineTimeLocator {
    fn time_for(&self, _x: i32, y: i32) -> i64 {
        self.start_millis + y as i64 * self.line_duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridGeometry {
        GridGeometry {
            nx: 10,
            ny: 20,
            lon_origin: -5.0,
            lat_origin: 60.0,
            lon_step: 0.25,
            lat_step: -0.5,
        }
    }

    #[test]
    fn test_round_trip_pixel_center() {
        let locator = GridPixelLocator::new(grid());
        let center = locator.geo_location(3.5, 7.5).unwrap();
        assert!((center.lon - -4.125).abs() < 1e-12);
        assert!((center.lat - 56.25).abs() < 1e-12);

        let pixels = locator.pixel_location(center.lon, center.lat);
        assert_eq!(pixels.len(), 1);
        assert!((pixels[0].x - 3.5).abs() < 1e-9);
        assert!((pixels[0].y - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_outside_raster() {
        let locator = GridPixelLocator::new(grid());
        assert!(locator.pixel_location(-5.1, 59.0).is_empty());
        assert!(locator.pixel_location(-4.0, 50.0).is_empty());
        assert!(locator.geo_location(-0.5, 1.0).is_none());
        assert!(locator.geo_location(10.0, 20.0).is_some());
    }

    #[test]
    fn test_line_range_restricts_lookup() {
        let locator = GridPixelLocator::for_lines(grid(), 10, 20);
        assert!(locator.pixel_location(-4.0, 57.0).is_empty());
        assert_eq!(locator.pixel_location(-4.0, 54.0).len(), 1);
        assert!(locator.geo_location(1.0, 9.0).is_none());
    }

    #[test]
    fn test_line_time() {
        let locator = LineTimeLocator::new(1_000, 250);
        assert_eq!(locator.time_for(0, 0), 1_000);
        assert_eq!(locator.time_for(9, 4), 2_000);
    }
}
