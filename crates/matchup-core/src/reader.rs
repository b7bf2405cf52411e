//! Contracts for the sensor readers the matchup engine consumes.
//!
//! Format decoding lives outside this crate. A reader hands the engine:
//!
//! - the scene footprint and its time axes ([`AcquisitionInfo`])
//! - forward/inverse geolocation ([`PixelLocator`])
//! - per-pixel acquisition time ([`TimeLocator`])
//! - windowed variable reads for screenings

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geometry::{BoundingGeometry, Point, Polygon, TimeAxis};
use matchup_common::{MatchupError, MatchupResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A fractional raster position; integer part is the pixel, `.5` its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Raster size of a scene in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSize {
    pub nx: i32,
    pub ny: i32,
}

impl ProductSize {
    pub fn new(nx: i32, ny: i32) -> Self {
        Self { nx, ny }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.nx && y < self.ny
    }
}

/// Odd-sized pixel window centered on a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(width: u32, height: u32) -> MatchupResult<Self> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(MatchupError::reader(format!(
                "window must have odd dimensions, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    /// The 1x1 window on the center pixel.
    pub fn center() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Values of one variable in a window, row-major.
///
/// Pixels outside the raster hold `fill_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWindow {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
    pub fill_value: f64,
}

impl RawWindow {
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    pub fn center(&self) -> Option<f64> {
        self.get(self.width / 2, self.height / 2)
    }

    pub fn is_fill(&self, value: f64) -> bool {
        value == self.fill_value || (value.is_nan() && self.fill_value.is_nan())
    }
}

/// Footprint and timing of a scene as delivered by its reader.
#[derive(Debug, Clone)]
pub struct AcquisitionInfo {
    pub sensing_start: DateTime<Utc>,
    pub sensing_stop: DateTime<Utc>,
    pub bounding_geometry: BoundingGeometry,
    pub time_axes: Vec<TimeAxis>,
}

/// Bidirectional mapping between raster positions and lon/lat.
pub trait PixelLocator: Send + Sync {
    /// Geodetic location of a raster position, `None` outside the raster.
    fn geo_location(&self, x: f64, y: f64) -> Option<Point>;

    /// Every raster position seeing `lon`/`lat`.
    ///
    /// Scan overlaps can yield more than one candidate; an empty vector means
    /// the location is not covered.
    fn pixel_location(&self, lon: f64, lat: f64) -> Vec<PixelPos>;
}

/// Acquisition time of a pixel in milliseconds since the epoch.
pub trait TimeLocator: Send + Sync {
    fn time_for(&self, x: i32, y: i32) -> i64;
}

/// A sensor-specific product reader.
pub trait Reader: Send {
    fn open(&mut self, path: &Path) -> MatchupResult<()>;

    fn close(&mut self) -> MatchupResult<()>;

    fn read(&mut self) -> MatchupResult<AcquisitionInfo>;

    fn pixel_locator(&self) -> MatchupResult<Arc<dyn PixelLocator>>;

    /// Locator restricted to one part of a segmented footprint.
    fn sub_scene_pixel_locator(&self, polygon: &Polygon) -> MatchupResult<Arc<dyn PixelLocator>>;

    fn time_locator(&self) -> MatchupResult<Arc<dyn TimeLocator>>;

    fn product_size(&self) -> MatchupResult<ProductSize>;

    /// Unscaled values of `variable` in `window` around the center pixel.
    fn read_raw(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow>;

    /// Like [`Reader::read_raw`] with scale factor and offset applied.
    fn read_scaled(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow>;
}

/// Creates readers by sensor name.
pub trait ReaderFactory: Send + Sync {
    fn reader_for(&self, sensor: &str) -> MatchupResult<Box<dyn Reader>>;
}

/// Pick the locator matching how the footprint was split.
///
/// Segmented bounds need a sub-scene locator per part; everything else uses
/// the reader's full-scene locator.
pub fn pixel_locator_for(
    reader: &dyn Reader,
    bounds: &BoundingGeometry,
    polygon: &Polygon,
) -> MatchupResult<Arc<dyn PixelLocator>> {
    if bounds.is_segmented() {
        reader.sub_scene_pixel_locator(polygon)
    } else {
        reader.pixel_locator()
    }
}

/// A reader that stays open for the guard's lifetime.
///
/// Closing happens in `Drop`, so every exit path of a processing loop
/// releases the file. Close failures are logged.
pub struct OpenReader {
    reader: Box<dyn Reader>,
    path: PathBuf,
}

impl OpenReader {
    pub fn open(mut reader: Box<dyn Reader>, path: &Path) -> MatchupResult<Self> {
        if let Err(err) = reader.open(path) {
            if let Err(close_err) = reader.close() {
                warn!(path = %path.display(), error = %close_err, "Failed to close reader after open failure");
            }
            return Err(err);
        }
        Ok(Self {
            reader,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reader(&self) -> &dyn Reader {
        self.reader.as_ref()
    }

    pub fn reader_mut(&mut self) -> &mut dyn Reader {
        self.reader.as_mut()
    }
}

impl fmt::Debug for OpenReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenReader").field("path", &self.path).finish()
    }
}

impl Drop for OpenReader {
    fn drop(&mut self) {
        if let Err(err) = self.reader.close() {
            warn!(path = %self.path.display(), error = %err, "Failed to close reader");
        }
    }
}
