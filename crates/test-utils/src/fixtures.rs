//! Common test fixtures for matchup tests.
//!
//! Locators with known, exact mappings plus an in-memory scene archive that
//! serves both as [`ObservationSource`] and [`ReaderFactory`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use geometry::{Point, Polygon};
use matchup_core::{
    AcquisitionInfo, MatchupError, MatchupResult, ObservationCatalog, PixelLocator, PixelPos,
    ProductSize, RawWindow, Reader, ReaderFactory, SatelliteObservation, TimeLocator, Window,
};

/// Sensor names used across tests.
pub mod sensors {
    pub const AMSUB_N15: &str = "amsub-n15";
    pub const MHS_N18: &str = "mhs-n18";
    pub const AVHRR_N17: &str = "avhrr-n17";
}

/// Reference times.
pub mod time {
    /// 2016-03-02T10:00:00Z in milliseconds since the epoch.
    pub const REFERENCE_MILLIS: i64 = 1_456_912_800_000;
}

pub const FILL_VALUE: f64 = -32768.0;

/// UTC timestamp, panicking on invalid input.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid test timestamp")
}

/// Axis-aligned rectangle polygon.
pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon {
    Polygon::new(&[
        Point::new(min_lon, min_lat),
        Point::new(max_lon, min_lat),
        Point::new(max_lon, max_lat),
        Point::new(min_lon, max_lat),
    ])
    .expect("valid test rectangle")
}

/// Identity geolocation shifted by a pixel offset: pixel `(x, y)` sits at
/// `(x - x_offset, y - y_offset)`.
#[derive(Debug, Clone, Copy)]
pub struct OffsetPixelLocator {
    pub x_offset: f64,
    pub y_offset: f64,
}

impl OffsetPixelLocator {
    pub fn new(x_offset: f64, y_offset: f64) -> Self {
        Self { x_offset, y_offset }
    }
}

impl PixelLocator for OffsetPixelLocator {
    fn geo_location(&self, x: f64, y: f64) -> Option<Point> {
        Some(Point::new(x - self.x_offset, y - self.y_offset))
    }

    fn pixel_location(&self, lon: f64, lat: f64) -> Vec<PixelPos> {
        vec![PixelPos::new(lon + self.x_offset, lat + self.y_offset)]
    }
}

/// Affine geolocation over a finite raster.
#[derive(Debug, Clone, Copy)]
pub struct AffinePixelLocator {
    pub nx: i32,
    pub ny: i32,
    pub lon_origin: f64,
    pub lat_origin: f64,
    pub lon_step: f64,
    pub lat_step: f64,
}

impl PixelLocator for AffinePixelLocator {
    fn geo_location(&self, x: f64, y: f64) -> Option<Point> {
        let inside = x >= 0.0 && x <= self.nx as f64 && y >= 0.0 && y <= self.ny as f64;
        inside.then(|| {
            Point::new(
                self.lon_origin + x * self.lon_step,
                self.lat_origin + y * self.lat_step,
            )
        })
    }

    fn pixel_location(&self, lon: f64, lat: f64) -> Vec<PixelPos> {
        let x = (lon - self.lon_origin) / self.lon_step;
        let y = (lat - self.lat_origin) / self.lat_step;
        if x >= 0.0 && x < self.nx as f64 && y >= 0.0 && y < self.ny as f64 {
            vec![PixelPos::new(x, y)]
        } else {
            Vec::new()
        }
    }
}

/// Locator that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPixelLocator;

impl PixelLocator for EmptyPixelLocator {
    fn geo_location(&self, _x: f64, _y: f64) -> Option<Point> {
        None
    }

    fn pixel_location(&self, _lon: f64, _lat: f64) -> Vec<PixelPos> {
        Vec::new()
    }
}

/// Time `x + 1000 * y`, which makes every pixel's time unique and readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelTimeLocator;

impl TimeLocator for PixelTimeLocator {
    fn time_for(&self, x: i32, y: i32) -> i64 {
        x as i64 + 1000 * y as i64
    }
}

/// All pixels of a line share its acquisition time.
#[derive(Debug, Clone, Copy)]
pub struct LineTimeLocator {
    pub start_millis: i64,
    pub line_duration_ms: i64,
}

impl TimeLocator for LineTimeLocator {
    fn time_for(&self, _x: i32, y: i32) -> i64 {
        self.start_millis + y as i64 * self.line_duration_ms
    }
}

/// A scene held in memory.
#[derive(Clone)]
pub struct InMemoryScene {
    pub sensor: String,
    pub info: AcquisitionInfo,
    pub size: ProductSize,
    pub pixel_locator: Arc<dyn PixelLocator>,
    /// Locators per footprint segment, matched by polygon equality.
    pub sub_scene_locators: Vec<(Polygon, Arc<dyn PixelLocator>)>,
    pub time_locator: Arc<dyn TimeLocator>,
    /// Row-major values per variable.
    pub variables: HashMap<String, Vec<f64>>,
    pub scale_factor: f64,
}

impl InMemoryScene {
    pub fn observation(&self, path: impl Into<PathBuf>) -> SatelliteObservation {
        SatelliteObservation {
            sensor: self.sensor.clone(),
            version: None,
            data_file_path: path.into(),
            start_time: self.info.sensing_start,
            stop_time: self.info.sensing_stop,
            geo_bounds: self.info.bounding_geometry.clone(),
            time_axes: self.info.time_axes.clone(),
        }
    }

    fn window(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
        scale: f64,
    ) -> MatchupResult<RawWindow> {
        let values = self
            .variables
            .get(variable)
            .ok_or_else(|| MatchupError::reader(format!("no variable '{}'", variable)))?;
        let width = window.width() as i32;
        let height = window.height() as i32;
        let mut data = Vec::with_capacity((width * height) as usize);
        for dy in 0..height {
            for dx in 0..width {
                let x = center_x - width / 2 + dx;
                let y = center_y - height / 2 + dy;
                let value = if self.size.contains(x, y) {
                    values[(y * self.size.nx + x) as usize]
                } else {
                    FILL_VALUE
                };
                data.push(if value == FILL_VALUE { value } else { value * scale });
            }
        }
        Ok(RawWindow {
            width: window.width(),
            height: window.height(),
            data,
            fill_value: FILL_VALUE,
        })
    }
}

/// Scenes by path, shared between the catalog and the readers.
#[derive(Clone, Default)]
pub struct InMemoryArchive {
    scenes: HashMap<PathBuf, InMemoryScene>,
    order: Vec<PathBuf>,
    failing: Vec<PathBuf>,
    open_readers: Arc<AtomicUsize>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, path: impl Into<PathBuf>, scene: InMemoryScene) -> Self {
        let path = path.into();
        self.order.push(path.clone());
        self.scenes.insert(path, scene);
        self
    }

    /// Listed in the catalog, but opening it fails.
    pub fn with_broken_scene(mut self, path: impl Into<PathBuf>, scene: InMemoryScene) -> Self {
        let path = path.into();
        self.failing.push(path.clone());
        self.with_scene(path, scene)
    }

    pub fn catalog(&self) -> ObservationCatalog {
        self.order
            .iter()
            .filter_map(|path| self.scenes.get(path).map(|scene| scene.observation(path)))
            .collect()
    }

    /// Readers currently open; zero once every reader has been closed.
    pub fn open_readers(&self) -> usize {
        self.open_readers.load(Ordering::SeqCst)
    }
}

impl ReaderFactory for InMemoryArchive {
    fn reader_for(&self, _sensor: &str) -> MatchupResult<Box<dyn Reader>> {
        Ok(Box::new(InMemoryReader {
            archive: self.clone(),
            scene: None,
        }))
    }
}

/// Reader over an [`InMemoryArchive`].
pub struct InMemoryReader {
    archive: InMemoryArchive,
    scene: Option<InMemoryScene>,
}

impl InMemoryReader {
    fn scene(&self) -> MatchupResult<&InMemoryScene> {
        self.scene
            .as_ref()
            .ok_or_else(|| MatchupError::reader("no scene open"))
    }
}

impl Reader for InMemoryReader {
    fn open(&mut self, path: &Path) -> MatchupResult<()> {
        if self.archive.failing.iter().any(|p| p == path) {
            return Err(MatchupError::reader(format!("corrupt scene {}", path.display())));
        }
        let scene = self
            .archive
            .scenes
            .get(path)
            .cloned()
            .ok_or_else(|| MatchupError::reader(format!("no scene at {}", path.display())))?;
        self.scene = Some(scene);
        self.archive.open_readers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> MatchupResult<()> {
        if self.scene.take().is_some() {
            self.archive.open_readers.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn read(&mut self) -> MatchupResult<AcquisitionInfo> {
        Ok(self.scene()?.info.clone())
    }

    fn pixel_locator(&self) -> MatchupResult<Arc<dyn PixelLocator>> {
        Ok(self.scene()?.pixel_locator.clone())
    }

    fn sub_scene_pixel_locator(&self, polygon: &Polygon) -> MatchupResult<Arc<dyn PixelLocator>> {
        self.scene()?
            .sub_scene_locators
            .iter()
            .find(|(part, _)| part == polygon)
            .map(|(_, locator)| locator.clone())
            .ok_or_else(|| MatchupError::reader("no sub-scene locator for polygon"))
    }

    fn time_locator(&self) -> MatchupResult<Arc<dyn TimeLocator>> {
        Ok(self.scene()?.time_locator.clone())
    }

    fn product_size(&self) -> MatchupResult<ProductSize> {
        Ok(self.scene()?.size)
    }

    fn read_raw(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow> {
        self.scene()?.window(center_x, center_y, window, variable, 1.0)
    }

    fn read_scaled(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow> {
        let scene = self.scene()?;
        scene.window(center_x, center_y, window, variable, scene.scale_factor)
    }
}
