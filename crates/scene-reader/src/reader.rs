//! [`Reader`] implementation for manifest scenes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geometry::{BoundingGeometry, LineString, Polygon, TimeAxis};
use matchup_common::MatchupResult;
use matchup_core::{
    AcquisitionInfo, PixelLocator, ProductSize, RawWindow, Reader, ReaderFactory, TimeLocator,
    Window,
};
use tracing::debug;

use crate::error::{SceneError, SceneResult};
use crate::locator::{GridGeometry, GridPixelLocator, LineTimeLocator};
use crate::manifest::{SceneManifest, VariableSpec, DEFAULT_FILL_VALUE};

pub const LON_VARIABLE: &str = "lon";
pub const LAT_VARIABLE: &str = "lat";

/// An opened manifest.
#[derive(Debug, Clone)]
pub struct Scene {
    path: PathBuf,
    manifest: SceneManifest,
    grid: GridGeometry,
}

/// Where the values of a variable come from.
#[derive(Clone, Copy)]
enum VariableSource<'a> {
    Stored(&'a VariableSpec),
    Longitude,
    Latitude,
}

impl Scene {
    pub fn open(path: &Path) -> SceneResult<Self> {
        let manifest = SceneManifest::load(path)?;
        Ok(Self::from_manifest(path, manifest))
    }

    pub fn from_manifest(path: &Path, manifest: SceneManifest) -> Self {
        Self {
            path: path.to_path_buf(),
            grid: GridGeometry::from_manifest(&manifest),
            manifest,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &SceneManifest {
        &self.manifest
    }

    pub fn grid(&self) -> GridGeometry {
        self.grid
    }

    fn segment_polygon(&self, first_line: i32, last_line: i32) -> SceneResult<Polygon> {
        let nx = self.grid.nx as f64;
        Ok(Polygon::new(&[
            self.grid.point_at(0.0, first_line as f64),
            self.grid.point_at(nx, first_line as f64),
            self.grid.point_at(nx, last_line as f64),
            self.grid.point_at(0.0, last_line as f64),
        ])?)
    }

    /// Center-column axis of lines `[first_line, last_line)`.
    fn segment_axis(&self, first_line: i32, last_line: i32) -> SceneResult<TimeAxis> {
        let center = self.grid.nx as f64 / 2.0;
        let line = LineString::new(&[
            self.grid.point_at(center, first_line as f64),
            self.grid.point_at(center, last_line as f64),
        ])?;
        Ok(TimeAxis::new(
            line,
            self.manifest.line_time(first_line),
            self.manifest.line_time(last_line),
        )?)
    }

    pub fn acquisition_info(&self) -> SceneResult<AcquisitionInfo> {
        let segments = self.manifest.segments();
        let mut polygons = Vec::with_capacity(segments.len());
        let mut time_axes = Vec::with_capacity(segments.len());
        for &(first, last) in &segments {
            polygons.push(self.segment_polygon(first, last)?);
            time_axes.push(self.segment_axis(first, last)?);
        }

        let bounding_geometry = match polygons.len() {
            1 => BoundingGeometry::Single(polygons.remove(0)),
            _ => BoundingGeometry::Segmented(polygons),
        };

        Ok(AcquisitionInfo {
            sensing_start: self.manifest.start_time,
            sensing_stop: self.manifest.stop_time(),
            bounding_geometry,
            time_axes,
        })
    }

    /// Locator limited to the segment whose footprint is `polygon`.
    pub fn segment_locator(&self, polygon: &Polygon) -> SceneResult<GridPixelLocator> {
        for (first, last) in self.manifest.segments() {
            if self.segment_polygon(first, last)? == *polygon {
                return Ok(GridPixelLocator::for_lines(self.grid, first, last));
            }
        }
        Err(SceneError::UnknownSegment(polygon.to_string()))
    }

    fn variable(&self, name: &str) -> SceneResult<VariableSource<'_>> {
        match (self.manifest.variables.get(name), name) {
            (Some(spec), _) => Ok(VariableSource::Stored(spec)),
            (None, LON_VARIABLE) => Ok(VariableSource::Longitude),
            (None, LAT_VARIABLE) => Ok(VariableSource::Latitude),
            (None, _) => Err(SceneError::UnknownVariable(name.to_string())),
        }
    }

    pub fn read_window(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
        scaled: bool,
    ) -> SceneResult<RawWindow> {
        let source = self.variable(variable)?;
        let fill_value = match source {
            VariableSource::Stored(spec) => spec.fill_value,
            _ => DEFAULT_FILL_VALUE,
        };

        let width = window.width() as i32;
        let height = window.height() as i32;
        let mut data = Vec::with_capacity((width * height) as usize);
        for dy in 0..height {
            for dx in 0..width {
                let x = center_x - width / 2 + dx;
                let y = center_y - height / 2 + dy;
                if !self.grid.contains_pixel(x, y) {
                    data.push(fill_value);
                    continue;
                }
                let value = match source {
                    VariableSource::Stored(spec) => {
                        let raw = spec.values[(y * self.grid.nx + x) as usize];
                        if scaled {
                            spec.scaled(raw)
                        } else {
                            raw
                        }
                    }
                    VariableSource::Longitude => self.grid.pixel_center(x, y).lon,
                    VariableSource::Latitude => self.grid.pixel_center(x, y).lat,
                };
                data.push(value);
            }
        }

        Ok(RawWindow {
            width: window.width(),
            height: window.height(),
            data,
            fill_value,
        })
    }
}

/// Reader for manifest scenes; one scene open at a time.
#[derive(Debug, Default)]
pub struct SceneReader {
    scene: Option<Scene>,
}

impl SceneReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> SceneResult<&Scene> {
        self.scene.as_ref().ok_or(SceneError::NotOpen)
    }
}

impl Reader for SceneReader {
    fn open(&mut self, path: &Path) -> MatchupResult<()> {
        let scene = Scene::open(path)?;
        debug!(path = %path.display(), sensor = %scene.manifest.sensor, "Opened scene");
        self.scene = Some(scene);
        Ok(())
    }

    fn close(&mut self) -> MatchupResult<()> {
        self.scene = None;
        Ok(())
    }

    fn read(&mut self) -> MatchupResult<AcquisitionInfo> {
        Ok(self.scene()?.acquisition_info()?)
    }

    fn pixel_locator(&self) -> MatchupResult<Arc<dyn PixelLocator>> {
        Ok(Arc::new(GridPixelLocator::new(self.scene()?.grid)))
    }

    fn sub_scene_pixel_locator(&self, polygon: &Polygon) -> MatchupResult<Arc<dyn PixelLocator>> {
        Ok(Arc::new(self.scene()?.segment_locator(polygon)?))
    }

    fn time_locator(&self) -> MatchupResult<Arc<dyn TimeLocator>> {
        let manifest = &self.scene()?.manifest;
        Ok(Arc::new(LineTimeLocator::new(
            manifest.start_time.timestamp_millis(),
            manifest.line_duration_ms,
        )))
    }

    fn product_size(&self) -> MatchupResult<ProductSize> {
        let grid = self.scene()?.grid;
        Ok(ProductSize::new(grid.nx, grid.ny))
    }

    fn read_raw(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow> {
        Ok(self
            .scene()?
            .read_window(center_x, center_y, window, variable, false)?)
    }

    fn read_scaled(
        &self,
        center_x: i32,
        center_y: i32,
        window: Window,
        variable: &str,
    ) -> MatchupResult<RawWindow> {
        Ok(self
            .scene()?
            .read_window(center_x, center_y, window, variable, true)?)
    }
}

/// Hands out [`SceneReader`]s, optionally only for a fixed set of sensors.
#[derive(Debug, Clone, Default)]
pub struct SceneReaderFactory {
    sensors: Option<BTreeSet<String>>,
}

impl SceneReaderFactory {
    /// Factory accepting every sensor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensors<I, S>(sensors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensors: Some(sensors.into_iter().map(Into::into).collect()),
        }
    }

    pub fn supports(&self, sensor: &str) -> bool {
        self.sensors.as_ref().map_or(true, |s| s.contains(sensor))
    }
}

impl ReaderFactory for SceneReaderFactory {
    fn reader_for(&self, sensor: &str) -> MatchupResult<Box<dyn Reader>> {
        if !self.supports(sensor) {
            return Err(SceneError::UnsupportedSensor(sensor.to_string()).into());
        }
        Ok(Box::new(SceneReader::new()))
    }
}
