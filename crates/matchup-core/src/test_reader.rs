//! In-crate reader double for unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use geometry::Polygon;
use matchup_common::{MatchupError, MatchupResult};

use crate::reader::{
    AcquisitionInfo, PixelLocator, ProductSize, RawWindow, Reader, TimeLocator, Window,
};

pub(crate) const FILL: f64 = -32768.0;

/// Serves variables computed from the pixel position.
pub(crate) struct VariableReader {
    variables: HashMap<String, fn(i32, i32) -> f64>,
    scale: f64,
    time_locator: Option<Arc<dyn TimeLocator>>,
}

impl VariableReader {
    pub(crate) fn new() -> Self {
        Self {
            variables: HashMap::new(),
            scale: 1.0,
            time_locator: None,
        }
    }

    pub(crate) fn with_variable(mut self, name: &str, value: fn(i32, i32) -> f64) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }

    pub(crate) fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub(crate) fn with_time_locator(mut self, locator: Arc<dyn TimeLocator>) -> Self {
        self.time_locator = Some(locator);
        self
    }

    fn window(&self, x: i32, y: i32, window: Window, variable: &str, scale: f64) -> MatchupResult<RawWindow> {
        let value = self
            .variables
            .get(variable)
            .ok_or_else(|| MatchupError::reader(format!("no variable '{}'", variable)))?;
        let raw = value(x, y);
        let data = if raw == FILL { raw } else { raw * scale };
        Ok(RawWindow {
            width: window.width(),
            height: window.height(),
            data: vec![data; (window.width() * window.height()) as usize],
            fill_value: FILL,
        })
    }
}

impl Reader for VariableReader {
    fn open(&mut self, _path: &Path) -> MatchupResult<()> {
        Ok(())
    }

    fn close(&mut self) -> MatchupResult<()> {
        Ok(())
    }

    fn read(&mut self) -> MatchupResult<AcquisitionInfo> {
        Err(MatchupError::reader("no acquisition info"))
    }

    fn pixel_locator(&self) -> MatchupResult<Arc<dyn PixelLocator>> {
        Err(MatchupError::reader("no pixel locator"))
    }

    fn sub_scene_pixel_locator(&self, _polygon: &Polygon) -> MatchupResult<Arc<dyn PixelLocator>> {
        Err(MatchupError::reader("no pixel locator"))
    }

    fn time_locator(&self) -> MatchupResult<Arc<dyn TimeLocator>> {
        self.time_locator
            .clone()
            .ok_or_else(|| MatchupError::reader("no time locator"))
    }

    fn product_size(&self) -> MatchupResult<ProductSize> {
        Ok(ProductSize::new(100, 100))
    }

    fn read_raw(&self, x: i32, y: i32, window: Window, variable: &str) -> MatchupResult<RawWindow> {
        self.window(x, y, window, variable, 1.0)
    }

    fn read_scaled(&self, x: i32, y: i32, window: Window, variable: &str) -> MatchupResult<RawWindow> {
        self.window(x, y, window, variable, self.scale)
    }
}
