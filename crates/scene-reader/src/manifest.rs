//! JSON scene manifests.
//!
//! A manifest describes a swath on a regular lon/lat grid: pixel `(x, y)`
//! has its upper-left corner at `origin + (x, y) * step`, and line `y` is
//! acquired at `start_time + y * line_duration_ms`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

pub const DEFAULT_FILL_VALUE: f64 = -32768.0;

fn default_scale_factor() -> f64 {
    1.0
}

fn default_fill_value() -> f64 {
    DEFAULT_FILL_VALUE
}

/// Stored values of one variable, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default)]
    pub add_offset: f64,
    #[serde(default = "default_fill_value")]
    pub fill_value: f64,
    pub values: Vec<f64>,
}

impl VariableSpec {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: DEFAULT_FILL_VALUE,
            values,
        }
    }

    pub fn scaled(&self, raw: f64) -> f64 {
        if raw == self.fill_value {
            raw
        } else {
            raw * self.scale_factor + self.add_offset
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    pub sensor: String,
    #[serde(default)]
    pub version: Option<String>,
    pub nx: i32,
    pub ny: i32,
    pub lon_origin: f64,
    pub lat_origin: f64,
    pub lon_step: f64,
    pub lat_step: f64,
    pub start_time: DateTime<Utc>,
    pub line_duration_ms: i64,
    /// Lines at which the footprint is split into separate segments.
    #[serde(default)]
    pub segment_breaks: Vec<i32>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSpec>,
}

impl SceneManifest {
    pub fn load(path: &Path) -> SceneResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: SceneManifest =
            serde_json::from_str(&content).map_err(|source| SceneError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> SceneResult<()> {
        if self.sensor.trim().is_empty() {
            return Err(SceneError::InvalidManifest("sensor name is empty".into()));
        }
        if self.nx <= 0 || self.ny <= 0 {
            return Err(SceneError::InvalidManifest(format!(
                "raster size {}x{} is empty",
                self.nx, self.ny
            )));
        }
        let steps_valid = [self.lon_step, self.lat_step]
            .iter()
            .all(|s| s.is_finite() && *s != 0.0);
        if !steps_valid {
            return Err(SceneError::InvalidManifest(
                "lon_step and lat_step must be finite and non-zero".into(),
            ));
        }
        if self.line_duration_ms <= 0 {
            return Err(SceneError::InvalidManifest(
                "line_duration_ms must be positive".into(),
            ));
        }
        if self.checked_line_time(self.ny).is_none() {
            return Err(SceneError::InvalidManifest(format!(
                "{} lines of {} ms from {} run past the representable time range",
                self.ny, self.line_duration_ms, self.start_time
            )));
        }

        let mut previous = 0;
        for &line in &self.segment_breaks {
            if line <= previous || line >= self.ny {
                return Err(SceneError::InvalidManifest(format!(
                    "segment break {} not increasing within (0, {})",
                    line, self.ny
                )));
            }
            previous = line;
        }

        let expected = self.nx as usize * self.ny as usize;
        for (name, variable) in &self.variables {
            if variable.values.len() != expected {
                return Err(SceneError::InvalidManifest(format!(
                    "variable '{}' has {} values, expected {}",
                    name,
                    variable.values.len(),
                    expected
                )));
            }
        }
        Ok(())
    }

    pub fn stop_time(&self) -> DateTime<Utc> {
        self.line_time(self.ny)
    }

    /// Start of `line`. Lines `0..=ny` of a validated manifest are always
    /// representable; an unrepresentable line falls back to the start time.
    pub fn line_time(&self, line: i32) -> DateTime<Utc> {
        self.checked_line_time(line).unwrap_or(self.start_time)
    }

    fn checked_line_time(&self, line: i32) -> Option<DateTime<Utc>> {
        (line as i64)
            .checked_mul(self.line_duration_ms)
            .and_then(Duration::try_milliseconds)
            .and_then(|offset| self.start_time.checked_add_signed(offset))
    }

    /// Line ranges `[first, last)` of the footprint segments.
    pub fn segments(&self) -> Vec<(i32, i32)> {
        let mut bounds = Vec::with_capacity(self.segment_breaks.len() + 2);
        bounds.push(0);
        bounds.extend(self.segment_breaks.iter().copied());
        bounds.push(self.ny);
        bounds.windows(2).map(|w| (w[0], w[1])).collect()
    }
}
