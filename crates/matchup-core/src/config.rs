//! Use-case configuration.
//!
//! A use case names the sensors to match, the extraction window per sensor,
//! the output location and the ordered condition and screening rules:
//!
//! ```yaml
//! name: mmd22
//! output_path: /archive/mmd22
//! sensors:
//!   - name: avhrr-n17
//!     primary: true
//!   - name: amsub-n15
//!     data_version: v1.0
//! dimensions:
//!   - { name: avhrr-n17, nx: 5, ny: 5 }
//!   - { name: amsub-n15, nx: 3, ny: 3 }
//! conditions:
//!   - name: time-delta
//!     time_delta_seconds: 300
//!   - name: spherical-distance
//!     max_pixel_distance_km: 5.0
//! screenings: []
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use matchup_common::{MatchupError, MatchupResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A sensor taking part in a use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, alias = "data-version")]
    pub data_version: Option<String>,
}

impl Sensor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: false,
            data_version: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// Extraction window size for a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub nx: u32,
    pub ny: u32,
}

impl Dimension {
    pub fn new(name: impl Into<String>, nx: u32, ny: u32) -> Self {
        Self {
            name: name.into(),
            nx,
            ny,
        }
    }
}

/// A condition or screening entry: the rule name plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_yaml::Value>,
}

impl RuleConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_yaml::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Deserialize the parameters into the rule's typed form.
    pub fn parse_params<T: DeserializeOwned>(&self) -> MatchupResult<T> {
        let mapping: serde_yaml::Mapping = self
            .params
            .iter()
            .map(|(k, v)| (serde_yaml::Value::String(k.clone()), v.clone()))
            .collect();
        serde_yaml::from_value(serde_yaml::Value::Mapping(mapping))
            .map_err(|e| MatchupError::invalid_parameter(&self.name, e.to_string()))
    }
}

/// Outcome of [`UseCaseConfig::check_valid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    messages: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn invalid(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UseCaseConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "output-path")]
    pub output_path: Option<PathBuf>,
    #[serde(default, alias = "write-distance")]
    pub write_distance: bool,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub conditions: Vec<RuleConfig>,
    #[serde(default)]
    pub screenings: Vec<RuleConfig>,
    /// Process primary observations on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

impl UseCaseConfig {
    pub fn from_yaml_str(yaml: &str) -> MatchupResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> MatchupResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MatchupError::config(format!(
                "unable to read use case configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// The sensor flagged primary, `None` if none is.
    pub fn primary_sensor(&self) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.primary)
    }

    pub fn additional_sensors(&self) -> Vec<&Sensor> {
        self.sensors.iter().filter(|s| !s.primary).collect()
    }

    pub fn dimension_for(&self, sensor_name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == sensor_name)
    }

    /// Collect every problem that prevents a run.
    pub fn check_valid(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        if self.name.trim().is_empty() {
            result.invalid("Use case name not configured.");
        }
        if self.primary_sensor().is_none() {
            result.invalid("Primary sensor not configured.");
        }
        if self.additional_sensors().is_empty() {
            result.invalid("No additional sensor configured.");
        }
        for sensor in &self.sensors {
            if self.dimension_for(&sensor.name).is_none() {
                result.invalid(format!(
                    "No dimensions for sensor '{}' configured.",
                    sensor.name
                ));
            }
        }
        let output_missing = self
            .output_path
            .as_ref()
            .map_or(true, |p| p.as_os_str().is_empty());
        if output_missing {
            result.invalid("Output path not configured.");
        }
        result
    }
}
