//! Tool configuration.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use matchup_common::{parse_doy_begin_of_day, parse_doy_end_of_day};
use serde::{Deserialize, Serialize};

/// Where a run reads its inputs and which days it covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Use-case YAML file
    #[serde(default)]
    pub use_case: PathBuf,

    /// Directory of scene manifests
    #[serde(default)]
    pub archive_dir: PathBuf,

    /// First day, `yyyy-DDD`
    #[serde(default)]
    pub start_date: String,

    /// Last day, `yyyy-DDD`, inclusive
    #[serde(default)]
    pub end_date: String,

    /// Summary directory; replaces the use case's output path when set
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Forces parallel processing on when set
    #[serde(default)]
    pub parallel: Option<bool>,
}

impl ToolConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse tool config {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Configuration from `MATCHUP_*` environment variables alone.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(val) = env::var("MATCHUP_USE_CASE") {
            self.use_case = PathBuf::from(val);
        }
        if let Ok(val) = env::var("MATCHUP_ARCHIVE_DIR") {
            self.archive_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("MATCHUP_START_DATE") {
            self.start_date = val;
        }
        if let Ok(val) = env::var("MATCHUP_END_DATE") {
            self.end_date = val;
        }
        if let Ok(val) = env::var("MATCHUP_OUTPUT_PATH") {
            self.output_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("MATCHUP_PARALLEL") {
            self.parallel = Some(val == "true" || val == "1");
        }
    }

    /// Processing window: begin of the start day to end of the end day.
    pub fn processing_window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_doy_begin_of_day(&self.start_date)
            .with_context(|| format!("Invalid start date '{}'", self.start_date))?;
        let end = parse_doy_end_of_day(&self.end_date)
            .with_context(|| format!("Invalid end date '{}'", self.end_date))?;
        Ok((start, end))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.use_case.as_os_str().is_empty() {
            return Err("use_case must be set".to_string());
        }

        if self.archive_dir.as_os_str().is_empty() {
            return Err("archive_dir must be set".to_string());
        }

        let (start, end) = self.processing_window().map_err(|e| format!("{:#}", e))?;
        if start > end {
            return Err(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            ));
        }

        Ok(())
    }
}
