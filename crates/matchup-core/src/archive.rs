//! Satellite observations and where to find them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use geometry::{BoundingGeometry, TimeAxis};
use matchup_common::{MatchupResult, TimeInterval};

/// Metadata of one ingested scene.
#[derive(Debug, Clone)]
pub struct SatelliteObservation {
    pub sensor: String,
    pub version: Option<String>,
    pub data_file_path: PathBuf,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub geo_bounds: BoundingGeometry,
    pub time_axes: Vec<TimeAxis>,
}

impl SatelliteObservation {
    pub fn sensing_interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.stop_time)
    }
}

/// Lookup of observations by sensor and time window.
pub trait ObservationSource: Send + Sync {
    /// Observations of `sensor` whose sensing time intersects `window`,
    /// ordered by start time. A `version` restricts the processing version.
    fn observations(
        &self,
        sensor: &str,
        version: Option<&str>,
        window: &TimeInterval,
    ) -> MatchupResult<Vec<SatelliteObservation>>;
}

/// Observations held in memory.
#[derive(Debug, Clone, Default)]
pub struct ObservationCatalog {
    observations: Vec<SatelliteObservation>,
}

impl ObservationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observation: SatelliteObservation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl FromIterator<SatelliteObservation> for ObservationCatalog {
    fn from_iter<I: IntoIterator<Item = SatelliteObservation>>(iter: I) -> Self {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

impl ObservationSource for ObservationCatalog {
    fn observations(
        &self,
        sensor: &str,
        version: Option<&str>,
        window: &TimeInterval,
    ) -> MatchupResult<Vec<SatelliteObservation>> {
        let mut found: Vec<SatelliteObservation> = self
            .observations
            .iter()
            .filter(|o| o.sensor == sensor)
            .filter(|o| version.map_or(true, |v| o.version.as_deref() == Some(v)))
            .filter(|o| o.sensing_interval().intersect(window).is_some())
            .cloned()
            .collect();
        found.sort_by_key(|o| o.start_time);
        Ok(found)
    }
}
