//! Matchup engine for satellite sensor observations.
//!
//! Finds pixels of two sensors that observed the same location at nearly
//! the same time.
//!
//! # Architecture
//!
//! ```text
//! ObservationSource ──► primary observations in [start, end]
//!      │
//!      ▼
//! MatchupStrategy::run
//!      │
//!      ├─► secondary candidates in the widened search window
//!      │
//!      ├─► intersect()          footprint overlap + TimeInfo
//!      │
//!      ├─► SampleCollector      primary pixels, then secondary partners
//!      │
//!      ├─► ConditionEngine      time-delta, spherical-distance
//!      │
//!      └─► ScreeningEngine      angular, pixel-flag
//!               │
//!               ▼
//!         MatchupCollection + MatchupStats
//! ```
//!
//! Scene formats plug in through the [`Reader`] and [`ReaderFactory`]
//! traits; observation metadata through [`ObservationSource`].

pub mod archive;
pub mod collector;
pub mod condition;
pub mod config;
pub mod diagnostics;
pub mod intersection;
pub mod reader;
pub mod sample;
pub mod screening;
pub mod stats;
pub mod strategy;
pub mod summary;

#[cfg(test)]
mod test_reader;

// Re-export commonly used types at crate root
pub use archive::{ObservationCatalog, ObservationSource, SatelliteObservation};
pub use collector::SampleCollector;
pub use condition::{AnyCondition, Condition, ConditionEngine, ConditionEngineContext};
pub use config::{Dimension, RuleConfig, Sensor, UseCaseConfig, ValidationResult};
pub use diagnostics::time_differences;
pub use intersection::{intersect, Intersection, SceneLocators, TimeInfo};
pub use reader::{
    pixel_locator_for, AcquisitionInfo, OpenReader, PixelLocator, PixelPos, ProductSize,
    RawWindow, Reader, ReaderFactory, TimeLocator, Window,
};
pub use sample::{first_matchup_set, MatchupCollection, MatchupSet, Sample, SampleSet};
pub use screening::{AnyScreening, Screening, ScreeningEngine};
pub use stats::MatchupStats;
pub use strategy::{MatchupRun, MatchupStrategy, ToolContext, TIME_DELTA_SAFETY_MARGIN_MILLIS};
pub use summary::MatchupSummary;

pub use matchup_common::{MatchupError, MatchupResult};
