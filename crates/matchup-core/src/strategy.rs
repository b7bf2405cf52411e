//! The matchup run: primary observations against secondary candidates.
//!
//! Per primary observation:
//!
//! ```text
//! open primary ─► query secondaries in the search window
//!                   │
//!                   └─► per secondary: open ─► intersect footprint parts
//!                                              │
//!                                              └─► per intersection passing the coarse
//!                                                  time check: collect samples ─►
//!                                                  conditions ─► screenings ─► accumulate
//! ```
//!
//! Readers are held by [`OpenReader`] guards and closed on every exit path. A
//! failing secondary is logged and skipped; the run goes on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use matchup_common::{MatchupError, MatchupResult, TimeInterval};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::archive::{ObservationSource, SatelliteObservation};
use crate::collector::SampleCollector;
use crate::condition::{ConditionEngine, ConditionEngineContext};
use crate::config::{Sensor, UseCaseConfig};
use crate::intersection::{intersect, Intersection, SceneLocators};
use crate::reader::{pixel_locator_for, OpenReader, PixelLocator, ProductSize, ReaderFactory, TimeLocator};
use crate::sample::{MatchupCollection, MatchupSet};
use crate::screening::ScreeningEngine;
use crate::stats::MatchupStats;

/// Added to the configured maximum time delta before an intersection is
/// skipped without sampling.
pub const TIME_DELTA_SAFETY_MARGIN_MILLIS: i64 = 30_000;

/// Everything a run needs from its surroundings.
#[derive(Clone)]
pub struct ToolContext {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub use_case: UseCaseConfig,
    pub observations: Arc<dyn ObservationSource>,
    pub readers: Arc<dyn ReaderFactory>,
}

impl ToolContext {
    pub fn processing_interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_date, self.end_date)
    }

    pub fn primary_sensor(&self) -> MatchupResult<&Sensor> {
        self.use_case
            .primary_sensor()
            .ok_or_else(|| MatchupError::config("primary sensor not configured"))
    }

    /// The first additional sensor.
    pub fn secondary_sensor(&self) -> MatchupResult<&Sensor> {
        self.use_case
            .additional_sensors()
            .into_iter()
            .next()
            .ok_or_else(|| MatchupError::config("no additional sensor configured"))
    }
}

/// Result of a matchup run.
#[derive(Debug, Clone, Default)]
pub struct MatchupRun {
    pub collection: MatchupCollection,
    pub stats: MatchupStats,
}

pub struct MatchupStrategy<'a> {
    context: &'a ToolContext,
    conditions: ConditionEngine,
    screenings: ScreeningEngine,
    condition_context: ConditionEngineContext,
}

/// Locators shared by all intersections of one footprint pair.
struct IntersectionLocators {
    intersection: Intersection,
    primary: Arc<dyn PixelLocator>,
    secondary: Arc<dyn PixelLocator>,
}

/// Time locator and raster size of an open scene.
struct SceneTiming {
    time_locator: Arc<dyn TimeLocator>,
    size: ProductSize,
}

impl SceneTiming {
    fn of(reader: &OpenReader) -> MatchupResult<Self> {
        Ok(Self {
            time_locator: reader.reader().time_locator()?,
            size: reader.reader().product_size()?,
        })
    }
}

impl<'a> MatchupStrategy<'a> {
    /// Configure the condition and screening pipelines; rule errors are fatal.
    pub fn new(context: &'a ToolContext) -> MatchupResult<Self> {
        let conditions = ConditionEngine::configure(&context.use_case)?;
        let screenings = ScreeningEngine::configure(&context.use_case)?;
        Ok(Self {
            context,
            conditions,
            screenings,
            condition_context: ConditionEngineContext {
                start_date: context.start_date,
                end_date: context.end_date,
            },
        })
    }

    pub fn run(&self) -> MatchupResult<MatchupRun> {
        let primary_sensor = self.context.primary_sensor()?;
        let secondary_sensor = self.context.secondary_sensor()?;

        let primaries = self.context.observations.observations(
            &primary_sensor.name,
            primary_sensor.data_version.as_deref(),
            &self.context.processing_interval(),
        )?;
        info!(
            use_case = %self.context.use_case.name,
            primary = %primary_sensor.name,
            secondary = %secondary_sensor.name,
            primaries = primaries.len(),
            max_time_delta_ms = self.conditions.max_time_delta_millis(),
            parallel = self.context.use_case.parallel,
            "Starting matchup run"
        );

        let per_primary: Vec<(Vec<MatchupSet>, MatchupStats)> = if self.context.use_case.parallel {
            primaries
                .par_iter()
                .map(|primary| self.process_primary(primary, secondary_sensor))
                .collect()
        } else {
            primaries
                .iter()
                .map(|primary| self.process_primary(primary, secondary_sensor))
                .collect()
        };

        let mut run = MatchupRun::default();
        for (sets, stats) in per_primary {
            run.stats.merge(&stats);
            for set in sets {
                run.collection.add(set);
            }
        }

        info!(
            matchup_sets = run.stats.matchup_sets,
            sample_sets = run.stats.accepted_sample_sets,
            failed = run.stats.failed_pairs,
            "Matchup run complete"
        );
        Ok(run)
    }

    fn process_primary(
        &self,
        primary: &SatelliteObservation,
        secondary_sensor: &Sensor,
    ) -> (Vec<MatchupSet>, MatchupStats) {
        let mut stats = MatchupStats {
            primary_observations: 1,
            ..Default::default()
        };
        let mut sets = Vec::new();

        let primary_reader = match self.open(primary) {
            Ok(reader) => reader,
            Err(e) => {
                warn!(path = %primary.data_file_path.display(), error = %e, "Skipping primary observation");
                stats.failed_pairs += 1;
                return (sets, stats);
            }
        };

        let delta_seconds = self.conditions.max_time_delta_millis() / 1000;
        let secondaries = primary
            .sensing_interval()
            .expand_seconds(delta_seconds)
            .and_then(|search_window| {
                self.context.observations.observations(
                    &secondary_sensor.name,
                    secondary_sensor.data_version.as_deref(),
                    &search_window,
                )
            });
        let secondaries = match secondaries {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %primary.data_file_path.display(), error = %e, "Secondary lookup failed");
                stats.failed_pairs += 1;
                return (sets, stats);
            }
        };

        info!(
            path = %primary.data_file_path.display(),
            candidates = secondaries.len(),
            "Processing primary observation"
        );

        for secondary in &secondaries {
            stats.secondary_candidates += 1;
            match self.process_secondary(&primary_reader, primary, secondary, &mut stats) {
                Ok(Some(set)) => {
                    stats.matchup_sets += 1;
                    stats.accepted_sample_sets += set.num_observations() as u64;
                    sets.push(set);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        primary = %primary.data_file_path.display(),
                        secondary = %secondary.data_file_path.display(),
                        error = %e,
                        "Skipping secondary observation"
                    );
                    stats.failed_pairs += 1;
                }
            }
        }

        (sets, stats)
    }

    fn open(&self, observation: &SatelliteObservation) -> MatchupResult<OpenReader> {
        let reader = self.context.readers.reader_for(&observation.sensor)?;
        OpenReader::open(reader, &observation.data_file_path)
    }

    fn process_secondary(
        &self,
        primary_reader: &OpenReader,
        primary: &SatelliteObservation,
        secondary: &SatelliteObservation,
        stats: &mut MatchupStats,
    ) -> MatchupResult<Option<MatchupSet>> {
        let secondary_reader = self.open(secondary)?;
        let primary_timing = SceneTiming::of(primary_reader)?;
        let secondary_timing = SceneTiming::of(&secondary_reader)?;

        let intersections = self.intersect_all(
            primary_reader,
            primary,
            &primary_timing,
            &secondary_reader,
            secondary,
            &secondary_timing,
        )?;
        stats.intersections += intersections.len() as u64;
        if intersections.is_empty() {
            return Ok(None);
        }

        let mut matchup_set = MatchupSet::new(
            primary.sensor.clone(),
            primary.data_file_path.clone(),
            secondary.sensor.clone(),
            secondary.data_file_path.clone(),
        );
        let max_delta = self.conditions.max_time_delta_millis();

        for found in intersections {
            let minimal_delta = found.intersection.time_info.minimal_time_delta();
            if minimal_delta >= max_delta + TIME_DELTA_SAFETY_MARGIN_MILLIS {
                debug!(minimal_delta, max_delta, "Intersection outside time tolerance");
                stats.skipped_by_time += 1;
                continue;
            }

            let mut candidates = MatchupSet::new(
                primary.sensor.clone(),
                primary.data_file_path.clone(),
                secondary.sensor.clone(),
                secondary.data_file_path.clone(),
            );
            let primary_collector =
                SampleCollector::new(found.primary.as_ref()).with_bounds(primary_timing.size);
            for piece in &found.intersection.geometry {
                primary_collector.add_primary_samples(
                    piece,
                    &mut candidates,
                    primary_timing.time_locator.as_ref(),
                );
            }

            let secondary_collector =
                SampleCollector::new(found.secondary.as_ref()).with_bounds(secondary_timing.size);
            let complete = secondary_collector
                .add_secondary_samples(candidates.take_sample_sets(), secondary_timing.time_locator.as_ref());
            candidates.set_sample_sets(complete);
            stats.sample_sets_collected += candidates.num_observations() as u64;
            if candidates.is_empty() {
                continue;
            }

            let before = candidates.num_observations();
            self.conditions.apply(&mut candidates, &self.condition_context);
            stats.removed_by_conditions += (before - candidates.num_observations()) as u64;
            if candidates.is_empty() {
                continue;
            }

            let before = candidates.num_observations();
            self.screenings
                .apply(&mut candidates, primary_reader.reader(), secondary_reader.reader())?;
            stats.removed_by_screenings += (before - candidates.num_observations()) as u64;

            matchup_set.sample_sets.extend(candidates.take_sample_sets());
        }

        Ok((!matchup_set.is_empty()).then_some(matchup_set))
    }

    /// Intersections of every primary part with every secondary part.
    fn intersect_all(
        &self,
        primary_reader: &OpenReader,
        primary: &SatelliteObservation,
        primary_timing: &SceneTiming,
        secondary_reader: &OpenReader,
        secondary: &SatelliteObservation,
        secondary_timing: &SceneTiming,
    ) -> MatchupResult<Vec<IntersectionLocators>> {
        let mut found = Vec::new();
        for primary_part in primary.geo_bounds.polygons() {
            for secondary_part in secondary.geo_bounds.polygons() {
                let locators = pixel_locator_for(primary_reader.reader(), &primary.geo_bounds, primary_part)
                    .and_then(|p| {
                        pixel_locator_for(secondary_reader.reader(), &secondary.geo_bounds, secondary_part)
                            .map(|s| (p, s))
                    });
                let (primary_locator, secondary_locator) = match locators {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "Unable to create valid pixel locators, skipping intersection segment");
                        continue;
                    }
                };

                let intersection = intersect(
                    primary_part,
                    secondary_part,
                    SceneLocators {
                        pixel_locator: primary_locator.as_ref(),
                        time_locator: primary_timing.time_locator.as_ref(),
                        size: primary_timing.size,
                    },
                    SceneLocators {
                        pixel_locator: secondary_locator.as_ref(),
                        time_locator: secondary_timing.time_locator.as_ref(),
                        size: secondary_timing.size,
                    },
                )?;
                if let Some(intersection) = intersection {
                    found.push(IntersectionLocators {
                        intersection,
                        primary: primary_locator,
                        secondary: secondary_locator,
                    });
                }
            }
        }
        Ok(found)
    }
}
