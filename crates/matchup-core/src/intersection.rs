//! Geometric intersection of two footprint parts and their time relation.

use geometry::Polygon;
use matchup_common::{datetime_from_millis, MatchupResult, TimeInterval};

use crate::reader::{PixelLocator, PixelPos, ProductSize, TimeLocator};

/// Minimal time delta of a [`TimeInfo`] that could not be derived.
///
/// Larger than any configurable tolerance, so such intersections never pass
/// the coarse time check.
pub const UNSET_TIME_DELTA: i64 = i32::MAX as i64;

/// Temporal relation of the two sensors over an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInfo {
    overlap: Option<TimeInterval>,
    minimal_time_delta: i64,
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            overlap: None,
            minimal_time_delta: UNSET_TIME_DELTA,
        }
    }
}

impl TimeInfo {
    pub fn overlapping(interval: TimeInterval) -> Self {
        Self {
            overlap: Some(interval),
            minimal_time_delta: 0,
        }
    }

    pub fn separated(minimal_time_delta: i64) -> Self {
        Self {
            overlap: None,
            minimal_time_delta,
        }
    }

    pub fn overlap(&self) -> Option<&TimeInterval> {
        self.overlap.as_ref()
    }

    /// Milliseconds between the sensors' coverage, 0 when they overlap.
    pub fn minimal_time_delta(&self) -> i64 {
        self.minimal_time_delta
    }

    pub fn is_unset(&self) -> bool {
        self.overlap.is_none() && self.minimal_time_delta == UNSET_TIME_DELTA
    }
}

/// Overlap of one primary and one secondary footprint part.
#[derive(Debug, Clone)]
pub struct Intersection {
    /// Disjoint pieces of the overlap area.
    pub geometry: Vec<Polygon>,
    pub time_info: TimeInfo,
    pub primary_geometry: Polygon,
    pub secondary_geometry: Polygon,
}

/// The locators and raster size of one side of an intersection.
#[derive(Clone, Copy)]
pub struct SceneLocators<'a> {
    pub pixel_locator: &'a dyn PixelLocator,
    pub time_locator: &'a dyn TimeLocator,
    pub size: ProductSize,
}

/// Intersect two footprint parts and relate their acquisition times.
///
/// Returns `None` when the parts do not overlap. The time relation is derived
/// from the boundary vertices of the overlap: every vertex both sensors can
/// locate contributes the acquisition time of each in-bounds candidate pixel.
/// A failure of the geometry backend is a [`MatchupError::Geometry`].
///
/// [`MatchupError::Geometry`]: matchup_common::MatchupError::Geometry
pub fn intersect(
    primary: &Polygon,
    secondary: &Polygon,
    primary_scene: SceneLocators<'_>,
    secondary_scene: SceneLocators<'_>,
) -> MatchupResult<Option<Intersection>> {
    let pieces = primary.try_intersection(secondary)?;
    if pieces.is_empty() {
        return Ok(None);
    }

    let mut primary_times = Vec::new();
    let mut secondary_times = Vec::new();
    for piece in &pieces {
        let coordinates = piece.coordinates();
        let open_ring = &coordinates[..coordinates.len().saturating_sub(1)];
        for point in open_ring {
            let primary_candidates = primary_scene.pixel_locator.pixel_location(point.lon, point.lat);
            if primary_candidates.is_empty() {
                continue;
            }
            let secondary_candidates =
                secondary_scene.pixel_locator.pixel_location(point.lon, point.lat);
            if secondary_candidates.is_empty() {
                continue;
            }

            primary_times.extend(candidate_times(&primary_candidates, primary_scene));
            secondary_times.extend(candidate_times(&secondary_candidates, secondary_scene));
        }
    }

    Ok(Some(Intersection {
        geometry: pieces,
        time_info: time_info(&primary_times, &secondary_times),
        primary_geometry: primary.clone(),
        secondary_geometry: secondary.clone(),
    }))
}

fn candidate_times(candidates: &[PixelPos], scene: SceneLocators<'_>) -> Vec<i64> {
    candidates
        .iter()
        .filter_map(|pos| Some((nearest_pixel(pos.x)?, nearest_pixel(pos.y)?)))
        .filter(|&(x, y)| scene.size.contains(x, y))
        .map(|(x, y)| scene.time_locator.time_for(x, y))
        .collect()
}

/// Nearest integer pixel index, halves rounding up; `None` for non-finite
/// positions.
fn nearest_pixel(position: f64) -> Option<i32> {
    position.is_finite().then(|| (position + 0.5).floor() as i32)
}

fn time_info(primary_times: &[i64], secondary_times: &[i64]) -> TimeInfo {
    let (Some(primary), Some(secondary)) = (
        interval_of(primary_times),
        interval_of(secondary_times),
    ) else {
        return TimeInfo::default();
    };

    match primary.intersect(&secondary) {
        Some(overlap) => TimeInfo::overlapping(overlap),
        None => TimeInfo::separated(primary.gap_millis(&secondary)),
    }
}

fn interval_of(times: &[i64]) -> Option<TimeInterval> {
    let times = times
        .iter()
        .filter_map(|&millis| datetime_from_millis(millis).ok())
        .collect::<Vec<_>>();
    TimeInterval::create(times)
}
