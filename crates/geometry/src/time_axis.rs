//! Acquisition time along a ground-track center line.
//!
//! Positions along the axis are measured as planar arc length in degrees.
//! This is an approximation that holds for the short, near-straight segments
//! readers emit; it is not a geodesic computation.

use chrono::{DateTime, Duration, Utc};
use matchup_common::TimeInterval;

use crate::error::{GeometryError, GeometryResult};
use crate::point::Point;
use crate::shapes::{LineString, Polygon};

/// A center line bound to the start and end time of its acquisition.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    line: LineString,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_millis: i64,
    inverse_axis_length: f64,
    /// Arc length at each vertex.
    vertex_offsets: Vec<f64>,
}

/// Orthogonal projection of a point onto one axis segment.
#[derive(Debug, Clone, Copy)]
struct Projection {
    offset: f64,
    distance: f64,
}

impl TimeAxis {
    pub fn new(
        line: LineString,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> GeometryResult<Self> {
        let mut vertex_offsets = Vec::with_capacity(line.num_points());
        let mut length = 0.0;
        vertex_offsets.push(length);
        for segment in line.segments() {
            length += segment_length(&segment);
            vertex_offsets.push(length);
        }
        if length <= 0.0 || !length.is_finite() {
            return Err(GeometryError::DegenerateAxis(format!(
                "line {} has no length",
                line
            )));
        }

        Ok(Self {
            duration_millis: (end_time - start_time).num_milliseconds(),
            inverse_axis_length: 1.0 / length,
            line,
            start_time,
            end_time,
            vertex_offsets,
        })
    }

    pub fn geometry(&self) -> &LineString {
        &self.line
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Time at the orthogonal projection of `point` onto the axis.
    ///
    /// Only segments with a projection factor inside [0, 1] are considered;
    /// of those the nearest wins, the earlier one on ties. `None` when the
    /// point lies beyond the extent of every segment.
    pub fn time(&self, point: &Point) -> Option<DateTime<Utc>> {
        self.project(point)
            .map(|projection| self.time_at_offset(projection.offset))
    }

    /// Time span the axis spends inside `polygon`.
    ///
    /// Starts at the earliest entry point of the clipped axis and lasts for
    /// the total clipped length. `None` when the axis misses the polygon.
    pub fn intersection_time(&self, polygon: &Polygon) -> Option<TimeInterval> {
        let pieces = polygon.clip_line(&self.line);
        if pieces.is_empty() {
            return None;
        }

        let clipped_length: f64 = pieces.iter().map(LineString::length).sum();
        let entry_offset = pieces
            .iter()
            .flat_map(|piece| [piece.start_point(), piece.end_point()])
            .flatten()
            .map(|p| self.index_of(&p))
            .fold(f64::INFINITY, f64::min);
        if !entry_offset.is_finite() {
            return None;
        }

        let start = self.start_time + Duration::milliseconds(self.offset_millis(entry_offset));
        let duration = self.offset_millis(clipped_length);
        Some(TimeInterval::new(
            start,
            start + Duration::milliseconds(duration),
        ))
    }

    /// Time span covered by projecting both ends of `side` onto the axis.
    ///
    /// The interval is ordered regardless of the direction of `side`.
    pub fn projection_time(&self, side: &LineString) -> Option<TimeInterval> {
        let first = self.project(&side.start_point()?)?;
        let last = self.project(&side.end_point()?)?;

        let (low, high) = if first.offset > last.offset {
            (last.offset, first.offset)
        } else {
            (first.offset, last.offset)
        };
        Some(TimeInterval::new(
            self.time_at_offset(low),
            self.time_at_offset(high),
        ))
    }

    fn time_at_offset(&self, offset: f64) -> DateTime<Utc> {
        self.start_time + Duration::milliseconds(self.offset_millis(offset))
    }

    /// Arc length converted to elapsed milliseconds, truncated.
    fn offset_millis(&self, offset: f64) -> i64 {
        let relative = offset * self.inverse_axis_length;
        (self.duration_millis as f64 * relative) as i64
    }

    fn project(&self, point: &Point) -> Option<Projection> {
        let mut best: Option<Projection> = None;
        for (index, segment) in self.line.segments().enumerate() {
            let Some(factor) = projection_factor(&segment, point) else {
                continue;
            };
            if !(0.0..=1.0).contains(&factor) {
                continue;
            }

            let candidate = self.projection_on(index, &segment, factor, point);
            match best {
                Some(current) if current.distance <= candidate.distance => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Arc length of the closest point on the axis, clamping to segment ends.
    fn index_of(&self, point: &Point) -> f64 {
        let mut best: Option<Projection> = None;
        for (index, segment) in self.line.segments().enumerate() {
            let factor = projection_factor(&segment, point)
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            let candidate = self.projection_on(index, &segment, factor, point);
            match best {
                Some(current) if current.distance <= candidate.distance => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|p| p.offset).unwrap_or(0.0)
    }

    fn projection_on(
        &self,
        index: usize,
        segment: &geo::Line<f64>,
        factor: f64,
        point: &Point,
    ) -> Projection {
        let dx = segment.end.x - segment.start.x;
        let dy = segment.end.y - segment.start.y;
        let px = segment.start.x + factor * dx;
        let py = segment.start.y + factor * dy;
        Projection {
            offset: self.vertex_offsets[index] + factor * segment_length(segment),
            distance: (point.lon - px).hypot(point.lat - py),
        }
    }
}

fn segment_length(segment: &geo::Line<f64>) -> f64 {
    (segment.end.x - segment.start.x).hypot(segment.end.y - segment.start.y)
}

/// Position of the foot of the perpendicular as a fraction of the segment;
/// `None` for zero-length segments.
fn projection_factor(segment: &geo::Line<f64>, point: &Point) -> Option<f64> {
    let dx = segment.end.x - segment.start.x;
    let dy = segment.end.y - segment.start.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return None;
    }
    Some(((point.lon - segment.start.x) * dx + (point.lat - segment.start.y) * dy) / len2)
}
