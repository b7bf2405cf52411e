//! Closed time intervals and their algebra.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MatchupError, MatchupResult};
use crate::time::add_seconds;

/// A closed interval `[start, stop]` of UTC timestamps.
///
/// Construction normalizes the bounds, so `start <= stop` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        if start <= stop {
            Self { start, stop }
        } else {
            Self {
                start: stop,
                stop: start,
            }
        }
    }

    /// Build the smallest interval covering every timestamp.
    ///
    /// Returns `None` for an empty collection.
    pub fn create<I>(times: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut iter = times.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
        Some(Self {
            start: min,
            stop: max,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn stop(&self) -> DateTime<Utc> {
        self.stop
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        time >= &self.start && time <= &self.stop
    }

    /// Intersection of two closed intervals, `None` if they are disjoint.
    ///
    /// Touching intervals intersect in a single instant.
    pub fn intersect(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let stop = self.stop.min(other.stop);
        if start > stop {
            return None;
        }
        Some(TimeInterval { start, stop })
    }

    /// Smallest interval covering both.
    pub fn union(&self, other: &TimeInterval) -> TimeInterval {
        TimeInterval {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }

    /// Absolute gap in milliseconds between the closest endpoints.
    ///
    /// Zero when the intervals overlap or touch.
    pub fn gap_millis(&self, other: &TimeInterval) -> i64 {
        if self.stop < other.start {
            (other.start - self.stop).num_milliseconds()
        } else if other.stop < self.start {
            (self.start - other.stop).num_milliseconds()
        } else {
            0
        }
    }

    /// Widen the interval by `seconds` on both ends.
    pub fn expand_seconds(&self, seconds: i64) -> MatchupResult<TimeInterval> {
        let neg = seconds.checked_neg().ok_or_else(|| {
            MatchupError::InvalidTime(format!("cannot widen by {} s", seconds))
        })?;
        Ok(TimeInterval::new(
            add_seconds(neg, self.start)?,
            add_seconds(seconds, self.stop)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::datetime_from_millis;
    use proptest::prelude::*;

    fn interval(start: i64, stop: i64) -> TimeInterval {
        TimeInterval::new(
            datetime_from_millis(start).unwrap(),
            datetime_from_millis(stop).unwrap(),
        )
    }

    #[test]
    fn test_new_normalizes_bounds() {
        let i = interval(2000, 1000);
        assert_eq!(i.start().timestamp_millis(), 1000);
        assert_eq!(i.stop().timestamp_millis(), 2000);
    }

    #[test]
    fn test_create_from_empty() {
        assert!(TimeInterval::create(Vec::new()).is_none());
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = interval(1000, 5000);
        let b = interval(3000, 8000);

        let overlap = a.intersect(&b).unwrap();
        assert_eq!(overlap.start().timestamp_millis(), 3000);
        assert_eq!(overlap.stop().timestamp_millis(), 5000);
    }

    #[test]
    fn test_intersect_disjoint() {
        let a = interval(1000, 2000);
        let b = interval(3000, 8000);
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn test_intersect_touching() {
        let a = interval(1000, 3000);
        let b = interval(3000, 8000);
        let overlap = a.intersect(&b).unwrap();
        assert_eq!(overlap.start(), overlap.stop());
    }

    #[test]
    fn test_union_and_gap() {
        let a = interval(1000, 2000);
        let b = interval(5000, 8000);

        let union = a.union(&b);
        assert_eq!(union.start().timestamp_millis(), 1000);
        assert_eq!(union.stop().timestamp_millis(), 8000);

        assert_eq!(a.gap_millis(&b), 3000);
        assert_eq!(b.gap_millis(&a), 3000);
        assert_eq!(a.gap_millis(&union), 0);
    }

    #[test]
    fn test_expand_seconds() {
        let i = interval(10_000, 20_000).expand_seconds(5).unwrap();
        assert_eq!(i.start().timestamp_millis(), 5_000);
        assert_eq!(i.stop().timestamp_millis(), 25_000);

        assert!(interval(10_000, 20_000).expand_seconds(9_000_000_000_000).is_err());
        assert!(interval(10_000, 20_000).expand_seconds(i64::MIN).is_err());
    }

    proptest! {
        #[test]
        fn prop_intersect_is_symmetric(
            a0 in 0i64..1_000_000, a1 in 0i64..1_000_000,
            b0 in 0i64..1_000_000, b1 in 0i64..1_000_000,
        ) {
            let a = interval(a0, a1);
            let b = interval(b0, b1);
            prop_assert_eq!(a.intersect(&b), b.intersect(&a));
        }

        #[test]
        fn prop_create_spans_min_max(times in proptest::collection::vec(0i64..2_000_000_000_000, 1..50)) {
            let dates: Vec<_> = times.iter().map(|t| datetime_from_millis(*t).unwrap()).collect();
            let i = TimeInterval::create(dates).unwrap();
            prop_assert_eq!(i.start().timestamp_millis(), *times.iter().min().unwrap());
            prop_assert_eq!(i.stop().timestamp_millis(), *times.iter().max().unwrap());
        }
    }
}
