//! Pixel sample collection on an intersection area.

use geometry::{Point, Polygon};

use crate::reader::{PixelLocator, PixelPos, ProductSize, TimeLocator};
use crate::sample::{MatchupSet, Sample, SampleSet};

/// Collects samples on the raster of one sensor.
pub struct SampleCollector<'a> {
    locator: &'a dyn PixelLocator,
    bounds: Option<ProductSize>,
}

impl<'a> SampleCollector<'a> {
    pub fn new(locator: &'a dyn PixelLocator) -> Self {
        Self {
            locator,
            bounds: None,
        }
    }

    /// Restrict candidate pixels to the raster.
    pub fn with_bounds(mut self, bounds: ProductSize) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Append one sample set per pixel whose center lies inside `polygon`.
    ///
    /// Pixels are visited row by row, ascending `x` within a row, over the
    /// pixel rectangle spanned by the polygon. Only the primary slot of the
    /// new sets is filled.
    pub fn add_primary_samples(
        &self,
        polygon: &Polygon,
        matchup_set: &mut MatchupSet,
        time_locator: &dyn TimeLocator,
    ) {
        let Some(range) = self.pixel_range(polygon) else {
            return;
        };

        for y in range.min_y..=range.max_y {
            for x in range.min_x..=range.max_x {
                let Some(location) = self.locator.geo_location(x as f64 + 0.5, y as f64 + 0.5)
                else {
                    continue;
                };
                if polygon.contains(&location) {
                    let time = time_locator.time_for(x, y);
                    matchup_set.add_primary(Sample::new(x, y, location.lon, location.lat, time));
                }
            }
        }
    }

    /// Pair every primary sample with the pixel of this sensor seeing the same
    /// location.
    ///
    /// The first in-bounds candidate wins. Sets without a candidate are
    /// dropped; the survivors keep their order.
    pub fn add_secondary_samples(
        &self,
        sample_sets: Vec<SampleSet>,
        time_locator: &dyn TimeLocator,
    ) -> Vec<SampleSet> {
        sample_sets
            .into_iter()
            .filter_map(|set| {
                let primary = set.primary;
                let secondary = self.locate(primary.lon, primary.lat, time_locator)?;
                Some(set.with_secondary(secondary))
            })
            .collect()
    }

    fn locate(&self, lon: f64, lat: f64, time_locator: &dyn TimeLocator) -> Option<Sample> {
        let (x, y) = self
            .locator
            .pixel_location(lon, lat)
            .into_iter()
            .filter(|pos| pos.x.is_finite() && pos.y.is_finite())
            .map(|pos| (pos.x.floor() as i32, pos.y.floor() as i32))
            .find(|&(x, y)| self.in_bounds(x, y))?;

        let location = self.locator.geo_location(x as f64 + 0.5, y as f64 + 0.5)?;
        Some(Sample::new(
            x,
            y,
            location.lon,
            location.lat,
            time_locator.time_for(x, y),
        ))
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.bounds.map_or(true, |size| size.contains(x, y))
    }

    /// Pixel rectangle covering the polygon's bounding box and vertices.
    fn pixel_range(&self, polygon: &Polygon) -> Option<PixelRange> {
        let (min, max) = polygon.bounds()?;
        let mut probes = vec![
            min,
            max,
            Point::new(min.lon, max.lat),
            Point::new(max.lon, min.lat),
        ];
        probes.extend(polygon.coordinates());

        let candidates: Vec<PixelPos> = probes
            .iter()
            .flat_map(|p| self.locator.pixel_location(p.lon, p.lat))
            .filter(|pos| pos.x.is_finite() && pos.y.is_finite())
            .collect();
        let mut range = PixelRange::spanning(&candidates)?;
        if let Some(size) = self.bounds {
            range = range.clamp(size)?;
        }
        Some(range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRange {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl PixelRange {
    fn spanning(candidates: &[PixelPos]) -> Option<Self> {
        let first = candidates.first()?;
        let init = (first.x, first.y, first.x, first.y);
        let (min_x, min_y, max_x, max_y) =
            candidates.iter().fold(init, |(x0, y0, x1, y1), pos| {
                (x0.min(pos.x), y0.min(pos.y), x1.max(pos.x), y1.max(pos.y))
            });
        Some(Self {
            min_x: min_x.floor() as i32,
            min_y: min_y.floor() as i32,
            max_x: max_x.floor() as i32,
            max_y: max_y.floor() as i32,
        })
    }

    fn clamp(self, size: ProductSize) -> Option<Self> {
        let clamped = Self {
            min_x: self.min_x.max(0),
            min_y: self.min_y.max(0),
            max_x: self.max_x.min(size.nx - 1),
            max_y: self.max_y.min(size.ny - 1),
        };
        (clamped.min_x <= clamped.max_x && clamped.min_y <= clamped.max_y).then_some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OffsetLocator {
        x_offset: f64,
        y_offset: f64,
    }

    impl PixelLocator for OffsetLocator {
        fn geo_location(&self, x: f64, y: f64) -> Option<Point> {
            Some(Point::new(x - self.x_offset, y - self.y_offset))
        }

        fn pixel_location(&self, lon: f64, lat: f64) -> Vec<PixelPos> {
            vec![PixelPos::new(lon + self.x_offset, lat + self.y_offset)]
        }
    }

    struct PixelTime;

    impl TimeLocator for PixelTime {
        fn time_for(&self, x: i32, y: i32) -> i64 {
            x as i64 + 1000 * y as i64
        }
    }

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(&[
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ])
        .unwrap()
    }

    #[test]
    fn test_primary_samples_offset_locator() {
        let locator = OffsetLocator {
            x_offset: 11.0,
            y_offset: 13.0,
        };
        let collector = SampleCollector::new(&locator);
        let mut set = MatchupSet::default();

        collector.add_primary_samples(&square(1.0, 1.0, 2.0), &mut set, &PixelTime);

        let samples: Vec<Sample> = set.sample_sets().iter().map(|s| s.primary).collect();
        assert_eq!(
            samples,
            vec![
                Sample::new(12, 14, 1.5, 1.5, 14012),
                Sample::new(13, 14, 2.5, 1.5, 14013),
                Sample::new(12, 15, 1.5, 2.5, 15012),
                Sample::new(13, 15, 2.5, 2.5, 15013),
            ]
        );
        assert!(set.sample_sets().iter().all(|s| s.secondary.is_none()));
    }

    #[test]
    fn test_primary_samples_clamped_to_raster() {
        let locator = OffsetLocator {
            x_offset: 0.0,
            y_offset: 0.0,
        };
        let collector = SampleCollector::new(&locator).with_bounds(ProductSize::new(2, 10));
        let mut set = MatchupSet::default();

        collector.add_primary_samples(&square(0.0, 0.0, 4.0), &mut set, &PixelTime);

        assert_eq!(set.num_observations(), 8);
        assert!(set.sample_sets().iter().all(|s| s.primary.x < 2));
    }

    #[test]
    fn test_secondary_samples() {
        let locator = OffsetLocator {
            x_offset: 11.0,
            y_offset: 13.0,
        };
        let collector = SampleCollector::new(&locator);
        let sets = vec![
            SampleSet::with_primary(Sample::new(3, 4, 1.5, 1.5, 4003)),
            SampleSet::with_primary(Sample::new(4, 4, 2.5, 1.5, 4004)),
        ];

        let complete = collector.add_secondary_samples(sets, &PixelTime);

        assert_eq!(complete.len(), 2);
        assert_eq!(complete[0].secondary, Some(Sample::new(12, 14, 1.5, 1.5, 14012)));
        assert_eq!(complete[1].secondary, Some(Sample::new(13, 14, 2.5, 1.5, 14013)));
        assert_eq!(complete[0].primary.time, 4003);
    }

    #[test]
    fn test_secondary_samples_out_of_bounds_dropped() {
        let locator = OffsetLocator {
            x_offset: 0.0,
            y_offset: 0.0,
        };
        let collector = SampleCollector::new(&locator).with_bounds(ProductSize::new(5, 5));
        let sets = vec![
            SampleSet::with_primary(Sample::new(0, 0, 1.5, 1.5, 0)),
            SampleSet::with_primary(Sample::new(0, 0, 7.5, 1.5, 0)),
            SampleSet::with_primary(Sample::new(0, 0, 3.5, 4.5, 0)),
        ];

        let complete = collector.add_secondary_samples(sets, &PixelTime);

        let pixels: Vec<(i32, i32)> = complete
            .iter()
            .filter_map(|s| s.secondary)
            .map(|s| (s.x, s.y))
            .collect();
        assert_eq!(pixels, vec![(1, 1), (3, 4)]);
    }
}
