//! Polygon and line-string wrappers over the `geo` backend.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use geo::{Area, BooleanOps, BoundingRect, Contains, EuclideanLength};

use crate::error::{GeometryError, GeometryResult};
use crate::point::Point;

/// A closed ring of lon/lat points bounding an area.
///
/// The first and last coordinate are always equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    inner: geo::Polygon<f64>,
}

impl Polygon {
    /// Build a polygon from its exterior ring, closing it if necessary.
    pub fn new(points: &[Point]) -> GeometryResult<Self> {
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidPolygon(format!(
                "non-finite vertex ({}, {})",
                bad.lon, bad.lat
            )));
        }

        let mut distinct: Vec<Point> = points.to_vec();
        if distinct.len() > 1 && distinct.first() == distinct.last() {
            distinct.pop();
        }
        distinct.dedup();
        if distinct.len() < 3 {
            return Err(GeometryError::InvalidPolygon(format!(
                "ring needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }

        let exterior: geo::LineString<f64> =
            distinct.iter().map(|p| p.to_coord()).collect::<Vec<_>>().into();
        Ok(Self {
            inner: geo::Polygon::new(exterior, vec![]),
        })
    }

    pub(crate) fn from_geo(inner: geo::Polygon<f64>) -> Self {
        Self { inner }
    }

    pub(crate) fn with_holes(exterior: &[Point], holes: &[Vec<Point>]) -> GeometryResult<Self> {
        let shell = Self::new(exterior)?;
        let interiors = holes
            .iter()
            .map(|hole| Self::new(hole).map(|p| p.inner.exterior().clone()))
            .collect::<GeometryResult<Vec<_>>>()?;
        Ok(Self {
            inner: geo::Polygon::new(shell.inner.exterior().clone(), interiors),
        })
    }

    /// Exterior ring coordinates, including the closing duplicate.
    pub fn coordinates(&self) -> Vec<Point> {
        self.inner
            .exterior()
            .coords()
            .map(|c| Point::from_coord(*c))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.exterior().0.len() < 4
    }

    /// Point-in-polygon test; points on the boundary are not contained.
    pub fn contains(&self, point: &Point) -> bool {
        self.inner.contains(&geo::Point::new(point.lon, point.lat))
    }

    /// Geometric intersection, one polygon per disjoint piece.
    ///
    /// An empty vector means the polygons do not overlap.
    pub fn intersection(&self, other: &Polygon) -> Vec<Polygon> {
        if self.inner == other.inner {
            return vec![self.clone()];
        }
        self.inner
            .intersection(&other.inner)
            .into_iter()
            .map(Polygon::from_geo)
            .filter(|p| !p.is_empty() && p.area() > 0.0)
            .collect()
    }

    /// Like [`Polygon::intersection`], but a failure inside the backend is
    /// returned as [`GeometryError::Operation`] instead of unwinding.
    pub fn try_intersection(&self, other: &Polygon) -> GeometryResult<Vec<Polygon>> {
        guarded("intersection", || self.intersection(other))
    }

    /// Parts of `line` lying inside this polygon.
    pub fn clip_line(&self, line: &LineString) -> Vec<LineString> {
        let lines = geo::MultiLineString::new(vec![line.inner.clone()]);
        self.inner
            .clip(&lines, false)
            .into_iter()
            .filter(|ls| ls.0.len() >= 2)
            .map(|inner| LineString { inner })
            .collect()
    }

    /// Lower-left and upper-right corners of the bounding rectangle.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        self.inner
            .bounding_rect()
            .map(|rect| (Point::from_coord(rect.min()), Point::from_coord(rect.max())))
    }

    /// Planar area in square degrees.
    pub fn area(&self) -> f64 {
        self.inner.unsigned_area()
    }

    pub fn inner(&self) -> &geo::Polygon<f64> {
        &self.inner
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POLYGON(")?;
        write_ring(f, &self.coordinates())?;
        for hole in self.inner.interiors() {
            write!(f, ",")?;
            let points: Vec<Point> = hole.coords().map(|c| Point::from_coord(*c)).collect();
            write_ring(f, &points)?;
        }
        write!(f, ")")
    }
}

/// A poly-line of lon/lat points, e.g. a ground-track center line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    inner: geo::LineString<f64>,
}

impl LineString {
    pub fn new(points: &[Point]) -> GeometryResult<Self> {
        if points.len() < 2 {
            return Err(GeometryError::InvalidLineString(format!(
                "needs at least 2 vertices, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidLineString(
                "non-finite vertex".to_string(),
            ));
        }
        Ok(Self {
            inner: points.iter().map(|p| p.to_coord()).collect::<Vec<_>>().into(),
        })
    }

    pub fn num_points(&self) -> usize {
        self.inner.0.len()
    }

    pub fn point_n(&self, index: usize) -> Option<Point> {
        self.inner.0.get(index).map(|c| Point::from_coord(*c))
    }

    pub fn start_point(&self) -> Option<Point> {
        self.point_n(0)
    }

    pub fn end_point(&self) -> Option<Point> {
        self.num_points()
            .checked_sub(1)
            .and_then(|last| self.point_n(last))
    }

    pub fn points(&self) -> Vec<Point> {
        self.inner.coords().map(|c| Point::from_coord(*c)).collect()
    }

    /// Planar length in degrees.
    pub fn length(&self) -> f64 {
        self.inner.euclidean_length()
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = geo::Line<f64>> + '_ {
        self.inner.lines()
    }
}

impl fmt::Display for LineString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LINESTRING")?;
        write_ring(f, &self.points())
    }
}

pub(crate) fn write_ring(f: &mut fmt::Formatter<'_>, points: &[Point]) -> fmt::Result {
    write!(f, "(")?;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{} {}", p.lon, p.lat)?;
    }
    write!(f, ")")
}

/// Run a backend operation, turning a panic into an error.
pub(crate) fn guarded<T>(operation: &str, op: impl FnOnce() -> T) -> GeometryResult<T> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".to_string());
        GeometryError::Operation(format!("{}: {}", operation, reason))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(&[
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
            Point::new(x0, y0),
        ])
        .unwrap()
    }

    #[test]
    fn test_polygon_is_closed() {
        let polygon = Polygon::new(&[
            Point::new(2.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 4.0),
        ])
        .unwrap();

        let coords = polygon.coordinates();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn test_polygon_rejects_degenerate_ring() {
        let result = Polygon::new(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(0.0, 0.0)]);
        assert!(matches!(result, Err(GeometryError::InvalidPolygon(_))));

        let result = Polygon::new(&[
            Point::new(0.0, 0.0),
            Point::new(f64::NAN, 1.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_contains_interior_only() {
        let polygon = square(2.0, 2.0, 4.0);
        assert!(polygon.contains(&Point::new(4.0, 4.0)));
        assert!(!polygon.contains(&Point::new(2.0, 4.0)));
        assert!(!polygon.contains(&Point::new(7.0, 4.0)));
    }

    #[test]
    fn test_intersection_overlapping() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(2.0, 2.0, 4.0);

        let pieces = a.intersection(&b);
        assert_eq!(pieces.len(), 1);
        assert!((pieces[0].area() - 4.0).abs() < 1e-9);

        let (min, max) = pieces[0].bounds().unwrap();
        assert!((min.lon - 2.0).abs() < 1e-9);
        assert!((min.lat - 2.0).abs() < 1e-9);
        assert!((max.lon - 4.0).abs() < 1e-9);
        assert!((max.lat - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_try_intersection_matches_intersection() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(2.0, 2.0, 4.0);
        assert_eq!(a.try_intersection(&b).unwrap(), a.intersection(&b));
    }

    #[test]
    fn test_guarded_catches_backend_panic() {
        let err = guarded("intersection", || -> Vec<Polygon> { panic!("sweep line out of order") })
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::Operation("intersection: sweep line out of order".into())
        );

        let err = guarded("intersection", || -> u8 { panic!("{} segments", 3) }).unwrap_err();
        assert_eq!(err, GeometryError::Operation("intersection: 3 segments".into()));
    }

    #[test]
    fn test_intersection_disjoint() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(10.0, 10.0, 1.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn test_intersection_identical() {
        let a = square(-3.0, 40.0, 2.5);
        let pieces = a.intersection(&a.clone());
        assert_eq!(pieces.len(), 1);
        assert!((pieces[0].area() - a.area()).abs() < 1e-9);

        // same vertex set, ring start and orientation may differ
        let result = pieces[0].coordinates();
        for vertex in a.coordinates() {
            assert!(result
                .iter()
                .any(|p| (p.lon - vertex.lon).abs() < 1e-9 && (p.lat - vertex.lat).abs() < 1e-9));
        }
    }

    #[test]
    fn test_clip_line() {
        let polygon = square(0.0, 0.0, 4.0);
        let line = LineString::new(&[Point::new(-2.0, 2.0), Point::new(6.0, 2.0)]).unwrap();

        let clipped = polygon.clip_line(&line);
        assert_eq!(clipped.len(), 1);
        assert!((clipped[0].length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_string_accessors() {
        let line = LineString::new(&[
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 6.0),
        ])
        .unwrap();

        assert_eq!(line.num_points(), 3);
        assert_eq!(line.start_point(), Some(Point::new(0.0, 0.0)));
        assert_eq!(line.end_point(), Some(Point::new(3.0, 6.0)));
        assert!((line.length() - 7.0).abs() < 1e-12);
        assert!(LineString::new(&[Point::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_display_wkt() {
        let polygon = square(1.0, 1.0, 1.0);
        assert_eq!(polygon.to_string(), "POLYGON((1 1,2 1,2 2,1 2,1 1))");

        let line = LineString::new(&[Point::new(2.0, 1.0), Point::new(3.5, 2.0)]).unwrap();
        assert_eq!(line.to_string(), "LINESTRING(2 1,3.5 2)");
    }
}
