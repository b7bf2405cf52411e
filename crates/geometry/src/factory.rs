//! Geometry construction entry point.

use std::fmt;

use crate::error::GeometryResult;
use crate::point::Point;
use crate::shapes::{write_ring, LineString, Polygon};
use crate::wkt;

/// Any geometry the WKT reader can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(line) => line.num_points() == 0,
            Geometry::Polygon(polygon) => polygon.is_empty(),
            Geometry::MultiPolygon(polygons) => polygons.iter().all(Polygon::is_empty),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(p) => write!(f, "POINT({} {})", p.lon, p.lat),
            Geometry::LineString(line) => write!(f, "{}", line),
            Geometry::Polygon(polygon) => write!(f, "{}", polygon),
            Geometry::MultiPolygon(polygons) => {
                write!(f, "MULTIPOLYGON(")?;
                for (i, polygon) in polygons.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "(")?;
                    write_ring(f, &polygon.coordinates())?;
                    write!(f, ")")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Creates geometries for the configured backend.
///
/// The planar `geo` backend is the only implementation; the factory keeps
/// construction in one place so callers never depend on the backend types.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryFactory;

impl GeometryFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, wkt: &str) -> GeometryResult<Geometry> {
        wkt::parse(wkt)
    }

    pub fn create_point(&self, lon: f64, lat: f64) -> Point {
        Point::new(lon, lat)
    }

    pub fn create_polygon(&self, points: &[Point]) -> GeometryResult<Polygon> {
        Polygon::new(points)
    }

    pub fn create_line_string(&self, points: &[Point]) -> GeometryResult<LineString> {
        LineString::new(points)
    }
}
