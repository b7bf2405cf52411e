//! Scene footprint geometry.

use crate::error::{GeometryError, GeometryResult};
use crate::factory::Geometry;
use crate::shapes::Polygon;

/// Polygon, or set of polygons, enclosing a scene's footprint.
///
/// Readers split footprints that wrap the antimeridian or cross a pole into
/// `Segmented` parts; each part is then handled with its own sub-scene
/// pixel locator.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundingGeometry {
    Single(Polygon),
    Segmented(Vec<Polygon>),
}

impl BoundingGeometry {
    /// All footprint parts in reader order.
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            BoundingGeometry::Single(polygon) => std::slice::from_ref(polygon),
            BoundingGeometry::Segmented(polygons) => polygons,
        }
    }

    /// True only when the footprint really consists of several parts.
    pub fn is_segmented(&self) -> bool {
        match self {
            BoundingGeometry::Single(_) => false,
            BoundingGeometry::Segmented(polygons) => polygons.len() > 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons().iter().all(Polygon::is_empty)
    }
}

impl TryFrom<Geometry> for BoundingGeometry {
    type Error = GeometryError;

    fn try_from(geometry: Geometry) -> GeometryResult<Self> {
        match geometry {
            Geometry::Polygon(polygon) => Ok(BoundingGeometry::Single(polygon)),
            Geometry::MultiPolygon(polygons) if !polygons.is_empty() => {
                Ok(BoundingGeometry::Segmented(polygons))
            }
            Geometry::MultiPolygon(_) => Err(GeometryError::InvalidPolygon(
                "empty multi-polygon cannot bound a scene".to_string(),
            )),
            Geometry::Point(_) => Err(GeometryError::UnsupportedType(
                "POINT as bounding geometry".to_string(),
            )),
            Geometry::LineString(_) => Err(GeometryError::UnsupportedType(
                "LINESTRING as bounding geometry".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryFactory;

    #[test]
    fn test_is_segmented() {
        let factory = GeometryFactory::new();
        let polygon = match factory.parse("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap() {
            Geometry::Polygon(p) => p,
            _ => unreachable!(),
        };

        assert!(!BoundingGeometry::Single(polygon.clone()).is_segmented());
        assert!(!BoundingGeometry::Segmented(vec![polygon.clone()]).is_segmented());
        assert!(BoundingGeometry::Segmented(vec![polygon.clone(), polygon]).is_segmented());
    }

    #[test]
    fn test_from_wkt() {
        let factory = GeometryFactory::new();

        let single = factory.parse("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let bounds = BoundingGeometry::try_from(single).unwrap();
        assert_eq!(bounds.polygons().len(), 1);

        let multi = factory
            .parse("MULTIPOLYGON(((170 0, 180 0, 180 5, 170 5, 170 0)), ((-180 0, -170 0, -170 5, -180 5, -180 0)))")
            .unwrap();
        let bounds = BoundingGeometry::try_from(multi).unwrap();
        assert!(bounds.is_segmented());

        let line = factory.parse("LINESTRING(0 0, 1 1)").unwrap();
        assert!(BoundingGeometry::try_from(line).is_err());
    }
}
