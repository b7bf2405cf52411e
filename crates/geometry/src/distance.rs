//! Great-circle distances.

use geo::HaversineDistance;

use crate::point::Point;

/// Great-circle distance in kilometers on the mean earth radius.
pub fn spherical_distance_km(a: &Point, b: &Point) -> f64 {
    let from = geo::Point::new(a.lon, a.lat);
    let to = geo::Point::new(b.lon, b.lat);
    from.haversine_distance(&to) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point() {
        let p = Point::new(12.5, -33.0);
        assert_eq!(spherical_distance_km(&p, &p), 0.0);
    }

    #[test]
    fn test_one_degree_on_equator() {
        let d = spherical_distance_km(&Point::new(0.0, 0.0), &Point::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_across_antimeridian() {
        let d = spherical_distance_km(&Point::new(179.5, 0.0), &Point::new(-179.5, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }
}
