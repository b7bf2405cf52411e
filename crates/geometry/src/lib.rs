//! Geometry abstraction for satellite ground-tracks.
//!
//! Wraps the planar `geo` backend behind a small set of types so that the
//! matchup engine never touches the backend directly:
//!
//! - [`Point`], [`Polygon`], [`LineString`]: lon/lat geometries in degrees
//! - [`BoundingGeometry`]: a scene footprint, single or segmented
//! - [`GeometryFactory`]: construction and WKT parsing
//! - [`TimeAxis`]: acquisition time along a ground-track center line
//!
//! Segmented footprints (antimeridian or pole crossings) are expected to be
//! split by the reader, so planar operations stay valid per segment.

pub mod bounding;
pub mod distance;
pub mod error;
pub mod factory;
pub mod point;
pub mod shapes;
pub mod time_axis;
mod wkt;

pub use bounding::BoundingGeometry;
pub use distance::spherical_distance_km;
pub use error::{GeometryError, GeometryResult};
pub use factory::{Geometry, GeometryFactory};
pub use point::Point;
pub use shapes::{LineString, Polygon};
pub use time_axis::TimeAxis;
