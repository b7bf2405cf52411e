//! Error types for geometry construction and parsing.

use matchup_common::MatchupError;
use thiserror::Error;

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while building or parsing geometries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Malformed WKT input.
    #[error("invalid WKT: {0}")]
    InvalidWkt(String),

    /// WKT type the backend does not model.
    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),

    /// Polygon ring that cannot bound an area.
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    /// Line with fewer than two vertices.
    #[error("invalid line string: {0}")]
    InvalidLineString(String),

    /// Failure inside the geometry backend.
    #[error("geometry operation failed: {0}")]
    Operation(String),

    /// Time axis whose line has no length.
    #[error("degenerate time axis: {0}")]
    DegenerateAxis(String),
}

impl From<GeometryError> for MatchupError {
    fn from(err: GeometryError) -> Self {
        MatchupError::Geometry(err.to_string())
    }
}
