//! Error types for scene reading.

use std::path::PathBuf;

use geometry::GeometryError;
use matchup_common::MatchupError;
use thiserror::Error;

/// Result type for scene reader operations.
pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Error, Debug)]
pub enum SceneError {
    /// Manifest file could not be read
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON for the expected layout
    #[error("Malformed manifest {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest parsed but describes an unusable scene
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("No scene open")]
    NotOpen,

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Polygon does not match any footprint segment of the scene
    #[error("No scene segment for polygon {0}")]
    UnknownSegment(String),

    #[error("No reader for sensor: {0}")]
    UnsupportedSensor(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl From<SceneError> for MatchupError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::Geometry(e) => e.into(),
            other => MatchupError::Reader(other.to_string()),
        }
    }
}
