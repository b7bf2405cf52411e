//! Reader for swath scenes on a regular lon/lat grid.
//!
//! Each scene is a JSON manifest holding the raster geometry, the line
//! timing and the stored variables. Geolocation is affine, so the forward and
//! inverse mapping are exact; `lon` and `lat` can be read like any other
//! variable. A manifest may split its footprint into segments at given
//! lines, each with its own time axis and sub-scene pixel locator.

pub mod catalog;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod reader;

pub use catalog::{load_catalog, manifest_paths, observation_from_manifest};
pub use error::{SceneError, SceneResult};
pub use locator::{GridGeometry, GridPixelLocator, LineTimeLocator};
pub use manifest::{SceneManifest, VariableSpec, DEFAULT_FILL_VALUE};
pub use reader::{Scene, SceneReader, SceneReaderFactory, LAT_VARIABLE, LON_VARIABLE};
