//! Building an observation catalog from a directory of manifests.

use std::fs;
use std::path::{Path, PathBuf};

use matchup_core::{ObservationCatalog, SatelliteObservation};
use tracing::{info, warn};

use crate::error::{SceneError, SceneResult};
use crate::reader::Scene;

pub const MANIFEST_EXTENSION: &str = "json";

/// Catalog entry for the scene described by `path`.
pub fn observation_from_manifest(path: &Path) -> SceneResult<SatelliteObservation> {
    let scene = Scene::open(path)?;
    let info = scene.acquisition_info()?;
    let manifest = scene.manifest();
    Ok(SatelliteObservation {
        sensor: manifest.sensor.clone(),
        version: manifest.version.clone(),
        data_file_path: path.to_path_buf(),
        start_time: info.sensing_start,
        stop_time: info.sensing_stop,
        geo_bounds: info.bounding_geometry,
        time_axes: info.time_axes,
    })
}

/// Manifest files directly inside `dir`, sorted by name.
pub fn manifest_paths(dir: &Path) -> SceneResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| SceneError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| SceneError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_manifest = path.is_file()
            && path
                .extension()
                .map_or(false, |ext| ext == MANIFEST_EXTENSION);
        if is_manifest {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every manifest in `dir`. Unreadable manifests are logged and skipped.
pub fn load_catalog(dir: &Path) -> SceneResult<ObservationCatalog> {
    let mut catalog = ObservationCatalog::new();
    let mut skipped = 0usize;
    for path in manifest_paths(dir)? {
        match observation_from_manifest(&path) {
            Ok(observation) => catalog.insert(observation),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping scene manifest");
                skipped += 1;
            }
        }
    }
    info!(
        dir = %dir.display(),
        observations = catalog.len(),
        skipped,
        "Loaded scene catalog"
    );
    Ok(catalog)
}
