//! Matchup runs over manifest archives on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use matchup_core::{
    first_matchup_set, MatchupRun, MatchupStrategy, MatchupSummary, ToolContext, UseCaseConfig,
};
use scene_reader::{load_catalog, manifest_paths, observation_from_manifest, SceneReaderFactory};
use serde_json::json;
use test_utils::{sensors, temp_test_dir, utc, SyntheticSwath};

fn t0() -> chrono::DateTime<Utc> {
    utc(2016, 3, 2, 10, 0, 0)
}

fn primary_swath() -> SyntheticSwath {
    SyntheticSwath::new(sensors::AMSUB_N15, 20, 20)
        .starting_at(t0())
        .variable("flags", |x, _| if x == 5 { 1.0 } else { 0.0 })
}

fn secondary_swath() -> SyntheticSwath {
    SyntheticSwath::new(sensors::MHS_N18, 10, 10)
        .origin(5.0, 5.0)
        .starting_at(t0() + Duration::seconds(65))
}

fn write_segmented(swath: &SyntheticSwath, dir: &Path, name: &str, breaks: &[i32]) -> PathBuf {
    let mut manifest = swath.manifest_json();
    manifest["segment_breaks"] = json!(breaks);
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
    path
}

fn use_case(screenings: &str) -> UseCaseConfig {
    let yaml = format!(
        r#"
name: amsub-mhs
output_path: /tmp/amsub-mhs
sensors:
  - name: amsub-n15
    primary: true
  - name: mhs-n18
conditions:
  - name: time-delta
    time_delta_seconds: 300
screenings: {screenings}
"#
    );
    UseCaseConfig::from_yaml_str(&yaml).unwrap()
}

fn run_archive(dir: &Path, use_case: UseCaseConfig) -> MatchupRun {
    let context = ToolContext {
        start_date: t0() - Duration::hours(1),
        end_date: t0() + Duration::hours(1),
        use_case,
        observations: Arc::new(load_catalog(dir).unwrap()),
        readers: Arc::new(SceneReaderFactory::with_sensors([
            sensors::AMSUB_N15,
            sensors::MHS_N18,
        ])),
    };
    MatchupStrategy::new(&context).unwrap().run().unwrap()
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_catalog_skips_broken_and_foreign_files() {
    let dir = temp_test_dir();
    primary_swath().write_manifest(dir.path(), "b-amsub.json");
    secondary_swath().write_manifest(dir.path(), "a-mhs.json");
    fs::write(dir.path().join("c-broken.json"), "{ not a manifest").unwrap();
    let mut endless = secondary_swath().manifest_json();
    endless["line_duration_ms"] = json!(i64::MAX / 2);
    fs::write(dir.path().join("d-endless.json"), endless.to_string()).unwrap();
    fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

    let paths = manifest_paths(dir.path()).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["a-mhs.json", "b-amsub.json", "c-broken.json", "d-endless.json"]
    );

    let catalog = load_catalog(dir.path()).unwrap();
    assert_eq!(catalog.len(), 2);
}

#[test]
fn test_catalog_of_missing_directory_fails() {
    let dir = temp_test_dir();
    assert!(load_catalog(&dir.path().join("missing")).is_err());
}

#[test]
fn test_segmented_manifest_yields_segmented_observation() {
    let dir = temp_test_dir();
    let path = write_segmented(&primary_swath(), dir.path(), "amsub.json", &[10]);

    let observation = observation_from_manifest(&path).unwrap();
    assert!(observation.geo_bounds.is_segmented());
    assert_eq!(observation.geo_bounds.polygons().len(), 2);
    assert_eq!(observation.time_axes.len(), 2);
    assert_eq!(observation.start_time, t0());
    assert_eq!(observation.stop_time, t0() + Duration::seconds(20));
}

// ============================================================================
// Matchup runs
// ============================================================================

#[test]
fn test_run_over_manifests() {
    let dir = temp_test_dir();
    primary_swath().write_manifest(dir.path(), "amsub.json");
    secondary_swath().write_manifest(dir.path(), "mhs.json");

    let result = run_archive(dir.path(), use_case("[]"));

    let set = first_matchup_set(&result.collection).unwrap();
    assert_eq!(set.num_observations(), 100);
    assert_eq!(set.primary_observation_path, dir.path().join("amsub.json"));
    for pair in set.sample_sets() {
        let secondary = pair.secondary.unwrap();
        assert_eq!(secondary.x, pair.primary.x - 5);
        assert_eq!(secondary.y, pair.primary.y - 5);
    }
    assert_eq!(result.stats.failed_pairs, 0);
}

#[test]
fn test_pixel_flag_screening_reads_manifest_variable() {
    let dir = temp_test_dir();
    primary_swath().write_manifest(dir.path(), "amsub.json");
    secondary_swath().write_manifest(dir.path(), "mhs.json");

    let screenings = "[{ name: pixel-flag, primary: { variable: flags, mask: 1 } }]";
    let result = run_archive(dir.path(), use_case(screenings));

    let set = first_matchup_set(&result.collection).unwrap();
    assert_eq!(set.num_observations(), 90);
    assert_eq!(result.stats.removed_by_screenings, 10);
}

#[test]
fn test_segmented_primary_intersects_per_segment() {
    let dir = temp_test_dir();
    write_segmented(&primary_swath(), dir.path(), "amsub.json", &[10]);
    secondary_swath().write_manifest(dir.path(), "mhs.json");

    let result = run_archive(dir.path(), use_case("[]"));

    assert_eq!(result.stats.intersections, 2);
    assert_eq!(result.stats.skipped_by_time, 0);
    let set = first_matchup_set(&result.collection).unwrap();
    assert!(set.num_observations() > 0);
    for pair in set.sample_sets() {
        let secondary = pair.secondary.unwrap();
        assert_eq!(secondary.x, pair.primary.x - 5);
        assert_eq!(secondary.y, pair.primary.y - 5);
    }
}

#[test]
fn test_summary_written_for_run() {
    let dir = temp_test_dir();
    primary_swath().write_manifest(dir.path(), "amsub.json");
    secondary_swath().write_manifest(dir.path(), "mhs.json");
    let result = run_archive(dir.path(), use_case("[]"));

    let path = dir.path().join("out").join("summary.json");
    MatchupSummary::new(
        "amsub-mhs",
        t0() - Duration::hours(1),
        t0() + Duration::hours(1),
        &result.stats,
        &result.collection,
    )
    .write(&path)
    .unwrap();

    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(summary["use_case"], "amsub-mhs");
    assert_eq!(summary["stats"]["accepted_sample_sets"], 100);
}
