//! JSON summary of a matchup run.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use matchup_common::MatchupResult;
use serde::Serialize;

use crate::sample::MatchupCollection;
use crate::stats::MatchupStats;

#[derive(Debug, Clone, Serialize)]
pub struct MatchupSummary<'a> {
    pub use_case: &'a str,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub stats: &'a MatchupStats,
    pub acceptance_rate: f64,
    pub matchups: &'a MatchupCollection,
}

impl<'a> MatchupSummary<'a> {
    pub fn new(
        use_case: &'a str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        stats: &'a MatchupStats,
        matchups: &'a MatchupCollection,
    ) -> Self {
        Self {
            use_case,
            start_date,
            end_date,
            stats,
            acceptance_rate: stats.acceptance_rate(),
            matchups,
        }
    }

    pub fn to_json(&self) -> MatchupResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> MatchupResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MatchupSet, Sample, SampleSet};
    use chrono::TimeZone;

    fn collection() -> MatchupCollection {
        let mut set = MatchupSet::new(
            "amsub-n15".to_string(),
            std::path::PathBuf::from("/archive/amsub/a.nc"),
            "mhs-n18".to_string(),
            std::path::PathBuf::from("/archive/mhs/b.nc"),
        );
        let mut pair = SampleSet::with_primary(Sample::new(3, 4, 10.5, 50.5, 1_000))
            .with_secondary(Sample::new(7, 8, 10.51, 50.49, 2_000));
        pair.spherical_distance = Some(1.3);
        set.set_sample_sets(vec![pair]);
        std::iter::once(set).collect()
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.json");
        let stats = MatchupStats {
            sample_sets_collected: 4,
            accepted_sample_sets: 1,
            matchup_sets: 1,
            ..Default::default()
        };
        let matchups = collection();
        let summary = MatchupSummary::new(
            "mhs-amsub",
            Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2016, 1, 2, 0, 0, 0).unwrap(),
            &stats,
            &matchups,
        );
        summary.write(&path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["use_case"], "mhs-amsub");
        assert_eq!(json["acceptance_rate"], 0.25);
        assert_eq!(json["stats"]["matchup_sets"], 1);
        let pair = &json["matchups"]["sets"][0]["sample_sets"][0];
        assert_eq!(pair["primary"]["x"], 3);
        assert_eq!(pair["secondary"]["y"], 8);
        assert!(pair["spherical_distance"].as_f64().is_some());
    }
}
