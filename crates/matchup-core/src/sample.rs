//! Matched pixel samples and their collections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single pixel observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub lon: f64,
    pub lat: f64,
    /// Acquisition time in milliseconds since the epoch.
    pub time: i64,
}

impl Sample {
    pub fn new(x: i32, y: i32, lon: f64, lat: f64, time: i64) -> Self {
        Self {
            x,
            y,
            lon,
            lat,
            time,
        }
    }
}

/// One primary sample paired with at most one secondary sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub primary: Sample,
    pub secondary: Option<Sample>,
    /// Great-circle distance in km, set by the spherical-distance condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spherical_distance: Option<f32>,
}

impl SampleSet {
    pub fn with_primary(primary: Sample) -> Self {
        Self {
            primary,
            secondary: None,
            spherical_distance: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Sample) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.secondary.is_some()
    }
}

/// All sample sets found for one primary/secondary observation pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchupSet {
    pub primary_sensor: String,
    pub secondary_sensor: String,
    pub primary_observation_path: PathBuf,
    pub secondary_observation_path: PathBuf,
    pub sample_sets: Vec<SampleSet>,
}

impl MatchupSet {
    pub fn new(
        primary_sensor: impl Into<String>,
        primary_observation_path: impl Into<PathBuf>,
        secondary_sensor: impl Into<String>,
        secondary_observation_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            primary_sensor: primary_sensor.into(),
            secondary_sensor: secondary_sensor.into(),
            primary_observation_path: primary_observation_path.into(),
            secondary_observation_path: secondary_observation_path.into(),
            sample_sets: Vec::new(),
        }
    }

    pub fn sample_sets(&self) -> &[SampleSet] {
        &self.sample_sets
    }

    /// Replace the sample sets; stages filter by building a new list.
    pub fn set_sample_sets(&mut self, sample_sets: Vec<SampleSet>) {
        self.sample_sets = sample_sets;
    }

    pub fn take_sample_sets(&mut self) -> Vec<SampleSet> {
        std::mem::take(&mut self.sample_sets)
    }

    pub fn add_primary(&mut self, primary: Sample) {
        self.sample_sets.push(SampleSet::with_primary(primary));
    }

    pub fn num_observations(&self) -> usize {
        self.sample_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_sets.is_empty()
    }

    /// Keep only the sample sets accepted by `keep`, preserving order.
    /// Returns the number removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&SampleSet) -> bool,
    {
        let before = self.sample_sets.len();
        self.sample_sets.retain(keep);
        before - self.sample_sets.len()
    }
}

/// Ordered matchup sets of a processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchupCollection {
    sets: Vec<MatchupSet>,
}

impl MatchupCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, set: MatchupSet) {
        self.sets.push(set);
    }

    pub fn extend(&mut self, other: MatchupCollection) {
        self.sets.extend(other.sets);
    }

    pub fn sets(&self) -> &[MatchupSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sample sets over all matchup sets.
    pub fn num_sample_sets(&self) -> usize {
        self.sets.iter().map(MatchupSet::num_observations).sum()
    }
}

impl FromIterator<MatchupSet> for MatchupCollection {
    fn from_iter<I: IntoIterator<Item = MatchupSet>>(iter: I) -> Self {
        Self {
            sets: iter.into_iter().collect(),
        }
    }
}

/// First matchup set of a collection, if any.
pub fn first_matchup_set(collection: &MatchupCollection) -> Option<&MatchupSet> {
    collection.sets().first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: i32, y: i32) -> Sample {
        Sample::new(x, y, x as f64 * 0.1, y as f64 * 0.1, (x + 1000 * y) as i64)
    }

    #[test]
    fn test_sample_set_defaults() {
        let set = SampleSet::with_primary(sample(3, 4));
        assert_eq!(set.primary.time, 4003);
        assert!(set.secondary.is_none());
        assert!(set.spherical_distance.is_none());
        assert!(!set.is_complete());

        let set = set.with_secondary(sample(5, 6));
        assert!(set.is_complete());
    }

    #[test]
    fn test_matchup_set_retain_preserves_order() {
        let mut set = MatchupSet::new("avhrr-n17", "/a.nc", "amsub-n15", "/b.nc");
        for x in 0..6 {
            set.add_primary(sample(x, 0));
        }

        let removed = set.retain(|s| s.primary.x % 2 == 0);
        assert_eq!(removed, 3);
        let xs: Vec<i32> = set.sample_sets().iter().map(|s| s.primary.x).collect();
        assert_eq!(xs, vec![0, 2, 4]);
    }

    #[test]
    fn test_first_matchup_set() {
        let mut collection = MatchupCollection::new();
        assert!(first_matchup_set(&collection).is_none());

        collection.add(MatchupSet::new("a", "/1", "b", "/2"));
        collection.add(MatchupSet::new("a", "/3", "b", "/4"));
        let first = first_matchup_set(&collection).unwrap();
        assert_eq!(first.primary_observation_path, PathBuf::from("/1"));
    }

    #[test]
    fn test_collection_counts() {
        let mut a = MatchupSet::new("a", "/1", "b", "/2");
        a.add_primary(sample(1, 1));
        a.add_primary(sample(2, 1));
        let mut b = MatchupSet::new("a", "/1", "b", "/3");
        b.add_primary(sample(1, 2));

        let collection: MatchupCollection = vec![a, b].into_iter().collect();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.num_sample_sets(), 3);
    }
}
