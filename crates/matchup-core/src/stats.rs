//! Counters describing a matchup run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchupStats {
    pub primary_observations: u64,
    pub secondary_candidates: u64,
    pub intersections: u64,
    /// Intersections rejected by the coarse time check before sampling.
    pub skipped_by_time: u64,
    pub sample_sets_collected: u64,
    pub removed_by_conditions: u64,
    pub removed_by_screenings: u64,
    /// Observations or pairs abandoned after a reader or geometry error.
    pub failed_pairs: u64,
    pub matchup_sets: u64,
    pub accepted_sample_sets: u64,
}

impl MatchupStats {
    pub fn merge(&mut self, other: &MatchupStats) {
        self.primary_observations += other.primary_observations;
        self.secondary_candidates += other.secondary_candidates;
        self.intersections += other.intersections;
        self.skipped_by_time += other.skipped_by_time;
        self.sample_sets_collected += other.sample_sets_collected;
        self.removed_by_conditions += other.removed_by_conditions;
        self.removed_by_screenings += other.removed_by_screenings;
        self.failed_pairs += other.failed_pairs;
        self.matchup_sets += other.matchup_sets;
        self.accepted_sample_sets += other.accepted_sample_sets;
    }

    /// Fraction of collected sample sets that survived all filters.
    pub fn acceptance_rate(&self) -> f64 {
        if self.sample_sets_collected == 0 {
            0.0
        } else {
            self.accepted_sample_sets as f64 / self.sample_sets_collected as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut total = MatchupStats {
            primary_observations: 1,
            sample_sets_collected: 10,
            accepted_sample_sets: 4,
            ..Default::default()
        };
        total.merge(&MatchupStats {
            primary_observations: 2,
            failed_pairs: 1,
            sample_sets_collected: 10,
            accepted_sample_sets: 1,
            ..Default::default()
        });

        assert_eq!(total.primary_observations, 3);
        assert_eq!(total.failed_pairs, 1);
        assert!((total.acceptance_rate() - 0.25).abs() < 1e-12);
        assert_eq!(MatchupStats::default().acceptance_rate(), 0.0);
    }
}
