use geometry::{spherical_distance_km, Point};
use matchup_common::{MatchupError, MatchupResult};
use serde::Deserialize;

use super::{Condition, ConditionEngineContext};
use crate::config::RuleConfig;
use crate::sample::MatchupSet;

/// Keeps sample sets whose primary and secondary pixel centers lie within a
/// great-circle distance. The distance is stored on every surviving set.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceCondition {
    max_distance_km: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistanceParams {
    #[serde(alias = "max-pixel-distance-km")]
    max_pixel_distance_km: f64,
}

impl DistanceCondition {
    pub const NAME: &'static str = "spherical-distance";

    pub fn new(max_distance_km: f64) -> Self {
        Self { max_distance_km }
    }

    pub fn from_rule(rule: &RuleConfig) -> MatchupResult<Self> {
        let params: DistanceParams = rule.parse_params()?;
        let km = params.max_pixel_distance_km;
        if !km.is_finite() || km < 0.0 {
            return Err(MatchupError::invalid_parameter(
                Self::NAME,
                format!("max_pixel_distance_km must be a non-negative number, got {}", km),
            ));
        }
        Ok(Self::new(km))
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }
}

impl Condition for DistanceCondition {
    fn apply(&self, matchup_set: &mut MatchupSet, _context: &ConditionEngineContext) {
        let accepted = matchup_set
            .take_sample_sets()
            .into_iter()
            .filter_map(|mut set| {
                let secondary = set.secondary?;
                let km = spherical_distance_km(
                    &Point::new(set.primary.lon, set.primary.lat),
                    &Point::new(secondary.lon, secondary.lat),
                );
                if km > self.max_distance_km {
                    return None;
                }
                set.spherical_distance = Some(km as f32);
                Some(set)
            })
            .collect();
        matchup_set.set_sample_sets(accepted);
    }
}
