use matchup_common::{MatchupError, MatchupResult};
use serde::Deserialize;

use super::{Condition, ConditionEngineContext};
use crate::config::RuleConfig;
use crate::sample::MatchupSet;

/// Keeps sample sets whose primary and secondary acquisition times differ by
/// at most the configured delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeDeltaCondition {
    max_time_delta_millis: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeDeltaParams {
    #[serde(alias = "time-delta-seconds")]
    time_delta_seconds: i64,
}

impl TimeDeltaCondition {
    pub const NAME: &'static str = "time-delta";

    /// Largest accepted delta, one century. Keeps every search window around
    /// a sensing interval representable.
    pub const MAX_TIME_DELTA_SECONDS: i64 = 3_155_760_000;

    pub fn new(max_time_delta_millis: i64) -> Self {
        Self {
            max_time_delta_millis,
        }
    }

    pub fn from_rule(rule: &RuleConfig) -> MatchupResult<Self> {
        let params: TimeDeltaParams = rule.parse_params()?;
        let seconds = params.time_delta_seconds;
        if !(0..=Self::MAX_TIME_DELTA_SECONDS).contains(&seconds) {
            return Err(MatchupError::invalid_parameter(
                Self::NAME,
                format!(
                    "time_delta_seconds must be within [0, {}], got {}",
                    Self::MAX_TIME_DELTA_SECONDS,
                    seconds
                ),
            ));
        }
        let millis = seconds.checked_mul(1000).ok_or_else(|| {
            MatchupError::invalid_parameter(Self::NAME, format!("{} s overflows in ms", seconds))
        })?;
        Ok(Self::new(millis))
    }

    pub fn max_time_delta_millis(&self) -> i64 {
        self.max_time_delta_millis
    }
}

impl Condition for TimeDeltaCondition {
    fn apply(&self, matchup_set: &mut MatchupSet, _context: &ConditionEngineContext) {
        matchup_set.retain(|set| match set.secondary {
            Some(secondary) => (set.primary.time - secondary.time).abs() <= self.max_time_delta_millis,
            None => false,
        });
    }
}
