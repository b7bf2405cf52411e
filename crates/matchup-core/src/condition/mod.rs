//! Geometry and time conditions applied to collected sample sets.
//!
//! Conditions run in configured order; each one replaces the sample sets of a
//! [`MatchupSet`] with those passing it, so later conditions only see the
//! survivors of earlier ones.

mod distance;
mod time_delta;

pub use distance::DistanceCondition;
pub use time_delta::TimeDeltaCondition;

use chrono::{DateTime, Utc};
use matchup_common::{MatchupError, MatchupResult};
use tracing::debug;

use crate::config::{RuleConfig, UseCaseConfig};
use crate::sample::MatchupSet;

/// Run-level information available to every condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEngineContext {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

pub trait Condition {
    fn apply(&self, matchup_set: &mut MatchupSet, context: &ConditionEngineContext);
}

/// Every built-in condition.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyCondition {
    TimeDelta(TimeDeltaCondition),
    Distance(DistanceCondition),
}

impl Condition for AnyCondition {
    fn apply(&self, matchup_set: &mut MatchupSet, context: &ConditionEngineContext) {
        match self {
            AnyCondition::TimeDelta(c) => c.apply(matchup_set, context),
            AnyCondition::Distance(c) => c.apply(matchup_set, context),
        }
    }
}

impl AnyCondition {
    pub fn name(&self) -> &'static str {
        match self {
            AnyCondition::TimeDelta(_) => TimeDeltaCondition::NAME,
            AnyCondition::Distance(_) => DistanceCondition::NAME,
        }
    }
}

type ConditionConstructor = fn(&RuleConfig) -> MatchupResult<AnyCondition>;

/// Rule name to constructor.
const REGISTRY: &[(&str, ConditionConstructor)] = &[
    (TimeDeltaCondition::NAME, time_delta),
    (DistanceCondition::NAME, spherical_distance),
];

fn time_delta(rule: &RuleConfig) -> MatchupResult<AnyCondition> {
    TimeDeltaCondition::from_rule(rule).map(AnyCondition::TimeDelta)
}

fn spherical_distance(rule: &RuleConfig) -> MatchupResult<AnyCondition> {
    DistanceCondition::from_rule(rule).map(AnyCondition::Distance)
}

/// Names of all registered conditions.
pub fn condition_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Build a condition from its rule entry.
pub fn create_condition(rule: &RuleConfig) -> MatchupResult<AnyCondition> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == rule.name)
        .map(|(_, constructor)| constructor(rule))
        .unwrap_or_else(|| Err(MatchupError::UnknownRule(format!("condition '{}'", rule.name))))
}

/// The ordered condition pipeline of a use case.
#[derive(Debug, Clone, Default)]
pub struct ConditionEngine {
    conditions: Vec<AnyCondition>,
}

impl ConditionEngine {
    pub fn configure(use_case: &UseCaseConfig) -> MatchupResult<Self> {
        let conditions = use_case
            .conditions
            .iter()
            .map(create_condition)
            .collect::<MatchupResult<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    pub fn from_conditions(conditions: Vec<AnyCondition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[AnyCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn apply(&self, matchup_set: &mut MatchupSet, context: &ConditionEngineContext) {
        for condition in &self.conditions {
            let before = matchup_set.num_observations();
            condition.apply(matchup_set, context);
            debug!(
                condition = condition.name(),
                before,
                after = matchup_set.num_observations(),
                "Applied condition"
            );
            if matchup_set.is_empty() {
                break;
            }
        }
    }

    /// Largest configured time delta in milliseconds, 0 without a time-delta
    /// condition.
    pub fn max_time_delta_millis(&self) -> i64 {
        self.conditions
            .iter()
            .filter_map(|c| match c {
                AnyCondition::TimeDelta(t) => Some(t.max_time_delta_millis()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
