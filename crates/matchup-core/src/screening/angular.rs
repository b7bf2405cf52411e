use matchup_common::{MatchupError, MatchupResult};
use serde::Deserialize;

use super::{center_value, Screening};
use crate::config::RuleConfig;
use crate::reader::Reader;
use crate::sample::{MatchupSet, SampleSet};

/// Rejects pairs observed under too steep or too different viewing zenith
/// angles.
///
/// Angles are read scaled from the center pixel of each sample. A pair whose
/// angle is a fill value is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AngularScreening {
    #[serde(default, alias = "primary-variable")]
    pub primary_variable: Option<String>,
    #[serde(default, alias = "secondary-variable")]
    pub secondary_variable: Option<String>,
    #[serde(default, alias = "max-primary-vza")]
    pub max_primary_vza: Option<f64>,
    #[serde(default, alias = "max-secondary-vza")]
    pub max_secondary_vza: Option<f64>,
    #[serde(default, alias = "max-angle-delta")]
    pub max_angle_delta: Option<f64>,
}

impl AngularScreening {
    pub const NAME: &'static str = "angular";

    pub fn from_rule(rule: &RuleConfig) -> MatchupResult<Self> {
        let screening: Self = rule.parse_params()?;
        screening.validate()?;
        Ok(screening)
    }

    fn validate(&self) -> MatchupResult<()> {
        let invalid = |msg: &str| Err(MatchupError::invalid_parameter(Self::NAME, msg));

        if self.max_primary_vza.is_none()
            && self.max_secondary_vza.is_none()
            && self.max_angle_delta.is_none()
        {
            return invalid("at least one of max_primary_vza, max_secondary_vza, max_angle_delta required");
        }
        if self.max_primary_vza.is_some() && self.primary_variable.is_none() {
            return invalid("max_primary_vza needs primary_variable");
        }
        if self.max_secondary_vza.is_some() && self.secondary_variable.is_none() {
            return invalid("max_secondary_vza needs secondary_variable");
        }
        if self.max_angle_delta.is_some()
            && (self.primary_variable.is_none() || self.secondary_variable.is_none())
        {
            return invalid("max_angle_delta needs primary_variable and secondary_variable");
        }
        Ok(())
    }

    fn accepts(
        &self,
        set: &SampleSet,
        primary: &dyn Reader,
        secondary: &dyn Reader,
    ) -> MatchupResult<bool> {
        let Some(secondary_sample) = set.secondary else {
            return Ok(false);
        };

        let primary_angle = match &self.primary_variable {
            Some(variable) => {
                match center_value(primary, set.primary.x, set.primary.y, variable, true)? {
                    Some(angle) => Some(angle),
                    None => return Ok(false),
                }
            }
            None => None,
        };
        let secondary_angle = match &self.secondary_variable {
            Some(variable) => {
                match center_value(secondary, secondary_sample.x, secondary_sample.y, variable, true)? {
                    Some(angle) => Some(angle),
                    None => return Ok(false),
                }
            }
            None => None,
        };

        if let (Some(max), Some(angle)) = (self.max_primary_vza, primary_angle) {
            if angle.abs() > max {
                return Ok(false);
            }
        }
        if let (Some(max), Some(angle)) = (self.max_secondary_vza, secondary_angle) {
            if angle.abs() > max {
                return Ok(false);
            }
        }
        if let (Some(max), Some(p), Some(s)) = (self.max_angle_delta, primary_angle, secondary_angle) {
            if (p - s).abs() > max {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Screening for AngularScreening {
    fn apply(
        &self,
        matchup_set: &mut MatchupSet,
        primary: &dyn Reader,
        secondary: &dyn Reader,
    ) -> MatchupResult<()> {
        let mut accepted = Vec::with_capacity(matchup_set.num_observations());
        for set in matchup_set.take_sample_sets() {
            if self.accepts(&set, primary, secondary)? {
                accepted.push(set);
            }
        }
        matchup_set.set_sample_sets(accepted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::test_reader::{VariableReader, FILL};

    fn pair(x: i32) -> SampleSet {
        SampleSet::with_primary(Sample::new(x, 0, 0.0, 0.0, 0))
            .with_secondary(Sample::new(x, 0, 0.0, 0.0, 0))
    }

    fn screening() -> AngularScreening {
        AngularScreening {
            primary_variable: Some("vza".to_string()),
            secondary_variable: Some("zenith".to_string()),
            max_primary_vza: Some(30.0),
            max_secondary_vza: Some(40.0),
            max_angle_delta: Some(8.0),
        }
    }

    #[test]
    fn test_from_rule() {
        let rule = RuleConfig::new("angular")
            .with_param("secondary_variable", "zenith")
            .with_param("max_secondary_vza", 10.0);
        let screening = AngularScreening::from_rule(&rule).unwrap();
        assert_eq!(screening.max_secondary_vza, Some(10.0));
        assert!(screening.primary_variable.is_none());

        let no_limits = RuleConfig::new("angular").with_param("primary_variable", "vza");
        assert!(AngularScreening::from_rule(&no_limits).is_err());

        let delta_one_side = RuleConfig::new("angular")
            .with_param("primary_variable", "vza")
            .with_param("max_angle_delta", 5.0);
        assert!(AngularScreening::from_rule(&delta_one_side).is_err());
    }

    #[test]
    fn test_apply() {
        // primary angle = x, secondary angle = 2x (scaled by 0.5 from raw 4x)
        let primary = VariableReader::new().with_variable("vza", |x, _| x as f64);
        let secondary = VariableReader::new()
            .with_variable("zenith", |x, _| if x == 3 { FILL } else { 4.0 * x as f64 })
            .with_scale(0.5);

        let mut set = MatchupSet::default();
        set.set_sample_sets(vec![pair(1), pair(3), pair(5), pair(8), pair(12), pair(25)]);

        screening().apply(&mut set, &primary, &secondary).unwrap();

        // x=3 fill, x=12 delta 12 > 8, x=25 primary 25 ok but secondary 50 > 40
        let kept: Vec<i32> = set.sample_sets().iter().map(|s| s.primary.x).collect();
        assert_eq!(kept, vec![1, 5, 8]);
    }

    #[test]
    fn test_read_failure_propagates() {
        let primary = VariableReader::new();
        let secondary = VariableReader::new().with_variable("zenith", |_, _| 0.0);
        let mut set = MatchupSet::default();
        set.set_sample_sets(vec![pair(1)]);

        assert!(screening().apply(&mut set, &primary, &secondary).is_err());
    }
}
