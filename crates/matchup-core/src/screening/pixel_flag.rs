use matchup_common::{MatchupError, MatchupResult};
use serde::Deserialize;

use super::{center_value, Screening};
use crate::config::RuleConfig;
use crate::reader::Reader;
use crate::sample::{MatchupSet, Sample, SampleSet};

/// A flag variable and the bits that disqualify a pixel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagCheck {
    pub variable: String,
    pub mask: u64,
}

impl FlagCheck {
    /// True when the pixel is usable: readable, not fill, no masked bit set.
    fn passes(&self, reader: &dyn Reader, sample: &Sample) -> MatchupResult<bool> {
        let value = center_value(reader, sample.x, sample.y, &self.variable, false)?;
        Ok(match value {
            Some(flags) => (flags as i64 as u64) & self.mask == 0,
            None => false,
        })
    }
}

/// Rejects pairs whose raw flag value has any masked bit set on either
/// configured side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PixelFlagScreening {
    #[serde(default)]
    pub primary: Option<FlagCheck>,
    #[serde(default)]
    pub secondary: Option<FlagCheck>,
}

impl PixelFlagScreening {
    pub const NAME: &'static str = "pixel-flag";

    pub fn from_rule(rule: &RuleConfig) -> MatchupResult<Self> {
        let screening: Self = rule.parse_params()?;
        if screening.primary.is_none() && screening.secondary.is_none() {
            return Err(MatchupError::invalid_parameter(
                Self::NAME,
                "needs a primary or secondary flag check",
            ));
        }
        Ok(screening)
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
        if let Some(check) = &self.primary {
            if !check.passes(primary, &set.primary)? {
                return Ok(false);
            }
        }
        if let Some(check) = &self.secondary {
            if !check.passes(secondary, &secondary_sample)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Screening for PixelFlagScreening {
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
    use crate::test_reader::{VariableReader, FILL};

    fn pair(x: i32, y: i32) -> SampleSet {
        SampleSet::with_primary(Sample::new(x, y, 0.0, 0.0, 0))
            .with_secondary(Sample::new(y, x, 0.0, 0.0, 0))
    }

    #[test]
    fn test_from_rule() {
        let rule = RuleConfig::new("pixel-flag").with_param(
            "primary",
            serde_yaml::from_str::<serde_yaml::Value>("{variable: l1b_flags, mask: 6}").unwrap(),
        );
        let screening = PixelFlagScreening::from_rule(&rule).unwrap();
        assert_eq!(
            screening.primary,
            Some(FlagCheck {
                variable: "l1b_flags".to_string(),
                mask: 6
            })
        );
        assert!(screening.secondary.is_none());

        assert!(PixelFlagScreening::from_rule(&RuleConfig::new("pixel-flag")).is_err());
    }

    #[test]
    fn test_apply() {
        // primary flags = x, secondary flags = x of the secondary sample (the primary's y)
        let primary = VariableReader::new().with_variable("flags", |x, _| x as f64);
        let secondary = VariableReader::new()
            .with_variable("quality", |x, _| if x == 7 { FILL } else { x as f64 });

        let screening = PixelFlagScreening {
            primary: Some(FlagCheck {
                variable: "flags".to_string(),
                mask: 0b100,
            }),
            secondary: Some(FlagCheck {
                variable: "quality".to_string(),
                mask: 0b1,
            }),
        };

        let mut set = MatchupSet::default();
        set.set_sample_sets(vec![pair(0, 0), pair(4, 0), pair(3, 2), pair(1, 1), pair(2, 7), pair(8, 6)]);
        screening.apply(&mut set, &primary, &secondary).unwrap();

        let kept: Vec<(i32, i32)> = set
            .sample_sets()
            .iter()
            .map(|s| (s.primary.x, s.primary.y))
            .collect();
        assert_eq!(kept, vec![(0, 0), (3, 2), (8, 6)]);
    }
}
