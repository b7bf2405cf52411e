//! Screenings: sample-data checks run after the conditions.
//!
//! Unlike conditions, screenings read sensor variables through the open
//! readers, so they run on the already reduced sample sets.

mod angular;
mod pixel_flag;

pub use angular::AngularScreening;
pub use pixel_flag::{FlagCheck, PixelFlagScreening};

use matchup_common::{MatchupError, MatchupResult};
use tracing::debug;

use crate::config::{RuleConfig, UseCaseConfig};
use crate::reader::{Reader, Window};
use crate::sample::MatchupSet;

pub trait Screening {
    fn apply(
        &self,
        matchup_set: &mut MatchupSet,
        primary: &dyn Reader,
        secondary: &dyn Reader,
    ) -> MatchupResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnyScreening {
    Angular(AngularScreening),
    PixelFlag(PixelFlagScreening),
}

impl Screening for AnyScreening {
    fn apply(
        &self,
        matchup_set: &mut MatchupSet,
        primary: &dyn Reader,
        secondary: &dyn Reader,
    ) -> MatchupResult<()> {
        match self {
            AnyScreening::Angular(s) => s.apply(matchup_set, primary, secondary),
            AnyScreening::PixelFlag(s) => s.apply(matchup_set, primary, secondary),
        }
    }
}

impl AnyScreening {
    pub fn name(&self) -> &'static str {
        match self {
            AnyScreening::Angular(_) => AngularScreening::NAME,
            AnyScreening::PixelFlag(_) => PixelFlagScreening::NAME,
        }
    }
}

type ScreeningConstructor = fn(&RuleConfig) -> MatchupResult<AnyScreening>;

const REGISTRY: &[(&str, ScreeningConstructor)] = &[
    (AngularScreening::NAME, angular),
    (PixelFlagScreening::NAME, pixel_flag),
];

fn angular(rule: &RuleConfig) -> MatchupResult<AnyScreening> {
    AngularScreening::from_rule(rule).map(AnyScreening::Angular)
}

fn pixel_flag(rule: &RuleConfig) -> MatchupResult<AnyScreening> {
    PixelFlagScreening::from_rule(rule).map(AnyScreening::PixelFlag)
}

pub fn screening_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

pub fn create_screening(rule: &RuleConfig) -> MatchupResult<AnyScreening> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == rule.name)
        .map(|(_, constructor)| constructor(rule))
        .unwrap_or_else(|| Err(MatchupError::UnknownRule(format!("screening '{}'", rule.name))))
}

/// The ordered screening pipeline of a use case.
#[derive(Debug, Clone, Default)]
pub struct ScreeningEngine {
    screenings: Vec<AnyScreening>,
}

impl ScreeningEngine {
    pub fn configure(use_case: &UseCaseConfig) -> MatchupResult<Self> {
        let screenings = use_case
            .screenings
            .iter()
            .map(create_screening)
            .collect::<MatchupResult<Vec<_>>>()?;
        Ok(Self { screenings })
    }

    pub fn from_screenings(screenings: Vec<AnyScreening>) -> Self {
        Self { screenings }
    }

    pub fn screenings(&self) -> &[AnyScreening] {
        &self.screenings
    }

    pub fn is_empty(&self) -> bool {
        self.screenings.is_empty()
    }

    pub fn apply(
        &self,
        matchup_set: &mut MatchupSet,
        primary: &dyn Reader,
        secondary: &dyn Reader,
    ) -> MatchupResult<()> {
        for screening in &self.screenings {
            let before = matchup_set.num_observations();
            screening.apply(matchup_set, primary, secondary)?;
            debug!(
                screening = screening.name(),
                before,
                after = matchup_set.num_observations(),
                "Applied screening"
            );
            if matchup_set.is_empty() {
                break;
            }
        }
        Ok(())
    }
}

/// Value of `variable` at the pixel, `None` for fill values.
pub(crate) fn center_value(
    reader: &dyn Reader,
    x: i32,
    y: i32,
    variable: &str,
    scaled: bool,
) -> MatchupResult<Option<f64>> {
    let window = if scaled {
        reader.read_scaled(x, y, Window::center(), variable)?
    } else {
        reader.read_raw(x, y, Window::center(), variable)?
    };
    let value = window.center().ok_or_else(|| {
        MatchupError::Screening(format!("empty window for '{}' at ({}, {})", variable, x, y))
    })?;
    Ok((!window.is_fill(value)).then_some(value))
}
