//! Common types and utilities shared across the matchup workspace.

pub mod error;
pub mod interval;
pub mod time;

pub use error::{MatchupError, MatchupResult};
pub use interval::TimeInterval;
pub use time::{
    add_seconds, datetime_from_millis, format_datetime, parse_doy_begin_of_day,
    parse_doy_end_of_day,
};
