//! Stat-based football fixture predictions.
//!
//! A played-match table goes in ([`match_history`]), each side's recent form
//! is averaged over a window ([`team_form`], [`strength`]), fixed thresholds
//! turn the averages into market calls ([`rules`]), and the most decisive
//! calls are written up as short commentary ([`insights`]). [`batch`] runs a
//! fixture list; [`export`] renders results.

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod fake_history;
pub mod insights;
pub mod match_history;
pub mod rules;
pub mod strength;
pub mod team_form;

pub use error::PredictError;
pub use match_history::{MatchHistory, MatchRecord, Side, StatColumns};
pub use rules::{Market, MarketValue, OmitReason, Prediction, RuleSet, Verdict};
pub use team_form::{TeamFormSnapshot, Venue};
