use thiserror::Error;

use crate::team_form::Venue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("insufficient data: {team} has no {venue} matches in the history")]
    InsufficientData { team: String, venue: Venue },

    #[error("invalid fixture: {team} cannot play itself")]
    InvalidFixture { team: String },

    #[error("required column missing from match history: {0}")]
    MissingColumn(&'static str),

    #[error("failed to load table: {0}")]
    Load(String),

    #[error("invalid rule set: {0}")]
    InvalidRules(String),
}

impl PredictError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PredictError::InsufficientData { .. })
    }
}
