use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PredictError;
use crate::match_history::MatchHistory;
use crate::rules::{Prediction, RuleSet};

/// One row of the fixture list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(rename = "HomeTeam")]
    pub home: String,
    #[serde(rename = "AwayTeam")]
    pub away: String,
}

impl Fixture {
    pub fn new(home: &str, away: &str) -> Self {
        Self {
            home: home.to_string(),
            away: away.to_string(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.home.trim(), self.away.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    pub index: usize,
    pub fixture: String,
    /// Resolved markets only, in canonical order.
    pub predictions: Vec<(String, String)>,
    pub insights: String,
    pub insufficient_data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFixture {
    pub index: usize,
    pub fixture: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub rejected: Vec<RejectedFixture>,
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid fixture list json")
}

pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read fixture list {}", path.display()))?;
    parse_fixtures_json(&raw).with_context(|| format!("parse fixture list {}", path.display()))
}

pub fn validate_fixture(home: &str, away: &str) -> Result<(), PredictError> {
    if home.trim() == away.trim() {
        return Err(PredictError::InvalidFixture {
            team: home.trim().to_string(),
        });
    }
    Ok(())
}

/// Validates the pairing, then runs the engine for a single fixture.
pub fn predict_fixture(
    rules: &RuleSet,
    history: &MatchHistory,
    home: &str,
    away: &str,
) -> Result<Prediction, PredictError> {
    validate_fixture(home, away)?;
    Ok(rules.predict_match(history, home.trim(), away.trim()))
}

/// Predicts every valid fixture. Fixtures are independent, so they run on
/// the rayon pool against the shared read-only history; output keeps input
/// order.
pub fn predict_batch(rules: &RuleSet, history: &MatchHistory, fixtures: &[Fixture]) -> BatchReport {
    let outcomes = fixtures
        .par_iter()
        .enumerate()
        .map(|(index, fixture)| {
            predict_fixture(rules, history, &fixture.home, &fixture.away)
                .map(|prediction| batch_row(index, &prediction))
                .map_err(|err| RejectedFixture {
                    index,
                    fixture: fixture.label(),
                    reason: err.to_string(),
                })
        })
        .collect::<Vec<_>>();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(row) => report.rows.push(row),
            Err(rejected) => {
                warn!(fixture = %rejected.fixture, reason = %rejected.reason, "fixture rejected");
                report.rejected.push(rejected);
            }
        }
    }

    info!(
        fixtures = fixtures.len(),
        predicted = report.rows.len(),
        rejected = report.rejected.len(),
        "batch prediction complete"
    );
    report
}

fn batch_row(index: usize, prediction: &Prediction) -> BatchRow {
    BatchRow {
        index,
        fixture: prediction.fixture_label(),
        predictions: prediction.labels(),
        insights: prediction.summary(),
        insufficient_data: prediction.insufficient_data.clone(),
    }
}
