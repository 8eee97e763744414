use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::rules::RuleSet;

pub const ENV_WINDOW: &str = "PREDICTOR_WINDOW_SIZE";
pub const ENV_TOP_K: &str = "PREDICTOR_TOP_K";
pub const ENV_RULES: &str = "PREDICTOR_RULES";
pub const ENV_LOG: &str = "PREDICTOR_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rules: RuleSet,
    pub rules_path: Option<PathBuf>,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rules_path = lookup(ENV_RULES)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let mut rules = match rules_path.as_deref() {
            Some(path) => load_rules_file(path)?,
            None => RuleSet::standard(),
        };

        if let Some(window) = lookup(ENV_WINDOW).and_then(|val| val.trim().parse::<usize>().ok()) {
            rules.window = window.max(1);
        }
        if let Some(top_k) = lookup(ENV_TOP_K).and_then(|val| val.trim().parse::<usize>().ok()) {
            rules.top_k = top_k;
        }

        let log_filter = lookup(ENV_LOG)
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            rules,
            rules_path,
            log_filter,
        })
    }
}

/// Reads a JSON rule set. Fields left out keep their standard values.
pub fn load_rules_file(path: &Path) -> Result<RuleSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read rules file {}", path.display()))?;
    parse_rules_json(&raw).with_context(|| format!("parse rules file {}", path.display()))
}

pub fn parse_rules_json(raw: &str) -> Result<RuleSet> {
    let rules: RuleSet = serde_json::from_str(raw).context("invalid rules json")?;
    rules.validate()?;
    Ok(rules)
}
