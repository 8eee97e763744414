use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use matchday_predictor::batch::{self, predict_batch, predict_fixture};
use matchday_predictor::config::AppConfig;
use matchday_predictor::export::{
    batch_json, export_batch_xlsx, prediction_json, render_prediction_text,
};
use matchday_predictor::fake_history::{FakeLeagueConfig, generate_history};
use matchday_predictor::match_history::load_history;
use matchday_predictor::{MatchHistory, PredictError, RuleSet, Venue};

#[derive(Parser)]
#[command(name = "matchday_predictor")]
#[command(about = "Stat-based football fixture predictions from a match history table")]
#[command(version)]
struct Cli {
    /// Match history (.json, or .sqlite/.db with a `matches` table)
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// Most recent matches per team feeding the form averages
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Number of insights to show per fixture
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// JSON rule set overriding the standard thresholds
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Venue context for the home side (home, away, all)
    #[arg(long, global = true)]
    home_venue: Option<Venue>,

    /// Venue context for the away side (home, away, all)
    #[arg(long, global = true)]
    away_venue: Option<Venue>,

    /// Tracing filter, e.g. "debug" or "matchday_predictor=trace"
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every team in the history
    Teams,

    /// Predict a single fixture
    Predict {
        #[arg(long)]
        home: String,

        #[arg(long)]
        away: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Predict every fixture of a list
    Batch {
        /// JSON array of {"HomeTeam": .., "AwayTeam": ..}
        #[arg(long)]
        fixtures: PathBuf,

        /// Write a workbook with Predictions, Rejected and Summary sheets
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic league history to try the other commands on
    Demo {
        #[arg(long, default_value = "8")]
        teams: usize,

        #[arg(long, default_value = "2")]
        rounds: usize,

        #[arg(long, default_value = "7")]
        seed: u64,

        /// Leave the corners columns out
        #[arg(long)]
        no_corners: bool,

        /// Leave the cards columns out
        #[arg(long)]
        no_cards: bool,

        #[arg(long, default_value = "demo_history.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let filter = cli.log.clone().unwrap_or_else(|| config.log_filter.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let rules = resolve_rules(&cli, config.rules)?;

    match cli.command {
        Commands::Teams => {
            let history = require_history(cli.history.as_deref())?;
            for team in history.teams() {
                println!("{team}");
            }
        }
        Commands::Predict { home, away, json } => {
            let history = require_history(cli.history.as_deref())?;
            let prediction = match predict_fixture(&rules, &history, &home, &away) {
                Ok(prediction) => prediction,
                Err(PredictError::InvalidFixture { .. }) => {
                    bail!("Please choose two different teams.")
                }
                Err(err) => return Err(err.into()),
            };
            if json {
                let out = serde_json::to_string_pretty(&prediction_json(&prediction))
                    .context("serialize prediction")?;
                println!("{out}");
            } else {
                print!("{}", render_prediction_text(&prediction));
            }
        }
        Commands::Batch {
            fixtures,
            out,
            json,
        } => {
            let history = require_history(cli.history.as_deref())?;
            let fixtures = batch::load_fixtures(&fixtures)?;
            let report = predict_batch(&rules, &history, &fixtures);

            if let Some(path) = out.as_deref() {
                let written = export_batch_xlsx(path, &report, &rules)?;
                info!(
                    path = %path.display(),
                    predicted = written.predicted,
                    rejected = written.rejected,
                    columns = written.columns,
                    "workbook written"
                );
            }

            if json {
                println!("{}", batch_json(&report)?);
            } else {
                for row in &report.rows {
                    println!("{}", row.fixture);
                    for (market, value) in &row.predictions {
                        println!("  {market}: {value}");
                    }
                    println!("  {}", row.insights);
                }
                for rejected in &report.rejected {
                    println!("row {} skipped ({}): {}", rejected.index + 1, rejected.fixture, rejected.reason);
                }
            }
        }
        Commands::Demo {
            teams,
            rounds,
            seed,
            no_corners,
            no_cards,
            out,
        } => {
            let history = generate_history(FakeLeagueConfig {
                teams,
                rounds,
                seed,
                with_corners: !no_corners,
                with_cards: !no_cards,
            });
            let raw = serde_json::to_string_pretty(history.records())
                .context("serialize demo history")?;
            fs::write(&out, raw).with_context(|| format!("write {}", out.display()))?;
            info!(path = %out.display(), matches = history.len(), "demo history written");
            println!("Wrote {} matches for {} teams to {}", history.len(), history.teams().len(), out.display());
        }
    }

    Ok(())
}

/// CLI flags win over the environment.
fn resolve_rules(cli: &Cli, from_env: RuleSet) -> Result<RuleSet> {
    let mut rules = match cli.rules.as_deref() {
        Some(path) => matchday_predictor::config::load_rules_file(path)?,
        None => from_env,
    };
    if let Some(window) = cli.window {
        rules.window = window.max(1);
    }
    if let Some(top_k) = cli.top_k {
        rules.top_k = top_k;
    }
    if let Some(venue) = cli.home_venue {
        rules.home_venue = venue;
    }
    if let Some(venue) = cli.away_venue {
        rules.away_venue = venue;
    }
    rules.validate()?;
    Ok(rules)
}

fn require_history(path: Option<&Path>) -> Result<MatchHistory> {
    let Some(path) = path else {
        bail!("no match history given; pass --history <file>");
    };
    let history = load_history(path)?;
    if history.is_empty() {
        bail!("match history {} has no matches", path.display());
    }
    info!(
        path = %path.display(),
        matches = history.len(),
        teams = history.teams().len(),
        "match history loaded"
    );
    Ok(history)
}
