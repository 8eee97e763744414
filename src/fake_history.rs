use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::match_history::{MatchHistory, MatchRecord};

#[derive(Debug, Clone, Copy)]
pub struct FakeLeagueConfig {
    pub teams: usize,
    /// Each round is a full double round robin.
    pub rounds: usize,
    pub seed: u64,
    pub with_corners: bool,
    pub with_cards: bool,
}

impl Default for FakeLeagueConfig {
    fn default() -> Self {
        Self {
            teams: 8,
            rounds: 1,
            seed: 7,
            with_corners: true,
            with_cards: true,
        }
    }
}

const TEAM_NAMES: &[&str] = &[
    "Northbridge", "Eastvale", "Kingsport", "Redmoor", "Ashford", "Millbrook", "Stonehaven",
    "Westfield", "Harrowgate", "Brightwater", "Oakmere", "Fairhaven", "Lowmarsh", "Ironside",
    "Silverdale", "Thornbury",
];

/// Deterministic synthetic league for demos and benches. The same config
/// always yields the same table.
pub fn generate_history(cfg: FakeLeagueConfig) -> MatchHistory {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let names = team_names(cfg.teams.max(2));
    let attack = names
        .iter()
        .map(|_| rng.gen_range(0.8..1.9))
        .collect::<Vec<f64>>();
    let defence = names
        .iter()
        .map(|_| rng.gen_range(0.7..1.4))
        .collect::<Vec<f64>>();

    let mut records = Vec::new();
    for _ in 0..cfg.rounds.max(1) {
        for home in 0..names.len() {
            for away in 0..names.len() {
                if home == away {
                    continue;
                }
                let home_goals = poisson(&mut rng, 0.25 + attack[home] * defence[away] * 0.9);
                let away_goals = poisson(&mut rng, attack[away] * defence[home] * 0.8);
                let mut record = MatchRecord::new(&names[home], &names[away], home_goals, away_goals);
                if cfg.with_corners {
                    record = record.with_corners(
                        poisson(&mut rng, 3.0 + 2.0 * attack[home]),
                        poisson(&mut rng, 2.5 + 2.0 * attack[away]),
                    );
                }
                if cfg.with_cards {
                    record = record.with_cards(poisson(&mut rng, 1.7), poisson(&mut rng, 2.0));
                }
                records.push(record);
            }
        }
    }
    MatchHistory::new(records)
}

fn team_names(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match TEAM_NAMES.get(i) {
            Some(name) => (*name).to_string(),
            None => format!("Team {:02}", i + 1),
        })
        .collect()
}

// Knuth's method; fine for the small means used here.
fn poisson(rng: &mut StdRng, lambda: f64) -> u16 {
    let limit = (-lambda.max(0.0)).exp();
    let mut k = 0u16;
    let mut p = 1.0_f64;
    loop {
        p *= rng.r#gen::<f64>();
        if p <= limit || k == u16::MAX {
            return k;
        }
        k += 1;
    }
}
