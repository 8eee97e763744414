use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PredictError;
use crate::match_history::{MatchHistory, Side, TeamLine};
use crate::strength::strength_score;

pub const DEFAULT_WINDOW: usize = 5;

/// Which of a team's matches feed its form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
    #[default]
    All,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Home => write!(f, "home"),
            Venue::Away => write!(f, "away"),
            Venue::All => write!(f, "all"),
        }
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Venue::Home),
            "away" => Ok(Venue::Away),
            "all" | "any" | "either" | "" => Ok(Venue::All),
            other => Err(format!("unknown venue context '{other}'")),
        }
    }
}

/// Recent-form averages for one team, always from that team's perspective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamFormSnapshot {
    pub team: String,
    pub venue: Venue,
    pub window: usize,
    pub matches: usize,
    pub goals_for: f64,
    pub goals_against: f64,
    pub corners_for: Option<f64>,
    pub corners_against: Option<f64>,
    pub cards_for: Option<f64>,
    pub cards_against: Option<f64>,
    pub strength: f64,
}

/// Every record the team qualifies for under `venue`, before windowing.
///
/// `All` yields the home-role records followed by the away-role records, so
/// the tail window is taken over that concatenation rather than over the
/// interleaved table order.
pub fn qualifying_lines(history: &MatchHistory, team: &str, venue: Venue) -> Vec<TeamLine> {
    let by_side = move |side: Side| {
        history
            .records()
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.team(side) == team)
            .map(move |(idx, r)| r.line(idx, side))
    };
    match venue {
        Venue::Home => by_side(Side::Home).collect(),
        Venue::Away => by_side(Side::Away).collect(),
        Venue::All => by_side(Side::Home).chain(by_side(Side::Away)).collect(),
    }
}

/// The last `window` qualifying lines (all of them when fewer exist).
pub fn select_window(
    history: &MatchHistory,
    team: &str,
    venue: Venue,
    window: usize,
) -> Vec<TeamLine> {
    let mut lines = qualifying_lines(history, team, venue);
    let keep = window.max(1);
    if lines.len() > keep {
        lines.drain(..lines.len() - keep);
    }
    lines
}

pub fn aggregate(
    history: &MatchHistory,
    team: &str,
    venue: Venue,
    window: usize,
) -> Result<TeamFormSnapshot, PredictError> {
    let lines = select_window(history, team, venue, window);
    debug!(team, %venue, window, used = lines.len(), "form window selected");

    let (Some(goals_for), Some(goals_against)) = (
        mean(lines.iter().map(|l| Some(l.goals_for))),
        mean(lines.iter().map(|l| Some(l.goals_against))),
    ) else {
        return Err(PredictError::InsufficientData {
            team: team.to_string(),
            venue,
        });
    };

    let columns = history.columns();
    let optional_mean = |available: bool, pick: fn(&TeamLine) -> Option<u16>| {
        if available {
            mean(lines.iter().map(pick))
        } else {
            None
        }
    };

    let team_goals = lines.iter().map(|l| l.goals_for).collect::<Vec<_>>();
    let opponent_goals = lines.iter().map(|l| l.goals_against).collect::<Vec<_>>();

    Ok(TeamFormSnapshot {
        team: team.to_string(),
        venue,
        window: window.max(1),
        matches: lines.len(),
        goals_for,
        goals_against,
        corners_for: optional_mean(columns.corners, |l| l.corners_for),
        corners_against: optional_mean(columns.corners, |l| l.corners_against),
        cards_for: optional_mean(columns.cards, |l| l.cards_for),
        cards_against: optional_mean(columns.cards, |l| l.cards_against),
        strength: strength_score(&team_goals, &opponent_goals),
    })
}

/// Mean of the present values; `None` when nothing is present.
fn mean(values: impl Iterator<Item = Option<u16>>) -> Option<f64> {
    let mut sum = 0.0_f64;
    let mut n = 0usize;
    for v in values.flatten() {
        sum += f64::from(v);
        n += 1;
    }
    if n == 0 { None } else { Some(sum / n as f64) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_history::MatchRecord;

    fn sample_history() -> MatchHistory {
        MatchHistory::new(vec![
            MatchRecord::new("Lions", "Tigers", 2, 0).with_corners(6, 3).with_cards(1, 2),
            MatchRecord::new("Tigers", "Lions", 1, 1).with_corners(4, 5).with_cards(3, 1),
            MatchRecord::new("Lions", "Bears", 0, 1).with_corners(8, 2).with_cards(2, 2),
            MatchRecord::new("Bears", "Lions", 3, 2).with_corners(5, 7).with_cards(0, 4),
        ])
    }

    #[test]
    fn home_context_uses_home_rows_only() {
        let snap = aggregate(&sample_history(), "Lions", Venue::Home, 5).unwrap();
        assert_eq!(snap.matches, 2);
        assert!((snap.goals_for - 1.0).abs() < 1e-12);
        assert!((snap.goals_against - 0.5).abs() < 1e-12);
        assert_eq!(snap.corners_for, Some(7.0));
        assert!((snap.strength - 1.5).abs() < 1e-12);
    }

    #[test]
    fn away_context_orients_for_against() {
        let snap = aggregate(&sample_history(), "Lions", Venue::Away, 5).unwrap();
        assert_eq!(snap.matches, 2);
        assert!((snap.goals_for - 1.5).abs() < 1e-12);
        assert!((snap.goals_against - 2.0).abs() < 1e-12);
        assert_eq!(snap.cards_for, Some(2.5));
        assert_eq!(snap.cards_against, Some(1.5));
    }

    #[test]
    fn all_context_concatenates_home_then_away() {
        let lines = qualifying_lines(&sample_history(), "Lions", Venue::All);
        let order = lines.iter().map(|l| l.record_index).collect::<Vec<_>>();
        assert_eq!(order, vec![0, 2, 1, 3]);

        // The tail of that concatenation is the two away rows.
        let tail = select_window(&sample_history(), "Lions", Venue::All, 2);
        assert!(tail.iter().all(|l| l.side == Side::Away));
    }

    #[test]
    fn window_caps_matches_used() {
        let snap = aggregate(&sample_history(), "Lions", Venue::All, 3).unwrap();
        assert_eq!(snap.matches, 3);
        let snap = aggregate(&sample_history(), "Lions", Venue::All, 10).unwrap();
        assert_eq!(snap.matches, 4);
    }

    #[test]
    fn unknown_team_is_insufficient_data() {
        let err = aggregate(&sample_history(), "Wolves", Venue::Home, 5).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn missing_cards_column_leaves_cards_empty() {
        let history = MatchHistory::new(vec![
            MatchRecord::new("A", "B", 1, 0).with_corners(4, 4),
            MatchRecord::new("B", "A", 0, 0).with_corners(3, 6),
        ]);
        let snap = aggregate(&history, "A", Venue::All, 5).unwrap();
        assert!(snap.cards_for.is_none());
        assert!(snap.cards_against.is_none());
        assert_eq!(snap.corners_for, Some(5.0));
    }

    #[test]
    fn venue_parses_loosely() {
        assert_eq!("Home".parse::<Venue>().unwrap(), Venue::Home);
        assert_eq!("either".parse::<Venue>().unwrap(), Venue::All);
        assert!("neutral".parse::<Venue>().is_err());
    }
}
