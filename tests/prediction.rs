use std::fs;
use std::path::PathBuf;

use matchday_predictor::match_history::{Side, parse_history_json};
use matchday_predictor::rules::{Market, MarketValue, OmitReason, RuleSet, Verdict};
use matchday_predictor::team_form::{Venue, aggregate, qualifying_lines, select_window};
use matchday_predictor::{MatchHistory, PredictError};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn basic_history() -> MatchHistory {
    parse_history_json(&read_fixture("history_basic.json")).expect("fixture should parse")
}

fn yes() -> MarketValue {
    MarketValue::Verdict {
        verdict: Verdict::Yes,
    }
}

fn no() -> MarketValue {
    MarketValue::Verdict {
        verdict: Verdict::No,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn home_form_uses_last_five_home_matches() {
    let history = basic_history();
    let lions = aggregate(&history, "Lions", Venue::Home, 5).unwrap();
    assert_eq!(lions.matches, 5);
    assert!(close(lions.goals_for, 1.0));
    assert!(close(lions.goals_against, 1.0));
    assert!(close(lions.corners_for.unwrap(), 6.0));
    assert!(close(lions.corners_against.unwrap(), 4.2));
    assert!(close(lions.strength, 1.0));
}

#[test]
fn window_is_capped_by_available_matches() {
    let history = basic_history();
    let wide = aggregate(&history, "Lions", Venue::Home, 10).unwrap();
    assert_eq!(wide.matches, 6);
    assert!(close(wide.goals_for, 8.0 / 6.0));

    let tigers_home = aggregate(&history, "Tigers", Venue::Home, 5).unwrap();
    assert_eq!(tigers_home.matches, 1);
    assert!(close(tigers_home.strength, 3.0));
}

#[test]
fn venue_contexts_partition_the_rows() {
    let history = basic_history();
    for team in history.teams() {
        let home = qualifying_lines(&history, &team, Venue::Home);
        let away = qualifying_lines(&history, &team, Venue::Away);
        let all = qualifying_lines(&history, &team, Venue::All);
        assert!(home.iter().all(|l| l.side == Side::Home));
        assert!(away.iter().all(|l| l.side == Side::Away));
        assert_eq!(all.len(), home.len() + away.len());
        assert_eq!(&all[..home.len()], &home[..]);
        assert_eq!(&all[home.len()..], &away[..]);
    }
}

#[test]
fn all_venue_windows_over_home_then_away() {
    let history = basic_history();
    let lines = select_window(&history, "Lions", Venue::All, 3);
    let indices = lines.iter().map(|l| l.record_index).collect::<Vec<_>>();
    assert_eq!(indices, vec![7, 9, 11]);
}

#[test]
fn standard_rules_on_sample_fixture() {
    let history = basic_history();
    let p = RuleSet::standard().predict_match(&history, "Lions", "Tigers");

    assert_eq!(p.get(Market::Btts), Some(&yes()));
    assert_eq!(p.get(Market::OverGoals), Some(&no()));
    assert_eq!(p.get(Market::OverCorners), Some(&yes()));
    assert_eq!(
        p.get(Market::MoreCorners),
        Some(&MarketValue::Team {
            side: Side::Home,
            name: "Lions".to_string()
        })
    );
    assert_eq!(
        p.get(Market::MoreCards),
        Some(&MarketValue::Team {
            side: Side::Away,
            name: "Tigers".to_string()
        })
    );
    assert!(p.insufficient_data.is_empty());

    let labels = p.labels();
    assert!(labels.contains(&("Total Corners".to_string(), "9.7".to_string())));
    assert!(labels.contains(&("Total Cards".to_string(), "3.6".to_string())));
    assert!(labels.contains(&("Home Strength Score".to_string(), "1.00".to_string())));
    assert!(labels.contains(&("Away Strength Score".to_string(), "1.00".to_string())));
}

#[test]
fn insights_follow_confidence() {
    let history = basic_history();
    let p = RuleSet::standard().predict_match(&history, "Lions", "Tigers");
    assert_eq!(p.insights.len(), 2);
    assert!(p.insights[0].starts_with("Tigers has been picking up more bookings"));
    assert!(p.insights[1].contains("over 9.5 corners"));

    let again = RuleSet::standard().predict_match(&history, "Lions", "Tigers");
    assert_eq!(again.insights, p.insights);
}

#[test]
fn btts_yes_when_both_average_one_goal() {
    let history = basic_history();
    let p = RuleSet::standard().predict_match(&history, "Lions", "Tigers");
    assert_eq!(p.get(Market::Btts), Some(&yes()));
    assert!(close(p.confidence_of(Market::Btts).unwrap(), 0.3));
}

#[test]
fn two_goal_fixture_is_under() {
    let history = basic_history();
    let p = RuleSet::standard().predict_match(&history, "Lions", "Tigers");
    assert_eq!(p.get(Market::OverGoals), Some(&no()));
    assert!(close(p.confidence_of(Market::OverGoals).unwrap(), 0.5));
}

#[test]
fn unknown_team_is_insufficient_data() {
    let history = basic_history();
    let err = aggregate(&history, "Ghosts", Venue::Away, 5).unwrap_err();
    assert!(err.is_insufficient_data());
    assert_eq!(
        err,
        PredictError::InsufficientData {
            team: "Ghosts".to_string(),
            venue: Venue::Away
        }
    );

    let p = RuleSet::standard().predict_match(&history, "Lions", "Ghosts");
    assert_eq!(p.insufficient_data, vec!["Ghosts".to_string()]);
    let insufficient = MarketValue::Omitted {
        reason: OmitReason::InsufficientData,
    };
    assert_eq!(p.get(Market::Btts), Some(&insufficient));
    assert_eq!(p.get(Market::TotalCorners), Some(&insufficient));
    assert_eq!(p.get(Market::AwayStrength), Some(&insufficient));
    assert_eq!(
        p.get(Market::HomeStrength).and_then(MarketValue::as_number),
        Some(1.0)
    );
}

#[test]
fn venue_overrides_change_the_form() {
    let history = basic_history();
    let mut rules = RuleSet::standard();
    rules.home_venue = Venue::All;
    rules.away_venue = Venue::All;
    rules.window = 10;
    let p = rules.predict_match(&history, "Lions", "Tigers");
    let home = p.get(Market::HomeStrength).and_then(MarketValue::as_number).unwrap();
    let away = p.get(Market::AwayStrength).and_then(MarketValue::as_number).unwrap();
    // Lions: one win, one loss, five draws over seven games.
    assert!(close(home, 1.14));
    // Tigers: their home win plus five away draws.
    assert!(close(away, 1.33));
}
