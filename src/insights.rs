use crate::rules::{Market, MarketValue, Verdict};

pub const DEFAULT_TOP_K: usize = 2;

/// Shown by callers when no market resolved.
pub const TOO_CLOSE_TO_CALL: &str = "Too close to call: no market stands out for this fixture.";

/// Ranks resolved markets by confidence and renders the top `top_k` as
/// sentences. Equal confidences keep canonical market order.
pub fn rank_insights(
    confidence: &[(Market, f64)],
    predictions: &[(Market, MarketValue)],
    home_team: &str,
    away_team: &str,
    top_k: usize,
) -> Vec<String> {
    let mut ranked = confidence
        .iter()
        .copied()
        .filter(|(_, c)| c.is_finite())
        .filter_map(|(market, c)| {
            let value = predictions
                .iter()
                .find(|(m, _)| *m == market)
                .map(|(_, v)| v)
                .filter(|v| v.is_resolved())?;
            Some((market, c, value))
        })
        .collect::<Vec<_>>();

    ranked.sort_by_key(|(market, _, _)| *market);
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(top_k)
        .map(|(market, _, value)| render(market, value, home_team, away_team))
        .collect()
}

fn render(market: Market, value: &MarketValue, home: &str, away: &str) -> String {
    use MarketValue::{Team, Verdict as V};

    match (market, value) {
        (Market::Btts, V { verdict: Verdict::Yes }) => {
            format!("Both {home} and {away} have been finding the net; expect goals at both ends.")
        }
        (Market::Btts, V { verdict: Verdict::No }) => {
            format!("One of {home} or {away} has struggled for goals; a clean sheet is in play.")
        }
        (Market::OverGoals, V { verdict: Verdict::Yes }) => {
            format!("{home} and {away} games have been high scoring; over 2.5 goals looks likely.")
        }
        (Market::OverGoals, V { verdict: Verdict::No }) => {
            format!("{home} and {away} games have been tight; under 2.5 goals looks likely.")
        }
        (Market::OverCorners, V { verdict: Verdict::Yes }) => {
            "Both sides have been forcing plenty of set pieces; expect over 9.5 corners.".to_string()
        }
        (Market::OverCorners, V { verdict: Verdict::No }) => {
            "Corner counts have been low on both sides; under 9.5 corners is favoured.".to_string()
        }
        (Market::MoreCorners, Team { name, .. }) => {
            format!("{name} has been winning more corners and should edge the corner count.")
        }
        (Market::MoreCards, Team { name, .. }) => {
            format!("{name} has been picking up more bookings; expect them to see more cards.")
        }
        (market, value) => format!("{market}: {value}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_history::Side;

    fn yes() -> MarketValue {
        MarketValue::Verdict {
            verdict: Verdict::Yes,
        }
    }

    #[test]
    fn highest_confidence_first() {
        let predictions = vec![
            (Market::Btts, yes()),
            (
                Market::MoreCorners,
                MarketValue::Team {
                    side: Side::Home,
                    name: "Lions".to_string(),
                },
            ),
        ];
        let confidence = vec![(Market::Btts, 0.1), (Market::MoreCorners, 1.2)];
        let out = rank_insights(&confidence, &predictions, "Lions", "Bears", 2);
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("Lions has been winning more corners"));
        assert!(out[1].starts_with("Both Lions and Bears"));
    }

    #[test]
    fn ties_keep_canonical_order() {
        let predictions = vec![(Market::OverGoals, yes()), (Market::Btts, yes())];
        let confidence = vec![(Market::OverGoals, 0.5), (Market::Btts, 0.5)];
        let out = rank_insights(&confidence, &predictions, "H", "A", 1);
        assert_eq!(out, vec![
            "Both H and A have been finding the net; expect goals at both ends.".to_string()
        ]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let predictions = vec![(Market::Btts, yes()), (Market::OverGoals, yes()), (Market::OverCorners, yes())];
        let confidence = vec![(Market::Btts, 0.3), (Market::OverGoals, 0.3), (Market::OverCorners, 0.9)];
        let first = rank_insights(&confidence, &predictions, "H", "A", 3);
        for _ in 0..10 {
            assert_eq!(rank_insights(&confidence, &predictions, "H", "A", 3), first);
        }
    }

    #[test]
    fn nothing_resolved_gives_empty_list() {
        let out = rank_insights(&[], &[], "H", "A", 2);
        assert!(out.is_empty());
    }

    #[test]
    fn untemplated_value_uses_fallback() {
        let predictions = vec![(
            Market::TotalCorners,
            MarketValue::Numeric {
                value: 9.5,
                decimals: 1,
            },
        )];
        let out = rank_insights(&[(Market::TotalCorners, 1.0)], &predictions, "H", "A", 2);
        assert_eq!(out, vec!["Total Corners: 9.5.".to_string()]);
    }
}
