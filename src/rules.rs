use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PredictError;
use crate::insights::{DEFAULT_TOP_K, TOO_CLOSE_TO_CALL, rank_insights};
use crate::match_history::{MatchHistory, Side};
use crate::team_form::{DEFAULT_WINDOW, TeamFormSnapshot, Venue, aggregate};

/// Every market the engine knows, in canonical order. Ties in insight
/// ranking fall back to this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "BTTS")]
    Btts,
    #[serde(rename = "Over 2.5 Goals")]
    OverGoals,
    #[serde(rename = "Over 9.5 Corners")]
    OverCorners,
    #[serde(rename = "More Corners")]
    MoreCorners,
    #[serde(rename = "More Cards")]
    MoreCards,
    #[serde(rename = "Total Corners")]
    TotalCorners,
    #[serde(rename = "Total Cards")]
    TotalCards,
    #[serde(rename = "Home Strength Score")]
    HomeStrength,
    #[serde(rename = "Away Strength Score")]
    AwayStrength,
}

impl Market {
    pub const ALL: [Market; 9] = [
        Market::Btts,
        Market::OverGoals,
        Market::OverCorners,
        Market::MoreCorners,
        Market::MoreCards,
        Market::TotalCorners,
        Market::TotalCards,
        Market::HomeStrength,
        Market::AwayStrength,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Market::Btts => "BTTS",
            Market::OverGoals => "Over 2.5 Goals",
            Market::OverCorners => "Over 9.5 Corners",
            Market::MoreCorners => "More Corners",
            Market::MoreCards => "More Cards",
            Market::TotalCorners => "Total Corners",
            Market::TotalCards => "Total Cards",
            Market::HomeStrength => "Home Strength Score",
            Market::AwayStrength => "Away Strength Score",
        }
    }

    pub fn from_label(raw: &str) -> Option<Market> {
        let key = raw.trim();
        Market::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Yes,
    No,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => write!(f, "Yes"),
            Verdict::No => write!(f, "No"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OmitReason {
    /// Signal fell between the No and Yes thresholds.
    Unclear,
    InsufficientData,
    MissingColumn,
    Disabled,
}

impl fmt::Display for OmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmitReason::Unclear => write!(f, "Unclear"),
            OmitReason::InsufficientData => write!(f, "Insufficient data"),
            OmitReason::MissingColumn => write!(f, "Not available"),
            OmitReason::Disabled => write!(f, "Disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketValue {
    Verdict { verdict: Verdict },
    Team { side: Side, name: String },
    Numeric { value: f64, decimals: u8 },
    Omitted { reason: OmitReason },
}

impl MarketValue {
    fn numeric(value: f64, decimals: u8) -> Self {
        let scale = 10f64.powi(i32::from(decimals));
        MarketValue::Numeric {
            value: (value * scale).round() / scale,
            decimals,
        }
    }

    fn omitted(reason: OmitReason) -> Self {
        MarketValue::Omitted { reason }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, MarketValue::Omitted { .. })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MarketValue::Numeric { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for MarketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketValue::Verdict { verdict } => write!(f, "{verdict}"),
            MarketValue::Team { name, .. } => f.write_str(name),
            MarketValue::Numeric { value, decimals } => {
                write!(f, "{:.*}", usize::from(*decimals), value)
            }
            MarketValue::Omitted { reason } => write!(f, "{reason}"),
        }
    }
}

/// Yes/No thresholds for one over/under style market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub yes: f64,
    pub no: f64,
}

impl Band {
    pub const fn new(yes: f64, no: f64) -> Self {
        Self { yes, no }
    }

    pub fn judge(&self, signal: f64) -> Option<Verdict> {
        if signal >= self.yes {
            Some(Verdict::Yes)
        } else if signal <= self.no {
            Some(Verdict::No)
        } else {
            None
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.yes + self.no) / 2.0
    }

    pub fn confidence(&self, signal: f64) -> f64 {
        (signal - self.midpoint()).abs()
    }
}

/// Thresholds and market selection for the engine. Variants of the rule set
/// are configurations of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub btts: Band,
    pub over_goals: Band,
    pub over_corners: Band,
    pub corner_margin: f64,
    pub card_margin: f64,
    pub markets: Vec<Market>,
    pub home_venue: Venue,
    pub away_venue: Venue,
    pub window: usize,
    pub top_k: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Home and away form feeding one prediction. `None` means the side had no
/// qualifying matches.
#[derive(Debug, Clone, Copy)]
struct FixtureForm<'a> {
    home: Option<&'a TeamFormSnapshot>,
    away: Option<&'a TeamFormSnapshot>,
    home_team: &'a str,
    away_team: &'a str,
}

impl RuleSet {
    pub fn standard() -> Self {
        Self {
            btts: Band::new(0.8, 0.6),
            over_goals: Band::new(2.8, 2.2),
            over_corners: Band::new(9.5, 8.0),
            corner_margin: 0.5,
            card_margin: 0.5,
            markets: Market::ALL.to_vec(),
            home_venue: Venue::Home,
            away_venue: Venue::Away,
            window: DEFAULT_WINDOW,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        for (name, band) in [
            ("btts", self.btts),
            ("over_goals", self.over_goals),
            ("over_corners", self.over_corners),
        ] {
            if !(band.yes.is_finite() && band.no.is_finite()) || band.no > band.yes {
                return Err(PredictError::InvalidRules(format!(
                    "{name}: no threshold {} must not exceed yes threshold {}",
                    band.no, band.yes
                )));
            }
        }
        if !(self.corner_margin >= 0.0 && self.card_margin >= 0.0) {
            return Err(PredictError::InvalidRules(
                "dominance margins must be non-negative".to_string(),
            ));
        }
        if self.window == 0 {
            return Err(PredictError::InvalidRules(
                "window must be at least one match".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_enabled(&self, market: Market) -> bool {
        self.markets.contains(&market)
    }

    /// Aggregates both sides from `history` and predicts. A side without
    /// qualifying matches is reported in `insufficient_data` and the markets
    /// reading it are omitted.
    pub fn predict_match(&self, history: &MatchHistory, home_team: &str, away_team: &str) -> Prediction {
        let form = |team: &str, venue: Venue| match aggregate(history, team, venue, self.window) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(%err, "skipping markets for team without form");
                None
            }
        };
        let home = form(home_team, self.home_venue);
        let away = form(away_team, self.away_venue);
        self.predict(home.as_ref(), away.as_ref(), home_team, away_team)
    }

    pub fn predict(
        &self,
        home: Option<&TeamFormSnapshot>,
        away: Option<&TeamFormSnapshot>,
        home_team: &str,
        away_team: &str,
    ) -> Prediction {
        let fixture = FixtureForm {
            home,
            away,
            home_team,
            away_team,
        };

        let mut markets = Vec::with_capacity(Market::ALL.len());
        let mut confidence = Vec::new();
        for market in Market::ALL {
            let (value, conf) = if self.is_enabled(market) {
                self.resolve(market, fixture)
            } else {
                (MarketValue::omitted(OmitReason::Disabled), None)
            };
            if let Some(c) = conf {
                confidence.push((market, c));
            }
            markets.push((market, value));
        }

        let insights = rank_insights(&confidence, &markets, home_team, away_team, self.top_k);

        let mut insufficient_data = Vec::new();
        if home.is_none() {
            insufficient_data.push(home_team.to_string());
        }
        if away.is_none() {
            insufficient_data.push(away_team.to_string());
        }

        Prediction {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            markets,
            confidence,
            insights,
            insufficient_data,
        }
    }

    fn resolve(&self, market: Market, fx: FixtureForm<'_>) -> (MarketValue, Option<f64>) {
        use MarketValue as V;

        let missing = (V::omitted(OmitReason::MissingColumn), None);
        match (market, fx.home.zip(fx.away)) {
            (Market::HomeStrength, _) => strength_value(fx.home),
            (Market::AwayStrength, _) => strength_value(fx.away),
            (_, None) => (V::omitted(OmitReason::InsufficientData), None),
            (Market::Btts, Some((h, a))) => {
                let signal = h.goals_for.min(a.goals_for);
                judge_band(self.btts, signal)
            }
            (Market::OverGoals, Some((h, a))) => {
                let signal = (h.goals_for + h.goals_against + a.goals_for + a.goals_against) / 2.0;
                judge_band(self.over_goals, signal)
            }
            (Market::OverCorners, Some((h, a))) => {
                match fixture_total(h.corners_for, h.corners_against, a.corners_for, a.corners_against) {
                    Some(signal) => judge_band(self.over_corners, signal),
                    None => missing,
                }
            }
            (Market::MoreCorners, Some((h, a))) => match (h.corners_for, a.corners_for) {
                (Some(hc), Some(ac)) => dominance(hc, ac, self.corner_margin, fx),
                _ => missing,
            },
            (Market::MoreCards, Some((h, a))) => match (h.cards_for, a.cards_for) {
                (Some(hk), Some(ak)) => dominance(hk, ak, self.card_margin, fx),
                _ => missing,
            },
            (Market::TotalCorners, Some((h, a))) => {
                match fixture_total(h.corners_for, h.corners_against, a.corners_for, a.corners_against) {
                    Some(total) => (V::numeric(total, 1), None),
                    None => missing,
                }
            }
            (Market::TotalCards, Some((h, a))) => {
                match fixture_total(h.cards_for, h.cards_against, a.cards_for, a.cards_against) {
                    Some(total) => (V::numeric(total, 1), None),
                    None => missing,
                }
            }
        }
    }
}

fn strength_value(snapshot: Option<&TeamFormSnapshot>) -> (MarketValue, Option<f64>) {
    match snapshot {
        Some(s) => (MarketValue::numeric(s.strength, 2), None),
        None => (MarketValue::omitted(OmitReason::InsufficientData), None),
    }
}

fn judge_band(band: Band, signal: f64) -> (MarketValue, Option<f64>) {
    match band.judge(signal) {
        Some(verdict) => (MarketValue::Verdict { verdict }, Some(band.confidence(signal))),
        None => (MarketValue::omitted(OmitReason::Unclear), None),
    }
}

/// Side with the clearly higher "for" average, when the gap beats `margin`.
fn dominance(home: f64, away: f64, margin: f64, fx: FixtureForm<'_>) -> (MarketValue, Option<f64>) {
    let diff = (home - away).abs();
    if diff <= margin {
        return (MarketValue::omitted(OmitReason::Unclear), None);
    }
    let (side, name) = if home > away {
        (Side::Home, fx.home_team)
    } else {
        (Side::Away, fx.away_team)
    };
    (
        MarketValue::Team {
            side,
            name: name.to_string(),
        },
        Some(diff),
    )
}

/// Expected match total: the mean of each side's for+against average.
fn fixture_total(
    home_for: Option<f64>,
    home_against: Option<f64>,
    away_for: Option<f64>,
    away_against: Option<f64>,
) -> Option<f64> {
    Some((home_for? + home_against? + away_for? + away_against?) / 2.0)
}

/// Engine output for one fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub home_team: String,
    pub away_team: String,
    /// One entry per known market, canonical order, omitted ones included.
    pub markets: Vec<(Market, MarketValue)>,
    /// Confidence for each resolved categorical market.
    pub confidence: Vec<(Market, f64)>,
    pub insights: Vec<String>,
    pub insufficient_data: Vec<String>,
}

impl Prediction {
    pub fn fixture_label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }

    pub fn get(&self, market: Market) -> Option<&MarketValue> {
        self.markets
            .iter()
            .find(|(m, _)| *m == market)
            .map(|(_, v)| v)
    }

    pub fn confidence_of(&self, market: Market) -> Option<f64> {
        self.confidence
            .iter()
            .find(|(m, _)| *m == market)
            .map(|(_, c)| *c)
    }

    pub fn resolved(&self) -> impl Iterator<Item = (Market, &MarketValue)> {
        self.markets
            .iter()
            .filter(|(_, v)| v.is_resolved())
            .map(|(m, v)| (*m, v))
    }

    /// Resolved markets as display strings, inconclusive ones left out.
    pub fn labels(&self) -> Vec<(String, String)> {
        self.resolved()
            .map(|(m, v)| (m.label().to_string(), v.to_string()))
            .collect()
    }

    pub fn summary(&self) -> String {
        if self.insights.is_empty() {
            TOO_CLOSE_TO_CALL.to_string()
        } else {
            self.insights.join(" ")
        }
    }
}
