use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// One played fixture, keyed by the column names of the source spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "Home Team")]
    pub home_team: String,
    #[serde(rename = "Away Team")]
    pub away_team: String,
    #[serde(rename = "Home Goals")]
    pub home_goals: u16,
    #[serde(rename = "Away Goals")]
    pub away_goals: u16,
    #[serde(rename = "Home Corners", default, skip_serializing_if = "Option::is_none")]
    pub home_corners: Option<u16>,
    #[serde(rename = "Away Corners", default, skip_serializing_if = "Option::is_none")]
    pub away_corners: Option<u16>,
    #[serde(rename = "Home Cards", default, skip_serializing_if = "Option::is_none")]
    pub home_cards: Option<u16>,
    #[serde(rename = "Away Cards", default, skip_serializing_if = "Option::is_none")]
    pub away_cards: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

/// A record seen from one team's side: "for" is always the queried team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamLine {
    pub record_index: usize,
    pub side: Side,
    pub goals_for: u16,
    pub goals_against: u16,
    pub corners_for: Option<u16>,
    pub corners_against: Option<u16>,
    pub cards_for: Option<u16>,
    pub cards_against: Option<u16>,
}

impl MatchRecord {
    pub fn new(home_team: &str, away_team: &str, home_goals: u16, away_goals: u16) -> Self {
        Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
            home_corners: None,
            away_corners: None,
            home_cards: None,
            away_cards: None,
        }
    }

    pub fn with_corners(mut self, home: u16, away: u16) -> Self {
        self.home_corners = Some(home);
        self.away_corners = Some(away);
        self
    }

    pub fn with_cards(mut self, home: u16, away: u16) -> Self {
        self.home_cards = Some(home);
        self.away_cards = Some(away);
        self
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn line(&self, record_index: usize, side: Side) -> TeamLine {
        match side {
            Side::Home => TeamLine {
                record_index,
                side,
                goals_for: self.home_goals,
                goals_against: self.away_goals,
                corners_for: self.home_corners,
                corners_against: self.away_corners,
                cards_for: self.home_cards,
                cards_against: self.away_cards,
            },
            Side::Away => TeamLine {
                record_index,
                side,
                goals_for: self.away_goals,
                goals_against: self.home_goals,
                corners_for: self.away_corners,
                corners_against: self.home_corners,
                cards_for: self.away_cards,
                cards_against: self.home_cards,
            },
        }
    }
}

/// Which optional statistic columns the source table carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatColumns {
    pub corners: bool,
    pub cards: bool,
}

impl StatColumns {
    pub fn all() -> Self {
        Self {
            corners: true,
            cards: true,
        }
    }

    fn detect(records: &[MatchRecord]) -> Self {
        Self {
            corners: records
                .iter()
                .any(|r| r.home_corners.is_some() || r.away_corners.is_some()),
            cards: records
                .iter()
                .any(|r| r.home_cards.is_some() || r.away_cards.is_some()),
        }
    }
}

/// Immutable, already-loaded match table in original row order.
#[derive(Debug, Clone, Default)]
pub struct MatchHistory {
    records: Vec<MatchRecord>,
    columns: StatColumns,
}

impl MatchHistory {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        let columns = StatColumns::detect(&records);
        Self { records, columns }
    }

    pub fn with_columns(records: Vec<MatchRecord>, columns: StatColumns) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn columns(&self) -> StatColumns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, de-duplicated names of every team appearing on either side.
    pub fn teams(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for record in &self.records {
            names.insert(record.home_team.as_str());
            names.insert(record.away_team.as_str());
        }
        names.into_iter().map(str::to_string).collect()
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.home_team == team || r.away_team == team)
    }
}

pub fn parse_history_json(raw: &str) -> Result<MatchHistory> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(MatchHistory::default());
    }
    let records: Vec<MatchRecord> =
        serde_json::from_str(trimmed).context("invalid match history json")?;
    Ok(MatchHistory::new(records))
}

pub fn load_history_json(path: &Path) -> Result<MatchHistory> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read match history {}", path.display()))?;
    parse_history_json(&raw).with_context(|| format!("parse match history {}", path.display()))
}

/// Loads a history file, picking the reader from the file extension.
pub fn load_history(path: &Path) -> Result<MatchHistory> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => load_history_json(path),
        "sqlite" | "sqlite3" | "db" => {
            let conn = open_db_read_only(path)?;
            load_history_db(&conn)
        }
        other => Err(anyhow!(
            "unsupported match history format '{other}' ({})",
            path.display()
        )),
    }
}

pub fn open_db_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("open sqlite db {}", path.display()))
}

const REQUIRED_COLUMNS: &[&str] = &["home_team", "away_team", "home_goals", "away_goals"];
const OPTIONAL_COLUMNS: &[&str] = &["home_corners", "away_corners", "home_cards", "away_cards"];

/// Reads the `matches` table. Corner and card columns are optional; rows
/// without a final score are skipped.
pub fn load_history_db(conn: &Connection) -> Result<MatchHistory> {
    let present = table_columns(conn, "matches")?;
    for required in REQUIRED_COLUMNS {
        if !present.contains(*required) {
            return Err(PredictError::MissingColumn(*required).into());
        }
    }

    let optional = OPTIONAL_COLUMNS
        .iter()
        .map(|col| {
            if present.contains(*col) {
                (*col).to_string()
            } else {
                "NULL".to_string()
            }
        })
        .collect::<Vec<_>>();
    let order = if present.contains("utc_time") {
        "utc_time ASC, rowid ASC"
    } else {
        "rowid ASC"
    };
    let sql = format!(
        "SELECT home_team, away_team, home_goals, away_goals, {} FROM matches
         WHERE home_goals IS NOT NULL AND away_goals IS NOT NULL
         ORDER BY {order}",
        optional.join(", ")
    );

    let mut stmt = conn.prepare(&sql).context("prepare load history query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                [
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                ],
            ))
        })
        .context("query load history")?;

    let mut records = Vec::new();
    for row in rows {
        let (home_team, away_team, home_goals, away_goals, extra) =
            row.context("decode history row")?;
        let mut record = MatchRecord::new(
            &home_team,
            &away_team,
            to_count(home_goals, "home_goals")?,
            to_count(away_goals, "away_goals")?,
        );
        let [hc, ac, hk, ak] = extra;
        record.home_corners = hc.map(|v| to_count(v, "home_corners")).transpose()?;
        record.away_corners = ac.map(|v| to_count(v, "away_corners")).transpose()?;
        record.home_cards = hk.map(|v| to_count(v, "home_cards")).transpose()?;
        record.away_cards = ak.map(|v| to_count(v, "away_cards")).transpose()?;
        records.push(record);
    }

    let columns = StatColumns {
        corners: present.contains("home_corners") && present.contains("away_corners"),
        cards: present.contains("home_cards") && present.contains("away_cards"),
    };
    Ok(MatchHistory::with_columns(records, columns))
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .context("prepare table_info")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("query table_info")?;
    let mut out = BTreeSet::new();
    for name in names {
        out.insert(name.context("decode column name")?.to_ascii_lowercase());
    }
    if out.is_empty() {
        return Err(PredictError::Load(format!("table '{table}' not found")).into());
    }
    Ok(out)
}

fn to_count(value: i64, column: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        PredictError::Load(format!("column {column} holds out-of-range value {value}")).into()
    })
}
