use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::{Value, json};

use crate::batch::BatchReport;
use crate::insights::TOO_CLOSE_TO_CALL;
use crate::rules::{Prediction, RuleSet};

pub struct ExportReport {
    pub predicted: usize,
    pub rejected: usize,
    pub columns: usize,
}

/// Writes a batch run as a workbook with `Predictions`, `Rejected` and
/// `Summary` sheets. Unresolved markets are left blank.
pub fn export_batch_xlsx(path: &Path, report: &BatchReport, rules: &RuleSet) -> Result<ExportReport> {
    let market_labels = rules
        .markets
        .iter()
        .map(|m| m.label().to_string())
        .collect::<Vec<_>>();

    let mut header = vec!["Fixture".to_string()];
    header.extend(market_labels.iter().cloned());
    header.push("Insights".to_string());
    header.push("Insufficient Data".to_string());

    let mut prediction_rows = vec![header];
    for row in &report.rows {
        let mut cells = vec![row.fixture.clone()];
        for label in &market_labels {
            let value = row
                .predictions
                .iter()
                .find(|(market, _)| market == label)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            cells.push(value);
        }
        cells.push(row.insights.clone());
        cells.push(row.insufficient_data.join(", "));
        prediction_rows.push(cells);
    }

    let mut rejected_rows = vec![vec![
        "Row".to_string(),
        "Fixture".to_string(),
        "Reason".to_string(),
    ]];
    for rejected in &report.rejected {
        rejected_rows.push(vec![
            (rejected.index + 1).to_string(),
            rejected.fixture.clone(),
            rejected.reason.clone(),
        ]);
    }

    let summary_rows = vec![
        vec!["Generated".to_string(), Utc::now().to_rfc3339()],
        vec!["Predicted".to_string(), report.rows.len().to_string()],
        vec!["Rejected".to_string(), report.rejected.len().to_string()],
        vec!["Window".to_string(), rules.window.to_string()],
        vec!["Home Venue".to_string(), rules.home_venue.to_string()],
        vec!["Away Venue".to_string(), rules.away_venue.to_string()],
    ];

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Predictions")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rejected")?;
        write_rows(sheet, &rejected_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        predicted: report.rows.len(),
        rejected: report.rejected.len(),
        columns: prediction_rows.first().map(Vec::len).unwrap_or_default(),
    })
}

pub fn prediction_json(prediction: &Prediction) -> Value {
    let predictions = prediction
        .resolved()
        .map(|(market, value)| json!({ "market": market, "value": value, "display": value.to_string() }))
        .collect::<Vec<_>>();
    let confidence = prediction
        .confidence
        .iter()
        .map(|(market, c)| json!({ "market": market, "confidence": c }))
        .collect::<Vec<_>>();
    json!({
        "fixture": prediction.fixture_label(),
        "home_team": prediction.home_team,
        "away_team": prediction.away_team,
        "predictions": predictions,
        "confidence": confidence,
        "insights": prediction.insights,
        "insufficient_data": prediction.insufficient_data,
    })
}

pub fn batch_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize batch report")
}

/// Plain-text rendering of a single prediction for the terminal.
pub fn render_prediction_text(prediction: &Prediction) -> String {
    let mut out = format!("Prediction: {}\n", prediction.fixture_label());
    for (market, value) in prediction.labels() {
        out.push_str(&format!("  {market}: {value}\n"));
    }
    for team in &prediction.insufficient_data {
        out.push_str(&format!("  ! insufficient data for {team}\n"));
    }
    out.push('\n');
    if prediction.insights.is_empty() {
        out.push_str(TOO_CLOSE_TO_CALL);
        out.push('\n');
    } else {
        for line in &prediction.insights {
            out.push_str(&format!("- {line}\n"));
        }
    }
    out
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
