//! Response classifier
//!
//! Turns a raw result plus the originating question into exactly one
//! presentation shape: prose, table, or chart. Pure and side-effect-free;
//! the same inputs always produce the same envelope.
//!
//! The keyword sets are policy tables, tunable without touching the rule
//! order: plain text stays text, multi-field records become tables,
//! label/value series become charts only when the question (or the
//! producing adapter) asks for one, and everything else structured falls
//! back to a table rather than being flattened to prose.

use crate::models::{
    AxisLabels, ChartKind, Envelope, RawResult, Record, SeriesPoint,
};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Comparative/aggregative cues that make a label/value series chartable.
pub(crate) const CHART_CUES: &[&str] = &[
    "chart",
    "graph",
    "plot",
    "visualization",
    "compare",
    "comparison",
    "distribution",
    "trend",
    "performance",
    "top",
    "ranking",
    "vs",
    "highest",
    "lowest",
    "best",
    "worst",
    "breakdown",
];

const PIE_CUES: &[&str] = &["distribution", "breakdown", "allocation", "share", "split"];

const LINE_CUES: &[&str] = &[
    "trend",
    "over time",
    "history",
    "growth",
    "timeline",
    "daily",
    "weekly",
    "monthly",
    "quarterly",
];

const MAX_TITLE_LEN: usize = 50;

pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classify a raw result. Priority order: text, table, chart, then
    /// table as the structured fallback.
    pub fn classify(question: &str, raw: &RawResult) -> Envelope {
        match raw {
            RawResult::Text(body) => Envelope::text(question, body.clone()),

            RawResult::Records(rows) => {
                if distinct_field_count(rows) < 2 {
                    debug!("Record set below two distinct fields, falling back to table");
                }
                Envelope::table(question, rows.clone())
            }

            RawResult::Series { points, plot_hint } => {
                if *plot_hint || has_chart_cue(question) {
                    let chart_kind = chart_kind_for(question, points);
                    Envelope::chart(
                        question,
                        chart_kind,
                        points.clone(),
                        axis_labels_for(question),
                        title_for(question),
                    )
                } else {
                    debug!("Series without a chart cue, falling back to table");
                    Envelope::table(question, points_to_rows(points))
                }
            }
        }
    }
}

fn has_chart_cue(question: &str) -> bool {
    let q = question.to_lowercase();
    CHART_CUES.iter().any(|cue| q.contains(cue))
}

/// Fixed chart-kind heuristic: parts-of-a-whole wording wins, then a
/// date/sequential axis, and bar is the inconclusive default.
fn chart_kind_for(question: &str, points: &[SeriesPoint]) -> ChartKind {
    let q = question.to_lowercase();
    if PIE_CUES.iter().any(|cue| q.contains(cue)) {
        ChartKind::Pie
    } else if LINE_CUES.iter().any(|cue| q.contains(cue)) || labels_are_sequential(points) {
        ChartKind::Line
    } else {
        ChartKind::Bar
    }
}

/// Labels form a date axis when every one parses as a calendar date or
/// a year-month.
fn labels_are_sequential(points: &[SeriesPoint]) -> bool {
    !points.is_empty()
        && points.iter().all(|p| {
            NaiveDate::parse_from_str(&p.label, "%Y-%m-%d").is_ok()
                || NaiveDate::parse_from_str(&format!("{}-01", p.label), "%Y-%m-%d").is_ok()
        })
}

fn axis_labels_for(question: &str) -> AxisLabels {
    let q = question.to_lowercase();

    let x = if q.contains("client") {
        "Clients"
    } else if q.contains("portfolio") {
        "Portfolios"
    } else if q.contains("sector") {
        "Sectors"
    } else if q.contains("manager") {
        "Managers"
    } else {
        "Categories"
    };

    let y = if q.contains("count") || q.contains("number") {
        "Count"
    } else if q.contains("percentage") || q.contains('%') || q.contains("return") {
        "Percentage (%)"
    } else {
        "Value"
    };

    AxisLabels {
        x: x.to_string(),
        y: y.to_string(),
    }
}

fn title_for(question: &str) -> String {
    let title = question.trim().trim_end_matches('?').trim();
    if title.chars().count() > MAX_TITLE_LEN {
        let clipped: String = title.chars().take(MAX_TITLE_LEN - 3).collect();
        format!("{}...", clipped)
    } else {
        title.to_string()
    }
}

fn points_to_rows(points: &[SeriesPoint]) -> Vec<Record> {
    points
        .iter()
        .map(|p| {
            let mut record = Record::new();
            record.insert("label".to_string(), Value::String(p.label.clone()));
            record.insert(
                "value".to_string(),
                serde_json::Number::from_f64(p.value)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            );
            record
        })
        .collect()
}

fn distinct_field_count(rows: &[Record]) -> usize {
    let mut fields = BTreeSet::new();
    for row in rows {
        for key in row.keys() {
            fields.insert(key.as_str());
        }
    }
    fields.len()
}
