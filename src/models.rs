//! Core data models for the query agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One result row: field name → scalar/array/nested value.
pub type Record = serde_json::Map<String, Value>;

//
// ================= Raw results =================
//

/// A single point in a chartable series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// What a tool (or the reasoning backend itself) hands back before
/// classification. Owned by one request, discarded after the envelope
/// is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Text(String),
    Records(Vec<Record>),
    Series {
        points: Vec<SeriesPoint>,
        /// Set by an adapter that knows its output is plot-ready
        /// (e.g. a group-by aggregation).
        plot_hint: bool,
    },
}

impl RawResult {
    pub fn series(points: Vec<SeriesPoint>) -> Self {
        RawResult::Series {
            points,
            plot_hint: false,
        }
    }

    pub fn plot_ready(points: Vec<SeriesPoint>) -> Self {
        RawResult::Series {
            points,
            plot_hint: true,
        }
    }
}

//
// ================= Reasoning =================
//

/// Capability advertisement for one tool, shown to the reasoning backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// One reasoning→act→observe cycle in a single question's transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningStep {
    pub tool: String,
    pub arguments: Value,
    pub observation: String,
}

/// What the reasoning backend decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Invoke { tool: String, arguments: Value },
    Finish { answer: RawResult },
}

//
// ================= Envelope =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

/// The one populated presentation shape. A sum type: `rows` and `series`
/// cannot coexist by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnvelopePayload {
    Text {
        body: String,
    },
    Table {
        rows: Vec<Record>,
    },
    Chart {
        chart_kind: ChartKind,
        series: Vec<SeriesPoint>,
        axis_labels: AxisLabels,
        title: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeMetadata {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
}

/// The externally visible result of one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(flatten)]
    pub payload: EnvelopePayload,
    pub metadata: EnvelopeMetadata,
}

impl Envelope {
    pub fn text(question: &str, body: String) -> Self {
        Envelope {
            payload: EnvelopePayload::Text { body },
            metadata: EnvelopeMetadata {
                question: question.to_string(),
                record_count: None,
            },
        }
    }

    pub fn table(question: &str, rows: Vec<Record>) -> Self {
        let record_count = Some(rows.len());
        Envelope {
            payload: EnvelopePayload::Table { rows },
            metadata: EnvelopeMetadata {
                question: question.to_string(),
                record_count,
            },
        }
    }

    pub fn chart(
        question: &str,
        chart_kind: ChartKind,
        series: Vec<SeriesPoint>,
        axis_labels: AxisLabels,
        title: String,
    ) -> Self {
        let record_count = Some(series.len());
        Envelope {
            payload: EnvelopePayload::Chart {
                chart_kind,
                series,
                axis_labels,
                title,
            },
            metadata: EnvelopeMetadata {
                question: question.to_string(),
                record_count,
            },
        }
    }
}

//
// ================= Health =================
//

/// Configuration/reachability snapshot. Recomputed per health check
/// (behind a short TTL), never derived from a data query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthSnapshot {
    pub backend_reachable: bool,
    pub adapters: BTreeMap<String, bool>,
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut rec = Record::new();
        for (k, v) in pairs {
            rec.insert(k.to_string(), v.clone());
        }
        rec
    }

    #[test]
    fn test_table_envelope_serialization_shape() {
        let rows = vec![record(&[("name", json!("Alice")), ("age", json!(42))])];
        let envelope = Envelope::table("List clients", rows);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["kind"], "table");
        assert!(value.get("rows").is_some());
        assert!(value.get("series").is_none());
        assert!(value.get("body").is_none());
        assert_eq!(value["metadata"]["record_count"], 1);
        assert_eq!(value["metadata"]["question"], "List clients");
    }

    #[test]
    fn test_chart_envelope_serialization_shape() {
        let series = vec![SeriesPoint {
            label: "Tech".to_string(),
            value: 12.4,
        }];
        let envelope = Envelope::chart(
            "Which sectors lead?",
            ChartKind::Bar,
            series,
            AxisLabels {
                x: "Sectors".to_string(),
                y: "Value".to_string(),
            },
            "Which sectors lead".to_string(),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["kind"], "chart");
        assert_eq!(value["chart_kind"], "bar");
        assert!(value.get("rows").is_none());
        assert_eq!(value["series"][0]["label"], "Tech");
    }

    #[test]
    fn test_text_envelope_omits_record_count() {
        let envelope = Envelope::text("Explain risk", "Risk is...".to_string());
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["kind"], "text");
        assert!(value["metadata"].get("record_count").is_none());
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope::text("q", "a".to_string());
        let json = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope, back);
    }
}
