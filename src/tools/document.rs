//! Document-store tool for client records
//!
//! Accepts a structured filter pass-through or a plain-text query, which
//! is translated into a filter through small keyword tables. A group-by
//! argument switches to an aggregation that emits a plot-ready series.

use crate::models::{RawResult, Record, SeriesPoint};
use crate::{AgentError, Result};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::{debug, warn};

const DATABASE_NAME: &str = "client_db";
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

const CITIES: &[&str] = &[
    "new york",
    "california",
    "texas",
    "florida",
    "chicago",
    "boston",
    "seattle",
];

const SECTORS: &[&str] = &[
    "technology",
    "healthcare",
    "finance",
    "energy",
    "real estate",
    "consumer goods",
];

pub struct DocumentStoreTool {
    db: Option<Database>,
}

impl DocumentStoreTool {
    /// Build from an optional connection string. A missing or unparsable
    /// URI leaves the tool unconfigured rather than broken.
    pub async fn connect(uri: Option<&str>) -> Self {
        let db = match uri {
            Some(uri) => match Client::with_uri_str(uri).await {
                Ok(client) => Some(client.database(DATABASE_NAME)),
                Err(e) => {
                    warn!("MongoDB connection setup failed: {}", e);
                    None
                }
            },
            None => None,
        };
        Self { db }
    }

    async fn find(&self, db: &Database, arguments: &Value) -> Result<RawResult> {
        let query_text = arguments.get("query").and_then(Value::as_str).unwrap_or("");
        let collection_name = arguments
            .get("collection")
            .and_then(Value::as_str)
            .unwrap_or_else(|| route_collection(query_text));

        let filter = match arguments.get("filter") {
            Some(value) => mongodb::bson::to_document(value)
                .map_err(|e| AgentError::AdapterError(format!("Invalid filter: {}", e)))?,
            None => translate_filter(query_text),
        };

        let limit = arguments
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        debug!(collection = collection_name, %filter, limit, "Running document find");

        let options = FindOptions::builder().limit(limit).build();
        let collection = db.collection::<Document>(collection_name);
        let mut cursor = collection
            .find(filter, options)
            .await
            .map_err(|e| AgentError::AdapterError(format!("Document query failed: {}", e)))?;

        let mut rows: Vec<Record> = Vec::new();
        while let Some(mut document) = cursor
            .try_next()
            .await
            .map_err(|e| AgentError::AdapterError(format!("Document cursor failed: {}", e)))?
        {
            document.remove("_id");
            if let Value::Object(map) = Bson::Document(document).into_relaxed_extjson() {
                rows.push(map);
            }
        }

        if rows.is_empty() {
            return Ok(RawResult::Text(
                "No matching records found in the client store.".to_string(),
            ));
        }
        Ok(RawResult::Records(rows))
    }

    async fn aggregate(
        &self,
        db: &Database,
        group_by: &str,
        arguments: &Value,
    ) -> Result<RawResult> {
        let metric = arguments
            .get("metric")
            .and_then(Value::as_str)
            .unwrap_or("account_value");
        let limit = arguments
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(10)
            .clamp(1, MAX_LIMIT);
        let collection_name = arguments
            .get("collection")
            .and_then(Value::as_str)
            .unwrap_or("clients");

        let mut match_doc = Document::new();
        match_doc.insert(group_by, doc! { "$exists": true });
        let mut group = Document::new();
        group.insert("_id", format!("${}", group_by));
        group.insert("count", doc! { "$sum": 1 });
        group.insert("total", doc! { "$sum": format!("${}", metric) });

        let pipeline = vec![
            doc! { "$match": match_doc },
            doc! { "$group": group },
            doc! { "$sort": { "total": -1 } },
            doc! { "$limit": limit },
        ];

        debug!(collection = collection_name, group_by, metric, "Running document aggregation");

        let collection = db.collection::<Document>(collection_name);
        let mut cursor = collection
            .aggregate(pipeline, None)
            .await
            .map_err(|e| AgentError::AdapterError(format!("Aggregation failed: {}", e)))?;

        let mut points = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| AgentError::AdapterError(format!("Aggregation cursor failed: {}", e)))?
        {
            let label = document.get("_id").map(bson_label).unwrap_or_default();
            if let Some(value) = document.get("total").and_then(bson_number) {
                points.push(SeriesPoint { label, value });
            }
        }

        if points.is_empty() {
            return Ok(RawResult::Text(
                "No matching records found in the client store.".to_string(),
            ));
        }
        Ok(RawResult::plot_ready(points))
    }
}

#[async_trait::async_trait]
impl super::StoreTool for DocumentStoreTool {
    fn name(&self) -> &'static str {
        "client_records"
    }

    fn description(&self) -> &'static str {
        "Query client information: personal details, demographics, locations, \
         investment preferences, and risk profiles. Arguments: \
         {\"query\": \"<plain text>\"} for a keyword search, \
         {\"filter\": {...}, \"collection\": \"clients\", \"limit\": 20} for a \
         structured filter, or {\"group_by\": \"<field>\", \"metric\": \"<numeric field>\"} \
         for a breakdown suitable for charting."
    }

    fn configured(&self) -> bool {
        self.db.is_some()
    }

    async fn execute(&self, arguments: &Value) -> Result<RawResult> {
        let db = self.db.as_ref().ok_or_else(|| {
            AgentError::AdapterError("MONGODB_URI is not configured".to_string())
        })?;

        if let Some(group_by) = arguments.get("group_by").and_then(Value::as_str) {
            return self.aggregate(db, group_by, arguments).await;
        }
        self.find(db, arguments).await
    }
}

/// Pick a collection from the query wording.
fn route_collection(query: &str) -> &'static str {
    let q = query.to_lowercase();
    if ["client", "customer", "profile", "demographic"]
        .iter()
        .any(|w| q.contains(w))
    {
        "clients"
    } else if ["preference", "risk", "investment"].iter().any(|w| q.contains(w)) {
        "client_preferences"
    } else if ["contact", "address", "phone", "email"].iter().any(|w| q.contains(w)) {
        "client_contacts"
    } else {
        "clients"
    }
}

/// Translate a plain-text query into a filter document. Unrecognized
/// wording yields an empty filter, which becomes a capped scan.
fn translate_filter(query: &str) -> Document {
    let q = query.to_lowercase();
    let mut filter = Document::new();

    if let Some(city) = CITIES.iter().find(|c| q.contains(**c)) {
        filter.insert(
            "address.city",
            doc! { "$regex": *city, "$options": "i" },
        );
    }

    if let Some((min, max)) = age_range(&q) {
        if min == max {
            filter.insert("age", min);
        } else {
            filter.insert("age", doc! { "$gte": min, "$lte": max });
        }
    }

    if q.contains("high risk") || q.contains("aggressive") {
        filter.insert("risk_profile.tolerance", "high");
    } else if q.contains("low risk") || q.contains("conservative") {
        filter.insert("risk_profile.tolerance", "low");
    } else if q.contains("medium risk") || q.contains("moderate") {
        filter.insert("risk_profile.tolerance", "medium");
    }

    if let Some(sector) = SECTORS.iter().find(|s| q.contains(**s)) {
        filter.insert(
            "investment_preferences.preferred_sectors",
            doc! { "$in": [*sector] },
        );
    }

    if q.contains("high value") || q.contains("wealthy") {
        filter.insert("account_value", doc! { "$gte": 1_000_000_i64 });
    } else if q.contains("low value") {
        filter.insert("account_value", doc! { "$lte": 100_000_i64 });
    }

    filter
}

/// Extract an age bound from wording like "aged between 30 and 50",
/// "aged 30-50", or "age 40". Only digits after the word "age" count.
fn age_range(query: &str) -> Option<(i64, i64)> {
    let idx = query.find("age")?;
    let numbers = numbers_in(&query[idx..]);
    match numbers.as_slice() {
        [] => None,
        [single] => Some((*single, *single)),
        [first, second, ..] => Some((*first.min(second), *first.max(second))),
    }
}

fn numbers_in(text: &str) -> Vec<i64> {
    let mut numbers = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                numbers.push(n);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(n) = current.parse() {
            numbers.push(n);
        }
    }
    numbers
}

fn bson_label(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bson_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_query_becomes_regex_filter() {
        let filter = translate_filter("find clients from new york");
        let city = filter.get_document("address.city").unwrap();
        assert_eq!(city.get_str("$regex").unwrap(), "new york");
        assert_eq!(city.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_risk_tolerance_queries() {
        let filter = translate_filter("show me high risk clients");
        assert_eq!(filter.get_str("risk_profile.tolerance").unwrap(), "high");

        let filter = translate_filter("conservative investors");
        assert_eq!(filter.get_str("risk_profile.tolerance").unwrap(), "low");
    }

    #[test]
    fn test_age_range_query() {
        let filter = translate_filter("list clients aged between 30 and 50");
        let age = filter.get_document("age").unwrap();
        assert_eq!(age.get_i64("$gte").unwrap(), 30);
        assert_eq!(age.get_i64("$lte").unwrap(), 50);
    }

    #[test]
    fn test_single_age_query() {
        let filter = translate_filter("clients age 40");
        assert_eq!(filter.get_i64("age").unwrap(), 40);
    }

    #[test]
    fn test_age_ignores_numbers_before_the_cue() {
        // "top 5" must not be mistaken for an age bound
        let filter = translate_filter("top 5 clients aged 30");
        assert_eq!(filter.get_i64("age").unwrap(), 30);
    }

    #[test]
    fn test_sector_preference_query() {
        let filter = translate_filter("clients interested in technology");
        let sectors = filter
            .get_document("investment_preferences.preferred_sectors")
            .unwrap();
        let list = sectors.get_array("$in").unwrap();
        assert_eq!(list[0].as_str().unwrap(), "technology");
    }

    #[test]
    fn test_account_value_bands() {
        let filter = translate_filter("wealthy clients");
        let value = filter.get_document("account_value").unwrap();
        assert_eq!(value.get_i64("$gte").unwrap(), 1_000_000);
    }

    #[test]
    fn test_unrecognized_query_yields_empty_filter() {
        assert!(translate_filter("everyone please").is_empty());
    }

    #[test]
    fn test_collection_routing() {
        assert_eq!(route_collection("client demographics"), "clients");
        assert_eq!(route_collection("investment preferences"), "client_preferences");
        assert_eq!(route_collection("email and phone"), "client_contacts");
        assert_eq!(route_collection("anything else"), "clients");
    }

    #[tokio::test]
    async fn test_unconfigured_tool_reports_adapter_error() {
        use crate::tools::StoreTool;

        let tool = DocumentStoreTool::connect(None).await;
        assert!(!tool.configured());

        let result = tool.execute(&serde_json::json!({"query": "clients"})).await;
        assert!(matches!(result, Err(AgentError::AdapterError(_))));
    }
}
