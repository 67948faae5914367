//! Relational-store tool for portfolio data
//!
//! Executes read-only SQL against the portfolio database over a shared
//! pool. Every call is an independent query; no transactions.

use crate::models::{RawResult, Record};
use crate::{AgentError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row};
use tracing::{debug, warn};

pub struct RelationalStoreTool {
    pool: Option<MySqlPool>,
}

impl RelationalStoreTool {
    /// Build from an optional connection string. The pool connects
    /// lazily; a missing or unparsable URI leaves the tool unconfigured.
    pub fn connect(uri: Option<&str>) -> Self {
        let pool = uri.and_then(|uri| {
            match MySqlPoolOptions::new().max_connections(5).connect_lazy(uri) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("MySQL pool setup failed: {}", e);
                    None
                }
            }
        });
        Self { pool }
    }
}

#[async_trait::async_trait]
impl super::StoreTool for RelationalStoreTool {
    fn name(&self) -> &'static str {
        "portfolio_sql"
    }

    fn description(&self) -> &'static str {
        "Run a read-only SQL query against the portfolio database: portfolio \
         values, holdings, transactions, performance, and market data. Tables: \
         clients, portfolios, securities, portfolio_holdings, transactions, \
         portfolio_performance, market_data. Arguments: {\"sql\": \"SELECT ...\"}."
    }

    fn configured(&self) -> bool {
        self.pool.is_some()
    }

    async fn execute(&self, arguments: &Value) -> Result<RawResult> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| AgentError::AdapterError("MYSQL_URI is not configured".to_string()))?;

        let sql = arguments
            .get("sql")
            .or_else(|| arguments.get("query"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::AdapterError(
                    "Expected 'sql' argument with a SELECT statement".to_string(),
                )
            })?;

        ensure_read_only(sql)?;

        debug!(sql, "Running portfolio SQL query");

        let rows = sqlx::query(sql)
            .fetch_all(pool)
            .await
            .map_err(|e| AgentError::AdapterError(format!("SQL query failed: {}", e)))?;

        if rows.is_empty() {
            return Ok(RawResult::Text(
                "No matching records found in the portfolio store.".to_string(),
            ));
        }

        let records = rows.iter().map(row_to_record).collect();
        Ok(RawResult::Records(records))
    }
}

/// Reject anything but a single read-only statement. The reasoning
/// backend writes the SQL, so the guard sits on this side of the trust
/// boundary.
fn ensure_read_only(sql: &str) -> Result<()> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err(AgentError::AdapterError("Empty SQL query".to_string()));
    }
    if trimmed.contains(';') {
        return Err(AgentError::AdapterError(
            "Multiple SQL statements are not allowed".to_string(),
        ));
    }

    let first = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match first.as_str() {
        "select" | "show" | "describe" | "explain" | "with" => Ok(()),
        other => Err(AgentError::AdapterError(format!(
            "Only read-only queries are allowed, got '{}'",
            other
        ))),
    }
}

/// Decode one row into field → JSON value, trying column types from the
/// most specific to the most permissive.
fn row_to_record(row: &MySqlRow) -> Record {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
            v.map(decimal_to_value).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
            v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            v.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            v.map(Value::String).unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        record.insert(column.name().to_string(), value);
    }
    record
}

fn decimal_to_value(decimal: Decimal) -> Value {
    decimal
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(decimal.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::StoreTool;

    #[test]
    fn test_select_queries_pass_the_guard() {
        assert!(ensure_read_only("SELECT * FROM portfolios").is_ok());
        assert!(ensure_read_only("  select name from clients;  ").is_ok());
        assert!(ensure_read_only("SHOW TABLES").is_ok());
        assert!(ensure_read_only("DESCRIBE market_data").is_ok());
        assert!(ensure_read_only("WITH t AS (SELECT 1) SELECT * FROM t").is_ok());
    }

    #[test]
    fn test_write_queries_are_rejected() {
        assert!(ensure_read_only("DROP TABLE portfolios").is_err());
        assert!(ensure_read_only("INSERT INTO clients VALUES (1)").is_err());
        assert!(ensure_read_only("UPDATE portfolios SET value = 0").is_err());
        assert!(ensure_read_only("").is_err());
    }

    #[test]
    fn test_stacked_statements_are_rejected() {
        let result = ensure_read_only("SELECT 1; DROP TABLE portfolios");
        assert!(matches!(result, Err(AgentError::AdapterError(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_tool_reports_adapter_error() {
        let tool = RelationalStoreTool::connect(None);
        assert!(!tool.configured());

        let result = tool
            .execute(&serde_json::json!({"sql": "SELECT 1"}))
            .await;
        assert!(matches!(result, Err(AgentError::AdapterError(_))));
    }

    #[tokio::test]
    async fn test_missing_sql_argument_is_adapter_error() {
        let tool = RelationalStoreTool::connect(None);
        let result = tool.execute(&serde_json::json!({})).await;
        assert!(matches!(result, Err(AgentError::AdapterError(_))));
    }
}
