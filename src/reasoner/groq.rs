//! Groq-backed reasoning step
//!
//! Builds the tool-selection prompt and parses the model's JSON decision
//! into a typed `Decision`. Parsing is deterministic; everything fuzzy
//! stays on the model's side of the contract.

use crate::groq::GroqClient;
use crate::models::{Decision, RawResult, Record, ReasoningStep, SeriesPoint, ToolDescriptor};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

pub struct GroqReasoner {
    client: GroqClient,
}

impl GroqReasoner {
    pub fn new(api_key: String) -> Self {
        Self {
            client: GroqClient::new(api_key),
        }
    }

    fn build_system_prompt(tools: &[ToolDescriptor]) -> String {
        let tool_context = if tools.is_empty() {
            "No data tools are currently available. Answer from general knowledge and \
             say clearly that live client and portfolio data cannot be queried right now."
                .to_string()
        } else {
            let listing = tools
                .iter()
                .map(|t| format!("- {}: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n");
            format!("Available tools:\n{}", listing)
        };

        format!(
            r#"You are a financial data analyst assistant. Answer the user's question using the available tools.

{}

INSTRUCTIONS:
1. Choose the RIGHT tool for the question
2. Use a tool ONCE with a clear query, then finish
3. If no data is needed, finish immediately
4. If no data was found, say so clearly
5. Be concise and direct

Respond with a single JSON object and nothing else.
To call a tool:
  {{"action": "invoke", "tool": "<tool name>", "arguments": {{...}}}}
To answer:
  {{"action": "finish", "answer": <answer>}}
The answer may be a prose string, an array of record objects, or an array of
{{"label": ..., "value": ...}} points when the data is chartable."#,
            tool_context
        )
    }

    fn build_user_prompt(question: &str, transcript: &[ReasoningStep]) -> String {
        if transcript.is_empty() {
            return format!("Question: {}", question);
        }

        let steps = transcript
            .iter()
            .enumerate()
            .map(|(i, step)| {
                format!(
                    "{}. invoked {} with {}\n   observation: {}",
                    i + 1,
                    step.tool,
                    step.arguments,
                    step.observation
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("Question: {}\n\nSteps so far:\n{}", question, steps)
    }
}

#[async_trait]
impl super::ReasoningBackend for GroqReasoner {
    async fn complete(
        &self,
        question: &str,
        tools: &[ToolDescriptor],
        transcript: &[ReasoningStep],
    ) -> Result<Decision> {
        let system = Self::build_system_prompt(tools);
        let user = Self::build_user_prompt(question, transcript);

        let raw = self.client.chat(&system, &user).await?;
        parse_decision(&raw)
    }

    async fn probe(&self) -> bool {
        self.client.probe().await
    }
}

/// Parse the model's JSON decision output.
pub fn parse_decision(raw: &str) -> Result<Decision> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let json: Value = serde_json::from_str(cleaned).map_err(|e| {
        crate::AgentError::BackendError(format!(
            "Failed to parse decision: {} | raw={}",
            e, raw
        ))
    })?;

    let action = json.get("action").and_then(Value::as_str).ok_or_else(|| {
        crate::AgentError::BackendError(format!("Decision has no action: {}", json))
    })?;

    match action {
        "invoke" => {
            let tool = json
                .get("tool")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    crate::AgentError::BackendError("Invoke decision has no tool".to_string())
                })?
                .to_string();
            let arguments = json
                .get("arguments")
                .or_else(|| json.get("args"))
                .cloned()
                .unwrap_or_else(|| serde_json::json!({}));
            Ok(Decision::Invoke { tool, arguments })
        }
        "finish" => {
            let answer = json.get("answer").ok_or_else(|| {
                crate::AgentError::BackendError("Finish decision has no answer".to_string())
            })?;
            Ok(Decision::Finish {
                answer: raw_result_from_value(answer),
            })
        }
        other => Err(crate::AgentError::BackendError(format!(
            "Unrecognized action: {}",
            other
        ))),
    }
}

/// Map the model's answer shape onto a typed raw result: a string is
/// prose, an array of {label, value} pairs is a series, any other array
/// of objects is a record set.
fn raw_result_from_value(value: &Value) -> RawResult {
    match value {
        Value::String(s) => RawResult::Text(s.clone()),
        Value::Array(items) => {
            if let Some(points) = as_series_points(items) {
                return RawResult::series(points);
            }
            let records: Vec<Record> = items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect();
            if records.len() == items.len() && !records.is_empty() {
                RawResult::Records(records)
            } else {
                RawResult::Text(value.to_string())
            }
        }
        Value::Object(map) => RawResult::Records(vec![map.clone()]),
        other => RawResult::Text(other.to_string()),
    }
}

fn as_series_points(items: &[Value]) -> Option<Vec<SeriesPoint>> {
    if items.is_empty() {
        return None;
    }

    items
        .iter()
        .map(|item| {
            let obj = item.as_object()?;
            if obj.len() != 2 {
                return None;
            }
            let label = obj.get("label")?.as_str()?.to_string();
            let value = obj.get("value")?.as_f64()?;
            Some(SeriesPoint { label, value })
        })
        .collect()
}
