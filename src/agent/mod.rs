//! Query agent - the reasoning loop
//!
//! QUESTION → REASON → ACT → OBSERVE → ... → CLASSIFY → ENVELOPE
//!
//! Each request owns its own transcript and raw result; nothing is
//! shared between concurrent questions beyond the read-only registry and
//! the pooled store handles. Dropping the returned future cancels the
//! loop at the current await point, and no envelope is emitted.

use crate::classifier::ResponseClassifier;
use crate::models::{Decision, Envelope, RawResult, ReasoningStep};
use crate::tools::ToolRegistry;
use crate::reasoner::ReasoningBackend;
use crate::{AgentError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default reasoning step limit per question.
pub const DEFAULT_MAX_STEPS: usize = 5;

pub struct QueryAgent {
    backend: Arc<dyn ReasoningBackend>,
    registry: ToolRegistry,
    max_steps: usize,
}

impl QueryAgent {
    pub fn new(backend: Arc<dyn ReasoningBackend>, registry: ToolRegistry) -> Self {
        Self {
            backend,
            registry,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Resolve a question to a raw result within the step limit.
    ///
    /// Tool failures (unknown name, adapter error) are recorded as
    /// observations and handed back to the backend, which may pick a
    /// different tool or fall back to a text answer. Backend failures
    /// abort the request immediately.
    pub async fn run(&self, question: &str) -> Result<RawResult> {
        let request_id = Uuid::new_v4();
        let mut transcript: Vec<ReasoningStep> = Vec::new();

        info!(request_id = %request_id, question, "Agent: starting reasoning loop");

        for step in 1..=self.max_steps {
            let decision = self
                .backend
                .complete(question, self.registry.list(), &transcript)
                .await?;

            match decision {
                Decision::Finish { answer } => {
                    info!(
                        request_id = %request_id,
                        step,
                        tool_calls = transcript.len(),
                        "Agent: finished"
                    );
                    return Ok(answer);
                }
                Decision::Invoke { tool, arguments } => {
                    debug!(request_id = %request_id, step, tool = %tool, "Agent: invoking tool");

                    let observation = match self.execute_tool(&tool, &arguments).await {
                        Ok(raw) => render_observation(&raw),
                        Err(e @ (AgentError::UnknownTool(_) | AgentError::AdapterError(_))) => {
                            warn!(request_id = %request_id, tool = %tool, error = %e, "Tool failed");
                            format!("tool {} failed: {}", tool, e)
                        }
                        Err(fatal) => return Err(fatal),
                    };

                    transcript.push(ReasoningStep {
                        tool,
                        arguments,
                        observation,
                    });
                }
            }
        }

        warn!(request_id = %request_id, steps = self.max_steps, "Agent: step limit exceeded");
        Err(AgentError::StepLimitExceeded(self.max_steps))
    }

    /// Answer a question as a typed envelope. The single entry point the
    /// transport layer calls.
    pub async fn orchestrate(&self, question: &str) -> Result<Envelope> {
        let raw = self.run(question).await?;
        Ok(ResponseClassifier::classify(question, &raw))
    }

    async fn execute_tool(&self, tool: &str, arguments: &serde_json::Value) -> Result<RawResult> {
        let resolved = self.registry.resolve(tool)?;
        resolved.execute(arguments).await
    }
}

const OBSERVATION_CLIP: usize = 4000;

/// Render a tool result for the backend's next reasoning step. Structured
/// data is serialized so the backend can re-emit or summarize it.
fn render_observation(raw: &RawResult) -> String {
    match raw {
        RawResult::Text(body) => body.clone(),
        RawResult::Records(rows) => {
            let body = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
            format!("{} records: {}", rows.len(), clip(&body, OBSERVATION_CLIP))
        }
        RawResult::Series { points, .. } => {
            let body = serde_json::to_string(points).unwrap_or_else(|_| "[]".to_string());
            format!("{} points: {}", points.len(), clip(&body, OBSERVATION_CLIP))
        }
    }
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
