//! Capability/health aggregator
//!
//! Reports whether each store adapter is configured and whether the
//! reasoning backend answers a lightweight probe. Never runs a data
//! query and never fails: a broken probe is reported as `false` so the
//! status display stays alive even when every dependency is down.

use crate::models::HealthSnapshot;
use crate::reasoner::ReasoningBackend;
use crate::tools::StoreTool;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const SNAPSHOT_TTL: Duration = Duration::from_secs(5);

pub struct HealthAggregator {
    backend: Arc<dyn ReasoningBackend>,
    /// Every adapter, configured or not - unlike the registry, which
    /// only holds the configured ones.
    tools: Vec<Arc<dyn StoreTool>>,
    cache: Mutex<Option<(Instant, HealthSnapshot)>>,
}

impl HealthAggregator {
    pub fn new(backend: Arc<dyn ReasoningBackend>, tools: Vec<Arc<dyn StoreTool>>) -> Self {
        Self {
            backend,
            tools,
            cache: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> HealthSnapshot {
        let mut cache = self.cache.lock().await;
        if let Some((taken_at, snapshot)) = cache.as_ref() {
            if taken_at.elapsed() < SNAPSHOT_TTL {
                return snapshot.clone();
            }
        }

        let mut adapters = BTreeMap::new();
        for tool in &self.tools {
            adapters.insert(tool.name().to_string(), tool.configured());
        }

        let backend_reachable = self.backend.probe().await;

        debug!(backend_reachable, adapters = adapters.len(), "Health snapshot taken");

        let snapshot = HealthSnapshot {
            backend_reachable,
            adapters,
            checked_at: Utc::now(),
        };
        *cache = Some((Instant::now(), snapshot.clone()));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, RawResult, ReasoningStep, ToolDescriptor};
    use crate::Result;
    use serde_json::Value;

    struct DownBackend;

    #[async_trait::async_trait]
    impl ReasoningBackend for DownBackend {
        async fn complete(
            &self,
            _question: &str,
            _tools: &[ToolDescriptor],
            _transcript: &[ReasoningStep],
        ) -> Result<Decision> {
            Err(crate::AgentError::BackendUnavailable("down".to_string()))
        }

        async fn probe(&self) -> bool {
            false
        }
    }

    struct StubTool {
        name: &'static str,
        configured: bool,
    }

    #[async_trait::async_trait]
    impl StoreTool for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "stub"
        }

        fn configured(&self) -> bool {
            self.configured
        }

        async fn execute(&self, _arguments: &Value) -> Result<RawResult> {
            Ok(RawResult::Text("stub".to_string()))
        }
    }

    #[tokio::test]
    async fn test_snapshot_survives_total_outage() {
        let aggregator = HealthAggregator::new(
            Arc::new(DownBackend),
            vec![
                Arc::new(StubTool {
                    name: "client_records",
                    configured: false,
                }),
                Arc::new(StubTool {
                    name: "portfolio_sql",
                    configured: true,
                }),
            ],
        );

        let snapshot = aggregator.snapshot().await;

        assert!(!snapshot.backend_reachable);
        assert_eq!(snapshot.adapters.len(), 2);
        assert_eq!(snapshot.adapters["client_records"], false);
        assert_eq!(snapshot.adapters["portfolio_sql"], true);
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_within_ttl() {
        let aggregator = HealthAggregator::new(Arc::new(DownBackend), vec![]);

        let first = aggregator.snapshot().await;
        let second = aggregator.snapshot().await;
        assert_eq!(first.checked_at, second.checked_at);
    }
}
