//! Reasoning backend contract
//!
//! The backend is an opaque natural-language capability: given the
//! question, the tool descriptors, and the transcript so far, it decides
//! to invoke a tool or finish with an answer. Keeping it behind this
//! trait makes the loop fully deterministic under a scripted backend.

use crate::models::{Decision, ReasoningStep, ToolDescriptor};
use crate::Result;
use async_trait::async_trait;

pub mod groq;
pub use groq::GroqReasoner;

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// One reasoning step: pick a tool with arguments, or finish.
    async fn complete(
        &self,
        question: &str,
        tools: &[ToolDescriptor],
        transcript: &[ReasoningStep],
    ) -> Result<Decision>;

    /// Lightweight reachability check for health reporting. Never errors.
    async fn probe(&self) -> bool;
}
