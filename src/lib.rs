//! Portfolio Query Agent
//!
//! Answers free-text questions about client and portfolio data:
//! - A reasoning backend chooses, per question, among store-backed tools
//! - Tools query the document (client) and relational (portfolio) stores
//! - A deterministic classifier packages the raw result as prose, a
//!   table, or a chart-ready series for the frontend
//!
//! PIPELINE:
//! QUESTION → REASON → ACT → OBSERVE → ... → CLASSIFY → ENVELOPE

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod groq;
pub mod health;
pub mod models;
pub mod reasoner;
pub mod tools;

pub use error::{AgentError, Result};

// Re-export common types
pub use classifier::ResponseClassifier;
pub use models::*;
