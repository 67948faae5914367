//! Environment-driven configuration
//!
//! An absent store URI is not an error: the corresponding adapter is
//! simply never registered, and the health endpoint reports it as
//! unconfigured.

use std::env;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<String>,
    pub mongodb_uri: Option<String>,
    pub mysql_uri: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            groq_api_key: non_empty_var("GROQ_API_KEY"),
            mongodb_uri: non_empty_var("MONGODB_URI"),
            mysql_uri: non_empty_var("MYSQL_URI"),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
