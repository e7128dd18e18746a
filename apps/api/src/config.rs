use anyhow::{anyhow, Context, Result};

use crate::batch::exam_numbers::ExamNumberPolicy;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on blank copies per request.
    pub max_copies: u32,
    pub max_batch_students: usize,
    pub exam_number_policy: ExamNumberPolicy,
    /// Printed when a request leaves `school_name` empty.
    pub default_school_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_copies: 100,
            max_batch_students: 1000,
            exam_number_policy: ExamNumberPolicy::Unique,
            default_school_name: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_copies: parse_env("MAX_COPIES", defaults.max_copies)?,
            max_batch_students: parse_env("MAX_BATCH_STUDENTS", defaults.max_batch_students)?,
            exam_number_policy: match std::env::var("EXAM_NUMBER_POLICY") {
                Ok(raw) => raw.parse::<ExamNumberPolicy>().map_err(|e| anyhow!(e))?,
                Err(_) => defaults.exam_number_policy,
            },
            default_school_name: std::env::var("DEFAULT_SCHOOL_NAME")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
