//! Runtime settings, read from `CROSSMODAL_*` environment variables.

use crate::application::repository::{DEFAULT_BATCH_SIZE, DEFAULT_READ_ALL_LIMIT};
use crate::application::retry::RetryPolicy;
use crate::domain::error::DomainError;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DIMENSION: usize = 256;
pub const DEFAULT_DB_PATH: &str = "./crossmodal.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite { path: String },
    Weaviate { url: Option<String>, collection: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderBackend {
    Hashing,
    Http { url: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreBackend,
    pub encoder: EncoderBackend,
    pub dimension: usize,
    pub batch_size: usize,
    pub read_all_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreBackend::Sqlite { path: DEFAULT_DB_PATH.to_string() },
            encoder: EncoderBackend::Hashing,
            dimension: DEFAULT_DIMENSION,
            batch_size: DEFAULT_BATCH_SIZE,
            read_all_limit: DEFAULT_READ_ALL_LIMIT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, DomainError> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with("CROSSMODAL_"))
            .collect();
        Self::from_vars(&vars)
    }

    /// Builds settings from a variable map; unset keys take defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, DomainError> {
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();
        let defaults = Settings::default();

        let store = match get("CROSSMODAL_STORE").as_deref().unwrap_or("sqlite") {
            "sqlite" => StoreBackend::Sqlite {
                path: get("CROSSMODAL_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            },
            "weaviate" => StoreBackend::Weaviate {
                url: get("CROSSMODAL_WEAVIATE_URL"),
                collection: get("CROSSMODAL_COLLECTION"),
            },
            other => return Err(DomainError::Config(format!("Unknown store backend: {other}"))),
        };

        let encoder = match get("CROSSMODAL_ENCODER").as_deref().unwrap_or("hashing") {
            "hashing" => EncoderBackend::Hashing,
            "http" => EncoderBackend::Http { url: get("CROSSMODAL_ENCODER_URL") },
            other => return Err(DomainError::Config(format!("Unknown encoder backend: {other}"))),
        };

        let dimension = parse_or(vars, "CROSSMODAL_DIMENSION", defaults.dimension)?;
        if dimension == 0 {
            return Err(DomainError::Config("CROSSMODAL_DIMENSION must be positive".into()));
        }

        let base_ms: u64 = parse_or(
            vars,
            "CROSSMODAL_RETRY_BASE_MS",
            defaults.retry.base_delay.as_millis() as u64,
        )?;
        let timeout_ms: Option<u64> = get("CROSSMODAL_ATTEMPT_TIMEOUT_MS")
            .map(|v| parse_value("CROSSMODAL_ATTEMPT_TIMEOUT_MS", &v))
            .transpose()?;
        let retry = RetryPolicy::default()
            .with_max_attempts(parse_or(vars, "CROSSMODAL_MAX_ATTEMPTS", defaults.retry.max_attempts)?)
            .with_base_delay(Duration::from_millis(base_ms))
            .with_attempt_timeout(timeout_ms.map(Duration::from_millis));

        Ok(Self {
            store,
            encoder,
            dimension,
            batch_size: parse_or(vars, "CROSSMODAL_BATCH_SIZE", defaults.batch_size)?,
            read_all_limit: parse_or(vars, "CROSSMODAL_READ_ALL_LIMIT", defaults.read_all_limit)?,
            retry,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DomainError::Config(format!("{key}={value}: {e}")))
}

fn parse_or<T: FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    match vars.get(key).filter(|v| !v.trim().is_empty()) {
        Some(v) => parse_value(key, v),
        None => Ok(default),
    }
}
