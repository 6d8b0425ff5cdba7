use std::env;
use std::str::FromStr;

use crate::engine::matching::MatchingSettings;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}, expected compact or json")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub max_radius_km: Option<f64>,
    pub ranking_limit: usize,
    pub history_capacity: usize,
    pub history_default_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            event_buffer_size: 1024,
            max_radius_km: None,
            ranking_limit: 10,
            history_capacity: 500,
            history_default_limit: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or_default("LOG_FORMAT", defaults.log_format)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            max_radius_km: parse_optional("MAX_RADIUS_KM")?,
            ranking_limit: parse_or_default("RANKING_LIMIT", defaults.ranking_limit)?,
            history_capacity: parse_or_default("HISTORY_CAPACITY", defaults.history_capacity)?,
            history_default_limit: parse_or_default(
                "HISTORY_DEFAULT_LIMIT",
                defaults.history_default_limit,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(radius) = self.max_radius_km {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(AppError::Internal(format!(
                    "invalid MAX_RADIUS_KM: {radius} must be a positive distance"
                )));
            }
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be > 0".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(AppError::Internal(
                "invalid HISTORY_CAPACITY: must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn matching(&self) -> MatchingSettings {
        MatchingSettings {
            max_radius_km: self.max_radius_km,
            ranking_limit: self.ranking_limit,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(None),
    }
}
