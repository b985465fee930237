use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::tickets::redis_store::DEFAULT_TICKET_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketBackend {
    Redis,
    Http,
    Memory,
}

impl FromStr for TicketBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(TicketBackend::Redis),
            "http" => Ok(TicketBackend::Http),
            "memory" => Ok(TicketBackend::Memory),
            other => bail!("Unknown TICKET_BACKEND '{other}' (expected redis, http or memory)"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every setting has a default except `TICKET_API_URL`, which the http
/// backend requires.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub redis_url: String,
    pub ticket_backend: TicketBackend,
    pub ticket_storage_key: String,
    pub ticket_api_url: Option<String>,
    pub ticket_api_token: Option<String>,
    /// Simulated "typing" pause before each bot reply.
    pub typing_delay: Duration,
    /// Pause between the escalation acknowledgement and the email prompt.
    pub handoff_delay: Duration,
    /// At least 1.
    pub escalation_threshold: u32,
    /// Sessions unused for this long are evicted.
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            ticket_backend: parse_env("TICKET_BACKEND", TicketBackend::Redis)?,
            ticket_storage_key: std::env::var("TICKET_STORAGE_KEY")
                .unwrap_or_else(|_| DEFAULT_TICKET_KEY.to_string()),
            ticket_api_url: optional_env("TICKET_API_URL"),
            ticket_api_token: optional_env("TICKET_API_TOKEN"),
            typing_delay: Duration::from_millis(parse_env("TYPING_DELAY_MS", 1000)?),
            handoff_delay: Duration::from_millis(parse_env("HANDOFF_DELAY_MS", 1500)?),
            escalation_threshold: at_least(
                "ESCALATION_THRESHOLD",
                parse_env("ESCALATION_THRESHOLD", 2)?,
                1,
            )?,
            session_idle_ttl: Duration::from_secs(at_least(
                "SESSION_IDLE_TTL_SECS",
                parse_env("SESSION_IDLE_TTL_SECS", 1800)?,
                1,
            )?),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'"))
}

fn at_least<T>(key: &str, value: T, min: T) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min {
        return Err(anyhow::anyhow!("must be at least {min}, got {value}"))
            .with_context(|| format!("Environment variable '{key}' is out of range"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_backend_parses_case_insensitively() {
        assert_eq!("Redis".parse::<TicketBackend>().unwrap(), TicketBackend::Redis);
        assert_eq!(" http ".parse::<TicketBackend>().unwrap(), TicketBackend::Http);
        assert_eq!("MEMORY".parse::<TicketBackend>().unwrap(), TicketBackend::Memory);
    }

    #[test]
    fn test_unknown_ticket_backend_fails() {
        let err = "postgres".parse::<TicketBackend>().unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn test_parse_value_number() {
        let port: u16 = parse_value("PORT", "9090").unwrap();
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_parse_value_error_names_variable() {
        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(format!("{err:#}").contains("PORT"));
    }

    #[test]
    fn test_parse_value_rejects_out_of_range() {
        assert!(parse_value::<u16>("PORT", "70000").is_err());
    }

    #[test]
    fn test_zero_escalation_threshold_is_rejected() {
        let threshold: u32 = parse_value("ESCALATION_THRESHOLD", "0").unwrap();
        let err = at_least("ESCALATION_THRESHOLD", threshold, 1).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("ESCALATION_THRESHOLD"));
        assert!(message.contains("at least 1"));
    }

    #[test]
    fn test_at_least_accepts_minimum() {
        assert_eq!(at_least("ESCALATION_THRESHOLD", 1u32, 1).unwrap(), 1);
        assert_eq!(at_least("SESSION_IDLE_TTL_SECS", 1800u64, 1).unwrap(), 1800);
    }
}
