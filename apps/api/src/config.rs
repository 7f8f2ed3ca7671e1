use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup aborts if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Backends without a key are not registered.
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub backend_timeout_secs: u64,
    pub generation_temperature: f32,
    pub generation_max_tokens: u32,
    pub download_url_ttl_secs: u64,
    pub pandoc_path: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            backend_timeout_secs: parse_env("BACKEND_TIMEOUT_SECS", 60)?,
            generation_temperature: parse_env("GENERATION_TEMPERATURE", 0.3)?,
            generation_max_tokens: parse_env("GENERATION_MAX_TOKENS", 4096)?,
            download_url_ttl_secs: parse_env("DOWNLOAD_URL_TTL_SECS", 3600)?,
            pandoc_path: optional_env("PANDOC_PATH").unwrap_or_else(|| "pandoc".to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn download_url_ttl(&self) -> Duration {
        Duration::from_secs(self.download_url_ttl_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_and_override() {
        std::env::remove_var("LEXDRAFT_TEST_UNSET");
        assert_eq!(parse_env::<u64>("LEXDRAFT_TEST_UNSET", 60).unwrap(), 60);

        std::env::set_var("LEXDRAFT_TEST_TIMEOUT", " 15 ");
        assert_eq!(parse_env::<u64>("LEXDRAFT_TEST_TIMEOUT", 60).unwrap(), 15);

        std::env::set_var("LEXDRAFT_TEST_BAD", "soon");
        let err = parse_env::<u64>("LEXDRAFT_TEST_BAD", 60).unwrap_err();
        assert!(err.to_string().contains("LEXDRAFT_TEST_BAD"));
    }

    #[test]
    fn test_blank_optional_is_absent() {
        std::env::set_var("LEXDRAFT_TEST_BLANK", "   ");
        assert_eq!(optional_env("LEXDRAFT_TEST_BLANK"), None);
    }
}
