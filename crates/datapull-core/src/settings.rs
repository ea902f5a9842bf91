use std::collections::HashMap;

use config::{Config, Environment};
use serde::Deserialize;

use crate::{Error, Result};

/// Process configuration, read from the environment (after `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub database_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub api_port: u16,
    pub cors_origins: String,
    pub worker_concurrency: usize,
    pub job_timeout_secs: u64,
    pub nominatim_url: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::default())
    }

    /// Same as [`Settings::from_env`] but reading `vars` instead of the
    /// process environment. Keys use the environment spelling (`REDIS_PORT`).
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::default().source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("redis_host", "redis")
            .and_then(|b| b.set_default("redis_port", 6379))
            .and_then(|b| b.set_default("api_port", 8000))
            .and_then(|b| b.set_default("cors_origins", "*"))
            .and_then(|b| b.set_default("worker_concurrency", 1))
            .and_then(|b| b.set_default("job_timeout_secs", 3600))
            .and_then(|b| b.set_default("nominatim_url", "https://nominatim.openstreetmap.org"))
            .map_err(|e| Error::Config(e.to_string()))?
            .add_source(environment)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;

        if settings.worker_concurrency == 0 {
            return Err(Error::Config("WORKER_CONCURRENCY must be at least 1".to_string()));
        }
        Ok(settings)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/0", self.redis_host, self.redis_port)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        required(&self.api_key, "API_KEY")
    }

    pub fn require_google_maps_api_key(&self) -> Result<&str> {
        required(&self.google_maps_api_key, "GOOGLE_MAPS_API_KEY")
    }

    pub fn require_database_url(&self) -> Result<&str> {
        required(&self.database_url, "DATABASE_URL")
    }

    /// `None` means any origin.
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(HashMap::new()).unwrap();
        assert_eq!(settings.redis_host, "redis");
        assert_eq!(settings.redis_port, 6379);
        assert_eq!(settings.api_port, 8000);
        assert_eq!(settings.worker_concurrency, 1);
        assert_eq!(settings.job_timeout_secs, 3600);
        assert_eq!(settings.redis_url(), "redis://redis:6379/0");
        assert!(settings.cors_origin_list().is_none());
        assert!(settings.require_api_key().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_vars(vars(&[
            ("API_KEY", "secret"),
            ("GOOGLE_MAPS_API_KEY", "gmaps"),
            ("REDIS_HOST", "localhost"),
            ("REDIS_PORT", "6380"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();

        assert_eq!(settings.require_api_key().unwrap(), "secret");
        assert_eq!(settings.require_google_maps_api_key().unwrap(), "gmaps");
        assert_eq!(settings.redis_url(), "redis://localhost:6380/0");
        assert_eq!(
            settings.cors_origin_list(),
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(Settings::from_vars(vars(&[("REDIS_PORT", "not-a-port")])).is_err());
        assert!(Settings::from_vars(vars(&[("WORKER_CONCURRENCY", "0")])).is_err());
    }
}
