use anyhow::Context;

use crate::tracker::{DEFAULT_TRIAL_DAYS, TrackerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

#[derive(Debug)]
pub struct Config {
    pub db_connection_string: String,
    pub bind_addr: String,
    pub public_url: String,
    pub trial_days: i64,
    pub storage: StorageKind,
}

const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://khatma.sqlite?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `load` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_connection_string =
            lookup("DB_CONNECTION_STRING").unwrap_or(DEFAULT_DB_CONNECTION_STRING.into());
        let bind_addr = lookup("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.into());
        let public_url = lookup("PUBLIC_URL").unwrap_or(DEFAULT_PUBLIC_URL.into());
        let trial_days = match lookup("TRIAL_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid TRIAL_DAYS: {}", raw))?,
            None => DEFAULT_TRIAL_DAYS,
        };
        let storage = match lookup("STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("sqlite") => StorageKind::Sqlite,
            Some("memory") => StorageKind::Memory,
            Some(other) => anyhow::bail!("Invalid STORAGE: {} (expected sqlite or memory)", other),
        };
        Ok(Config {
            db_connection_string,
            bind_addr,
            public_url,
            trial_days,
            storage,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage == StorageKind::Sqlite && self.db_connection_string.is_empty() {
            return Err("DB_CONNECTION_STRING is missing".into());
        }
        if self.bind_addr.is_empty() {
            return Err("BIND_ADDR is missing".into());
        }
        if self.trial_days < 0 {
            return Err("TRIAL_DAYS must not be negative".into());
        }
        Ok(())
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            trial_days: self.trial_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.db_connection_string, DEFAULT_DB_CONNECTION_STRING);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.trial_days, 3);
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = config_from(&[("TRIAL_DAYS", "7"), ("STORAGE", "memory")]).unwrap();
        assert_eq!(config.tracker_settings().trial_days, 7);
        assert_eq!(config.storage, StorageKind::Memory);

        assert!(config_from(&[("TRIAL_DAYS", "three")]).is_err());
        assert!(config_from(&[("STORAGE", "redis")]).is_err());
        assert!(config_from(&[("TRIAL_DAYS", "-1")]).unwrap().validate().is_err());
    }
}
