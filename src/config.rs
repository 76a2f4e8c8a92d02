use crate::aggregator::SelectionStrategy;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://eth.getblock.io/mainnet/";
pub const DEFAULT_WINDOW_SIZE: u64 = 100;
pub const DEFAULT_RATE_LIMIT_INTERVAL_MS: u64 = 25;
pub const DEFAULT_REQUEST_ID: &str = "getblock.io";

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_url: String,
    pub api_key: String,
    pub window_size: u64,
    pub rate_limit_interval: Duration,
    pub request_id: String,
    pub selection: SelectionStrategy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json_rpc_url = lookup("JSON_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let api_key = lookup("RPC_API_KEY").context("RPC_API_KEY must be set in .env")?;

        let window_size = match lookup("SCAN_WINDOW_SIZE") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid SCAN_WINDOW_SIZE: {raw}"))?,
            None => DEFAULT_WINDOW_SIZE,
        };
        if window_size == 0 {
            anyhow::bail!("SCAN_WINDOW_SIZE must be at least 1");
        }

        let interval_ms = match lookup("RATE_LIMIT_INTERVAL_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid RATE_LIMIT_INTERVAL_MS: {raw}"))?,
            None => DEFAULT_RATE_LIMIT_INTERVAL_MS,
        };

        let request_id = lookup("RPC_REQUEST_ID").unwrap_or_else(|| DEFAULT_REQUEST_ID.to_string());

        Ok(Config {
            json_rpc_url,
            api_key,
            window_size,
            rate_limit_interval: Duration::from_millis(interval_ms),
            request_id,
            selection: SelectionStrategy::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = config_from(&[("RPC_API_KEY", "secret")]).unwrap();
        assert_eq!(config.json_rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.window_size, 100);
        assert_eq!(config.rate_limit_interval, Duration::from_millis(25));
        assert_eq!(config.request_id, "getblock.io");
        assert_eq!(config.selection, SelectionStrategy::Permissive);
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("RPC_API_KEY", "secret"),
            ("JSON_RPC_URL", "http://localhost:8545"),
            ("SCAN_WINDOW_SIZE", "3"),
            ("RATE_LIMIT_INTERVAL_MS", "200"),
            ("RPC_REQUEST_ID", "local"),
        ])
        .unwrap();
        assert_eq!(config.json_rpc_url, "http://localhost:8545");
        assert_eq!(config.window_size, 3);
        assert_eq!(config.rate_limit_interval, Duration::from_millis(200));
        assert_eq!(config.request_id, "local");
    }

    #[test]
    fn api_key_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("RPC_API_KEY"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config_from(&[("RPC_API_KEY", "k"), ("SCAN_WINDOW_SIZE", "ten")]).is_err());
        assert!(config_from(&[("RPC_API_KEY", "k"), ("SCAN_WINDOW_SIZE", "0")]).is_err());
        assert!(config_from(&[("RPC_API_KEY", "k"), ("RATE_LIMIT_INTERVAL_MS", "-5")]).is_err());
    }
}
