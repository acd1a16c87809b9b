use crate::cache::DEFAULT_TTL_MS;
use crate::error::UpstreamError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bounds accepted by [`RelayConfig::validate`].
pub const MAX_TIMEOUT_MS: u64 = 10 * 60 * 1_000;
pub const MAX_TTL_MS: u64 = 24 * 60 * 60 * 1_000;
pub const MAX_STALE_MS: u64 = 30 * MAX_TTL_MS;
pub const MAX_COOLDOWN_SECS: u64 = 24 * 60 * 60;
pub const MAX_ALERT_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Top-level relay configuration, loaded from TOML.
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub alert: AlertConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Base asset tracked on every venue (e.g. "BTC").
    pub base_asset: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_asset: "BTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub binance_spot_url: String,
    pub binance_futures_url: String,
    pub upbit_url: String,
    pub coinbase_url: String,
    /// Timeout applied to every outbound request.
    pub timeout_ms: u64,
    /// FX providers, tried in order.
    pub fx_providers: Vec<FxProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxProviderConfig {
    pub name: String,
    /// Full URL of a JSON document carrying `rates.KRW` against USD.
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            binance_spot_url: "https://api.binance.com".to_string(),
            binance_futures_url: "https://fapi.binance.com".to_string(),
            upbit_url: "https://api.upbit.com".to_string(),
            coinbase_url: "https://api.coinbase.com".to_string(),
            timeout_ms: 4_000,
            fx_providers: vec![
                FxProviderConfig {
                    name: "open-er-api".to_string(),
                    url: "https://open.er-api.com/v6/latest/USD".to_string(),
                },
                FxProviderConfig {
                    name: "frankfurter".to_string(),
                    url: "https://api.frankfurter.app/latest?from=USD&to=KRW".to_string(),
                },
                FxProviderConfig {
                    name: "exchangerate-host".to_string(),
                    url: "https://api.exchangerate.host/latest?base=USD&symbols=KRW".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
    /// Optional ceiling on the age of a stale fallback value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stale_ms: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Result<Duration, UpstreamError> {
        millis("cache.ttl_ms", self.ttl_ms)
    }

    pub fn max_stale(&self) -> Result<Option<Duration>, UpstreamError> {
        self.max_stale_ms
            .map(|ms| millis("cache.max_stale_ms", ms))
            .transpose()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS as u64,
            max_stale_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub cooldown_secs: u64,
    /// Run the alert check in-process on this interval. Unset means an
    /// external scheduler drives `/alert-check`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl AlertConfig {
    pub fn cooldown(&self) -> Result<Duration, UpstreamError> {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| out_of_range("alert.cooldown_secs", self.cooldown_secs))
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 600,
            interval_secs: None,
        }
    }
}

fn millis(key: &str, ms: u64) -> Result<Duration, UpstreamError> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .ok_or_else(|| out_of_range(key, ms))
}

fn out_of_range(key: &str, value: u64) -> UpstreamError {
    UpstreamError::InvalidConfiguration(format!("{key} = {value} is out of range"))
}

fn check_max(key: &str, value: u64, max: u64) -> Result<(), UpstreamError> {
    if value > max {
        return Err(UpstreamError::InvalidConfiguration(format!(
            "{key} = {value} exceeds the maximum of {max}"
        )));
    }
    Ok(())
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] UpstreamError),
}

impl RelayConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<(), UpstreamError> {
        let urls = [
            ("upstream.binance_spot_url", &self.upstream.binance_spot_url),
            ("upstream.binance_futures_url", &self.upstream.binance_futures_url),
            ("upstream.upbit_url", &self.upstream.upbit_url),
            ("upstream.coinbase_url", &self.upstream.coinbase_url),
        ];
        for (key, url) in urls {
            if url.trim().is_empty() {
                return Err(UpstreamError::MissingConfiguration(key.to_string()));
            }
        }

        if self.upstream.fx_providers.is_empty() {
            return Err(UpstreamError::MissingConfiguration(
                "upstream.fx_providers".to_string(),
            ));
        }
        if let Some(p) = self.upstream.fx_providers.iter().find(|p| p.url.trim().is_empty()) {
            return Err(UpstreamError::MissingConfiguration(format!(
                "upstream.fx_providers[{}].url",
                p.name
            )));
        }
        if self.market.base_asset.trim().is_empty() {
            return Err(UpstreamError::MissingConfiguration("market.base_asset".to_string()));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(UpstreamError::MissingConfiguration("upstream.timeout_ms".to_string()));
        }
        if self.cache.ttl_ms == 0 {
            return Err(UpstreamError::MissingConfiguration("cache.ttl_ms".to_string()));
        }

        check_max("upstream.timeout_ms", self.upstream.timeout_ms, MAX_TIMEOUT_MS)?;
        check_max("cache.ttl_ms", self.cache.ttl_ms, MAX_TTL_MS)?;
        if let Some(ms) = self.cache.max_stale_ms {
            check_max("cache.max_stale_ms", ms, MAX_STALE_MS)?;
        }
        check_max("alert.cooldown_secs", self.alert.cooldown_secs, MAX_COOLDOWN_SECS)?;
        if let Some(secs) = self.alert.interval_secs {
            check_max("alert.interval_secs", secs, MAX_ALERT_INTERVAL_SECS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = RelayConfig::from_toml("").unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.cache.ttl_ms, 5_000);
        assert_eq!(config.upstream.timeout_ms, 4_000);
        assert_eq!(config.alert.cooldown_secs, 600);
        assert_eq!(config.upstream.fx_providers.len(), 3);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8787");
    }

    #[test]
    fn test_partial_override() {
        let config = RelayConfig::from_toml(
            r#"
            [server]
            port = 9000

            [cache]
            ttl_ms = 2500
            max_stale_ms = 600000

            [[upstream.fx_providers]]
            name = "only"
            url = "http://127.0.0.1:1/fx"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.ttl_ms, 2500);
        assert_eq!(config.cache.max_stale_ms, Some(600_000));
        assert_eq!(config.upstream.fx_providers.len(), 1);
        assert_eq!(config.upstream.binance_spot_url, "https://api.binance.com");
    }

    #[test]
    fn test_missing_base_url_rejected() {
        let err = RelayConfig::from_toml(
            r#"
            [upstream]
            binance_futures_url = ""
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid(UpstreamError::MissingConfiguration(key)) => {
                assert_eq!(key, "upstream.binance_futures_url")
            }
            other => panic!("Expected missing configuration, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = RelayConfig::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(RelayConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let cases = [
            ("[cache]\nttl_ms = 9223372036854775807", "cache.ttl_ms"),
            ("[cache]\nmax_stale_ms = 9223372036854775807", "cache.max_stale_ms"),
            ("[alert]\ncooldown_secs = 100000000000000000", "alert.cooldown_secs"),
            ("[alert]\ninterval_secs = 100000000000000000", "alert.interval_secs"),
            ("[upstream]\ntimeout_ms = 9223372036854775807", "upstream.timeout_ms"),
        ];
        for (raw, key) in cases {
            match RelayConfig::from_toml(raw).unwrap_err() {
                ConfigError::Invalid(UpstreamError::InvalidConfiguration(msg)) => {
                    assert!(msg.starts_with(key), "{msg}")
                }
                other => panic!("Expected invalid configuration for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_upper_bounds_are_accepted_and_convert() {
        let config = RelayConfig::from_toml(&format!(
            "[cache]\nttl_ms = {MAX_TTL_MS}\nmax_stale_ms = {MAX_STALE_MS}\n[alert]\ncooldown_secs = {MAX_COOLDOWN_SECS}\n"
        ))
        .unwrap();
        assert_eq!(config.cache.ttl().unwrap(), Duration::days(1));
        assert_eq!(config.cache.max_stale().unwrap(), Some(Duration::days(30)));
        assert_eq!(config.alert.cooldown().unwrap(), Duration::days(1));
    }

    #[test]
    fn test_duration_conversion_never_wraps() {
        let cache = CacheConfig {
            ttl_ms: u64::MAX,
            max_stale_ms: Some(u64::MAX),
        };
        assert_eq!(cache.ttl().unwrap_err().kind(), "invalid_configuration");
        assert_eq!(cache.max_stale().unwrap_err().kind(), "invalid_configuration");

        let alert = AlertConfig {
            cooldown_secs: u64::MAX,
            interval_secs: None,
        };
        assert_eq!(alert.cooldown().unwrap_err().kind(), "invalid_configuration");
    }
}
