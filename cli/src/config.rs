use std::time::Duration;

use anyhow::{Context, Result, ensure};
use common::logger::LogFormat;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the launchpad gateway.
    pub endpoint: String,

    /// Principal used for balance lookups. Optional: watching and quoting
    /// work anonymously.
    pub principal: Option<String>,

    /// How often `next_token_id` is polled.
    pub poll_interval: Duration,

    /// Bound on a single observer (auto-buy) call. `None` means ten poll intervals.
    pub observer_timeout: Option<Duration>,

    /// Per-request HTTP timeout.
    pub http_timeout: Duration,

    /// JSON in production (`APP_ENV=production`), pretty otherwise.
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ms = |key: &str, default: Option<u64>| -> Result<Option<Duration>> {
            match get(key) {
                Some(v) => {
                    let n: u64 = v
                        .trim()
                        .parse()
                        .with_context(|| format!("{key} must be a number of milliseconds"))?;
                    Ok(Some(Duration::from_millis(n)))
                }
                None => Ok(default.map(Duration::from_millis)),
            }
        };

        // Same cadence the web client used.
        let poll_interval = ms("POLL_INTERVAL_MS", Some(5_000))?.unwrap_or_default();
        ensure!(!poll_interval.is_zero(), "POLL_INTERVAL_MS must be at least 1");

        let observer_timeout = ms("OBSERVER_TIMEOUT_MS", None)?;
        ensure!(
            observer_timeout.is_none_or(|t| !t.is_zero()),
            "OBSERVER_TIMEOUT_MS must be at least 1"
        );

        Ok(Self {
            endpoint: get("LAUNCHPAD_ENDPOINT")
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
            principal: get("LAUNCHPAD_PRINCIPAL").filter(|p| !p.is_empty()),

            poll_interval,
            observer_timeout,
            http_timeout: ms("HTTP_TIMEOUT_MS", Some(5_000))?.unwrap_or_default(),

            log_format: LogFormat::for_app_env(get("APP_ENV").as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let cfg = from_map(&[]).unwrap();

        assert_eq!(cfg.endpoint, "http://127.0.0.1:8080");
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.observer_timeout, None);
        assert_eq!(cfg.http_timeout, Duration::from_secs(5));
        assert!(cfg.principal.is_none());
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_overrides() {
        let cfg = from_map(&[
            ("LAUNCHPAD_ENDPOINT", "https://gw.example"),
            ("LAUNCHPAD_PRINCIPAL", "aaaaa-aa"),
            ("POLL_INTERVAL_MS", "1000"),
            ("OBSERVER_TIMEOUT_MS", "2500"),
            ("APP_ENV", "production"),
        ])
        .unwrap();

        assert_eq!(cfg.endpoint, "https://gw.example");
        assert_eq!(cfg.principal.as_deref(), Some("aaaaa-aa"));
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.observer_timeout, Some(Duration::from_millis(2_500)));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_garbage_durations() {
        let err = from_map(&[("POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_MS"));
    }

    #[test]
    fn rejects_zero_intervals() {
        let err = from_map(&[("POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_MS"));

        let err = from_map(&[("OBSERVER_TIMEOUT_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("OBSERVER_TIMEOUT_MS"));
    }
}
