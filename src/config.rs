use std::time::Duration;
use tracing::warn;

/// How long a chat message lives in the store
pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(60);

/// How long an idle room stays joinable
pub const DEFAULT_ROOM_TTL: Duration = Duration::from_secs(600);

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(500);

/// Process configuration, read from the environment
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    /// Redis connection URL. `None` selects the in-memory store.
    pub redis_url: Option<String>,
    pub message_ttl: Duration,
    pub room_ttl: Duration,
    /// Sweep period of the in-memory store
    pub sweep_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            redis_url: None,
            message_ttl: DEFAULT_MESSAGE_TTL,
            room_ttl: DEFAULT_ROOM_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RelayConfig {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("FADE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            message_ttl: parse_duration(
                &lookup,
                "FADE_MESSAGE_TTL_SECS",
                Duration::from_secs,
                defaults.message_ttl,
            ),
            room_ttl: parse_duration(
                &lookup,
                "FADE_ROOM_TTL_SECS",
                Duration::from_secs,
                defaults.room_ttl,
            ),
            sweep_interval: parse_duration(
                &lookup,
                "FADE_SWEEP_INTERVAL_MS",
                Duration::from_millis,
                defaults.sweep_interval,
            ),
        }
    }
}

fn parse_duration(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    unit: fn(u64) -> Duration,
    default: Duration,
) -> Duration {
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => unit(value),
        _ => {
            warn!(key = %key, value = %raw, "Invalid duration in environment, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> RelayConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert!(config.redis_url.is_none());
        assert_eq!(config.message_ttl, Duration::from_secs(60));
        assert_eq!(config.room_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("FADE_BIND_ADDR", "127.0.0.1:5050"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("FADE_MESSAGE_TTL_SECS", "5"),
            ("FADE_SWEEP_INTERVAL_MS", "50"),
        ]);
        assert_eq!(config.bind_addr, "127.0.0.1:5050");
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.message_ttl, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("FADE_ROOM_TTL_SECS", "ten minutes"),
            ("FADE_MESSAGE_TTL_SECS", "0"),
            ("REDIS_URL", "  "),
        ]);
        assert_eq!(config.room_ttl, DEFAULT_ROOM_TTL);
        assert_eq!(config.message_ttl, DEFAULT_MESSAGE_TTL);
        assert!(config.redis_url.is_none());
    }
}
