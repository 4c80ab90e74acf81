//! Configuration module - environment variable parsing

use std::env;
use std::time::Duration;

/// Default relay endpoint when `RELAY_URL` is not set
const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:3000/ws";
/// Default avatar manifest path
const DEFAULT_ASSET_MANIFEST: &str = "assets/xbot.json";
/// Default frame rate for the tick loop
const DEFAULT_TICK_RATE: u32 = 60;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Relay websocket URL
    pub relay_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Path to the avatar asset manifest
    pub asset_manifest: String,
    /// Frames per second for the tick loop
    pub tick_rate: u32,
    /// Max outbound `move` events per second (None = every changed tick)
    pub move_rate_limit: Option<u32>,
    /// Fixed seed for spawn placement
    pub spawn_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let tick_rate = match env::var("TICK_RATE") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|rate| *rate > 0)
                .ok_or(ConfigError::Invalid("TICK_RATE"))?,
            Err(_) => DEFAULT_TICK_RATE,
        };

        let move_rate_limit = match env::var("MOVE_RATE_LIMIT") {
            Ok(raw) => {
                let limit = raw
                    .parse::<u32>()
                    .map_err(|_| ConfigError::Invalid("MOVE_RATE_LIMIT"))?;
                (limit > 0).then_some(limit)
            }
            Err(_) => None,
        };

        let spawn_seed = match env::var("SPAWN_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("SPAWN_SEED"))?,
            ),
            Err(_) => None,
        };

        let relay_url = env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string());
        if !(relay_url.starts_with("ws://") || relay_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid("RELAY_URL"));
        }

        Ok(Self {
            relay_url,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            asset_manifest: env::var("ASSET_MANIFEST")
                .unwrap_or_else(|_| DEFAULT_ASSET_MANIFEST.to_string()),
            tick_rate,
            move_rate_limit,
            spawn_seed,
        })
    }

    /// Interval between frames of the tick loop
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate as u64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            log_level: "info".to_string(),
            asset_manifest: DEFAULT_ASSET_MANIFEST.to_string(),
            tick_rate: DEFAULT_TICK_RATE,
            move_rate_limit: None,
            spawn_seed: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_matches_sixty_fps() {
        let config = Config::default();
        assert_eq!(config.tick_interval(), Duration::from_micros(16_666));
        assert!(config.move_rate_limit.is_none());
    }
}
