use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Top-level server configuration, loaded from `sabotage.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Allowed browser origin for CORS. `None` allows any origin.
    pub cors_origin: Option<String>,
    pub game: GameConfig,
    pub rooms: RoomsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            cors_origin: None,
            game: GameConfig::default(),
            rooms: RoomsConfig::default(),
        }
    }
}

/// Game rules and timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub total_rounds: u32,
    pub round_duration_secs: u64,
    pub vote_duration_secs: u64,
    pub min_players: usize,
    pub max_players: usize,
    /// Pause between rounds so clients can show the round summary.
    pub round_interstitial_secs: u64,
    /// Pause between a passing fix and the end of the round.
    pub fix_result_delay_secs: u64,
    pub validation_timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: 3,
            round_duration_secs: 90,
            vote_duration_secs: 60,
            min_players: 3,
            max_players: 6,
            round_interstitial_secs: 5,
            fix_result_delay_secs: 3,
            validation_timeout_ms: 2000,
        }
    }
}

impl GameConfig {
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_duration_secs)
    }

    pub fn vote_duration(&self) -> Duration {
        Duration::from_secs(self.vote_duration_secs)
    }

    pub fn round_interstitial(&self) -> Duration {
        Duration::from_secs(self.round_interstitial_secs)
    }

    pub fn fix_result_delay(&self) -> Duration {
        Duration::from_secs(self.fix_result_delay_secs)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }
}

/// Room lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// How long an empty room survives waiting for a reconnect.
    pub empty_room_grace_secs: u64,
    /// Rooms older than this are deleted unconditionally.
    pub idle_room_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            empty_room_grace_secs: 30,
            idle_room_ttl_secs: 2 * 60 * 60,
            cleanup_interval_secs: 30 * 60,
        }
    }
}

impl RoomsConfig {
    pub fn empty_room_grace(&self) -> Duration {
        Duration::from_secs(self.empty_room_grace_secs)
    }

    pub fn idle_room_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_room_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl ServerConfig {
    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
                path: shown.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %shown, "Config file not found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: shown,
                    source,
                })
            }
        };

        if let Ok(port) = std::env::var("PORT") {
            config.override_port(&port);
        }

        info!(listen_addr = %config.listen_addr, "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn override_port(&mut self, port: &str) {
        let host = self
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.listen_addr = format!("{}:{}", host, port.trim());
    }
}
