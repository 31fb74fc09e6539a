//! Application-level configuration loading: game defaults, chat limits and timeouts.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::FieldSize;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FOOTYCHAT_BACK_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Game length used when a game is created without one, in minutes.
    pub default_game_duration_minutes: u16,
    pub default_min_players: u8,
    pub default_max_players: u8,
    pub default_field_size: FieldSize,
    /// Games can no longer be cancelled this close to kick-off.
    pub cancellation_cutoff_hours: u16,
    /// Spacing between candidate kick-offs when listing free slots.
    pub slot_step_minutes: u16,
    pub chat_page_size: u16,
    /// Buffered events per group room before slow subscribers lag.
    pub room_capacity: usize,
    pub identification_timeout_secs: u64,
    /// How long a write waits for another write on the same document.
    pub lock_timeout_ms: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// How long a fresh WebSocket may stay silent before identifying.
    pub fn identification_timeout(&self) -> Duration {
        Duration::from_secs(self.identification_timeout_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_game_duration_minutes: 90,
            default_min_players: 10,
            default_max_players: 14,
            default_field_size: FieldSize::SevenASide,
            cancellation_cutoff_hours: 2,
            slot_step_minutes: 30,
            chat_page_size: 50,
            room_capacity: 64,
            identification_timeout_secs: 10,
            lock_timeout_ms: 5_000,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
