use std::path::PathBuf;
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for ripped albums (overrides `~/Music`).
    pub save_root: Option<PathBuf>,
    /// CD device to use when none is given on the command line.
    pub device: Option<String>,
    /// Default output format: "flac", "wav", "mp3" or "ogg".
    pub format: Option<String>,
    /// Run a ReplayGain scan over FLAC rips.
    pub replay_gain: bool,
    /// Rip the hidden pre-gap track when the TOC reports one.
    pub rip_hidden: bool,
    /// Eject the disc after the session completes.
    pub auto_eject: bool,
    /// Timeout for provider HTTP requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_root: None,
            device: None,
            format: None,
            replay_gain: true,
            rip_hidden: true,
            auto_eject: true,
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/spindown/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default save root: the XDG music directory, falling back
/// to `~/Music`, falling back to `./Music`.
pub fn default_save_root() -> PathBuf {
    if let Some(dirs) = UserDirs::new() {
        if let Some(audio) = dirs.audio_dir() {
            return audio.to_path_buf();
        }
        return dirs.home_dir().join("Music");
    }
    PathBuf::from("Music")
}
