//! TOML configuration loading.
//!
//! The config file lives at `$CHORDPAD_CONFIG` or, by default,
//! `<config dir>/chordpad/chordpad.toml`. A missing file means defaults; a
//! file that exists but does not parse is fatal, because silently falling
//! back to defaults would mask a typo in a setting the user relies on.

use crate::chord::AxisSettings;
use evdev::Key;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub axis: AxisSettings,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct DeviceConfig {
    /// Explicit evdev node to open; autodetect when absent.
    pub input_path: Option<PathBuf>,

    /// Name the virtual output keyboard registers under.
    pub output_name: String,

    /// Key code of the mode toggle button.
    pub toggle_code: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_name: "chordpad virtual keyboard".to_string(),
            toggle_code: Key::BTN_MODE.code(),
        }
    }
}

impl Config {
    /// Loads the config from disk, falling back to defaults when no file
    /// exists.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = Self::config_path() else {
            info!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let mut config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.axis = config.axis.sanitized();
        info!("Loaded config from {}", path.display());
        debug!("{:?}", config);
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CHORDPAD_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("chordpad").join("chordpad.toml"))
    }

    pub fn toggle_key(&self) -> Key {
        Key::new(self.device.toggle_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_mode_button_and_autodetect() {
        let config = Config::default();
        assert_eq!(config.toggle_key(), Key::BTN_MODE);
        assert!(config.device.input_path.is_none());
        assert_eq!(config.axis.threshold, 64);
        assert_eq!(config.axis.hysteresis, 20);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [axis]
            threshold = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.axis.threshold, 80);
        assert_eq!(config.axis.hysteresis, 20);
        assert_eq!(config.toggle_key(), Key::BTN_MODE);
    }

    #[test]
    fn full_file_parses_every_field() {
        let config: Config = toml::from_str(
            r#"
            [device]
            input_path = "/dev/input/event7"
            output_name = "test keyboard"
            toggle_code = 314

            [axis]
            threshold = 70
            hysteresis = 10
            "#,
        )
        .unwrap();
        assert_eq!(
            config.device.input_path,
            Some(PathBuf::from("/dev/input/event7"))
        );
        assert_eq!(config.device.output_name, "test keyboard");
        assert_eq!(config.toggle_key(), Key::BTN_SELECT);
        assert_eq!(config.axis.hysteresis, 10);
    }

    #[test]
    fn unusable_axis_pair_is_replaced_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [axis]
            threshold = 40
            hysteresis = 50
            "#,
        )
        .unwrap();
        let axis = config.axis.sanitized();
        assert_eq!(axis.threshold, 64);
        assert_eq!(axis.hysteresis, 20);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let result = toml::from_str::<Config>("axis = \"not a table\"");
        assert!(result.is_err());
    }
}
