use std::env::var_os;
use std::ffi::OsString;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Serialize, Deserialize};
use log::{info, warn};
use thiserror::Error;
use fidget_hal::MAX_ADDRESS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("slave address {0:#04x} does not fit in 7 bits")]
    AddressOutOfRange(u8),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// The I2C bus number, as in `/dev/i2c-<bus>`.
    pub bus: u8,
    /// The 7-bit address of the microcontroller.
    pub slave_address: u8,
    /// How long to sleep between two polls.
    pub poll_interval_ms: u64,
    /// Whether to read a status byte back after every keystroke.
    pub read_status: bool,
    /// Use a software loopback bus instead of real hardware.
    pub dry_run: bool,
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "fidget.json";

    /// Gets the config file path from `CONFIG_FILE`, falling back to [Self::DEFAULT_PATH].
    pub fn path() -> PathBuf {
        var_os("CONFIG_FILE")
            .unwrap_or_else(|| OsString::from(Self::DEFAULT_PATH))
            .into()
    }

    /// Loads the config from `path`, or returns `None` if there is no such file.
    pub fn try_load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Loads the config from `path`, writing the defaults there if the file is
    /// missing, then applies the overrides found through `lookup` and validates
    /// the result.
    pub fn load_or_create(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match Self::try_load(path)? {
            Some(config) => {
                info!("Config loaded.");
                config
            }
            None => {
                info!("Config not found. Using default");
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => info!("Default config saved."),
                    Err(e) => warn!("Could not save default config: {}", e),
                }
                config
            }
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the `FIDGET_*` overrides found through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("FIDGET_I2C_BUS") {
            self.bus = parse_int(&value)
                .map_err(|_| invalid("FIDGET_I2C_BUS", value))?;
        }
        if let Some(value) = lookup("FIDGET_SLAVE_ADDRESS") {
            self.slave_address = parse_int(&value)
                .map_err(|_| invalid("FIDGET_SLAVE_ADDRESS", value))?;
        }
        if let Some(value) = lookup("FIDGET_POLL_MS") {
            self.poll_interval_ms = value.trim().parse()
                .map_err(|_| invalid("FIDGET_POLL_MS", value))?;
        }
        if let Some(value) = lookup("FIDGET_DRY_RUN") {
            self.dry_run = parse_flag(&value)
                .ok_or_else(|| invalid("FIDGET_DRY_RUN", value))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slave_address > MAX_ADDRESS {
            return Err(ConfigError::AddressOutOfRange(self.slave_address));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bus: 1,
            slave_address: 0x04,
            poll_interval_ms: 50,
            read_status: true,
            dry_run: false,
        }
    }
}

fn invalid(name: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { name, value }
}

/// Parses a decimal or `0x`-prefixed hexadecimal byte.
fn parse_int(value: &str) -> Result<u8, ParseIntError> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_robot_wiring() {
        let config = Config::default();
        assert_eq!(config.bus, 1);
        assert_eq!(config.slave_address, 0x04);
        assert!(config.read_status);
        assert!(!config.dry_run);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let loaded = Config::try_load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");
        let config = Config { bus: 3, slave_address: 0x10, ..Config::default() };

        config.save(&path).unwrap();
        assert_eq!(Config::try_load(&path).unwrap(), Some(config));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");
        std::fs::write(&path, r#"{ "dry_run": true }"#).unwrap();

        let config = Config::try_load(&path).unwrap().unwrap();
        assert!(config.dry_run);
        assert_eq!(config.slave_address, 0x04);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");
        std::fs::write(&path, "{ bus: ").unwrap();

        assert!(matches!(Config::try_load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("FIDGET_I2C_BUS", "0"),
                ("FIDGET_SLAVE_ADDRESS", "0x2A"),
                ("FIDGET_POLL_MS", "10"),
                ("FIDGET_DRY_RUN", "true"),
            ]))
            .unwrap();

        assert_eq!(config.bus, 0);
        assert_eq!(config.slave_address, 0x2A);
        assert_eq!(config.poll_interval_ms, 10);
        assert!(config.dry_run);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("FIDGET_SLAVE_ADDRESS", "four")]))
            .unwrap_err();
        assert_eq!(err.to_string(), r#"invalid value for FIDGET_SLAVE_ADDRESS: "four""#);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");

        let config = Config::load_or_create(&path, env(&[("FIDGET_POLL_MS", "20")])).unwrap();

        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.slave_address, 0x04);
        // Overrides are not persisted.
        assert_eq!(Config::try_load(&path).unwrap(), Some(Config::default()));
    }

    #[test]
    fn existing_file_is_used_and_overridden() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");
        std::fs::write(&path, r#"{ "bus": 3, "slave_address": 16 }"#).unwrap();

        let config = Config::load_or_create(&path, env(&[("FIDGET_DRY_RUN", "on")])).unwrap();

        assert_eq!(config.bus, 3);
        assert_eq!(config.slave_address, 0x10);
        assert!(config.dry_run);
    }

    #[test]
    fn unsaveable_default_is_still_used() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("fidget.json");

        let config = Config::load_or_create(&path, env(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert!(!path.exists());
    }

    #[test]
    fn loaded_config_is_validated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fidget.json");

        let err = Config::load_or_create(&path, env(&[("FIDGET_SLAVE_ADDRESS", "0X80")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::AddressOutOfRange(0x80)));
    }

    #[test]
    fn rejects_wide_addresses() {
        let config = Config { slave_address: 0x80, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::AddressOutOfRange(0x80))));
        assert!(Config::default().validate().is_ok());
    }
}
