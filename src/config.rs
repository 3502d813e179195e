use std::{io, path::Path, path::PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't find a home directory for the config")]
    NoProjectDirs,
    #[error("couldn't access config file {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// printed before every line read from stdin
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// chrono format string for insertion timestamps
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: LevelFilter,
}

fn default_prompt() -> String {
    "Alarm> ".to_string()
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

const fn default_log_level() -> LevelFilter {
    LevelFilter::Info
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            time_format: default_time_format(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read or isn't a valid config
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(toml::from_str(&config)?)
    }

    /// like [`Config::load`] but a missing file means the defaults
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config dir or file can't be written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(path, config).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
    }

    /// # Errors
    /// if there is no home directory to put the config in
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "roosty_alarm")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            prompt: "> ".to_string(),
            time_format: "%l:%M %p".to_string(),
            log_level: LevelFilter::Debug,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str("prompt = \"? \"").unwrap();
        assert_eq!(config.prompt, "? ");
        assert_eq!(config.time_format, default_time_format());
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::new());
        assert!(matches!(
            Config::load(&dir.path().join("nope.toml")),
            Err(ConfigError::Io(..))
        ));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "prompt = [").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
