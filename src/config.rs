use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::settings::QrCodeSettings;

const APP_DIR: &str = "qrcraft";
const CONFIG_FILE: &str = "config.toml";
const HISTORY_FILE: &str = "history.json";

/// User configuration, read from `config.toml`.
///
/// ```toml
/// output_dir = "generated"
/// record_history = true
///
/// [defaults]
/// foreground = "#1e1e1e"
/// size = 512
/// errorCorrection = "Q"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where generated images are written when no output path is given.
    pub output_dir: PathBuf,
    /// Whether `generate` adds entries to the history.
    pub record_history: bool,
    /// Overrides the platform data directory location of the history file.
    pub history_file: Option<PathBuf>,
    /// Settings used when a flag is not given on the command line.
    pub defaults: QrCodeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            record_history: true,
            history_file: None,
            defaults: QrCodeSettings::default(),
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.defaults.validate()?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `<config dir>/qrcraft/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// The history file: the configured one, else `<data dir>/qrcraft/history.json`,
    /// else `history.json` in the working directory.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(HISTORY_FILE))
            .unwrap_or_else(|| PathBuf::from(HISTORY_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ErrorCorrection, Rgba};

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r##"
record_history = false
history_file = "/tmp/qr-history.json"

[defaults]
foreground = "#1e1e1e"
size = 512
errorCorrection = "Q"
"##,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.record_history);
        assert_eq!(config.history_path(), PathBuf::from("/tmp/qr-history.json"));
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.defaults.foreground, Rgba([0x1e, 0x1e, 0x1e, 255]));
        assert_eq!(config.defaults.size, 512);
        assert_eq!(config.defaults.error_correction, ErrorCorrection::Q);
        assert_eq!(config.defaults.margin, 4);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "record_history = \"maybe\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::ConfigParse { .. })));

        fs::write(&path, "[defaults]\nforeground = \"#fff\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let mut config = Config::default();
        config.defaults.size = 300;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
