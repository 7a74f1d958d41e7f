use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{PanelError, Result};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory where the key/value store keeps its data
    pub data_dir: PathBuf,

    /// Milliseconds of input silence before an autosave write
    pub autosave_debounce_ms: u64,

    /// Whether deleting a note asks for confirmation
    pub confirm_delete: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            autosave_debounce_ms: 500,
            confirm_delete: true,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| PanelError::ConfigError {
            message: format!("Failed to parse config {}: {}", path.display(), e),
        })
    }
}

// Platform data directory, with a relative fallback for odd environments.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("panelnotes"))
        .unwrap_or_else(|| PathBuf::from(".panelnotes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/panelnotes.json")).unwrap();
        assert_eq!(config.autosave_debounce_ms, 500);
        assert!(config.confirm_delete);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(PanelError::ConfigError { .. })
        ));
    }
}
