/*!
 * JSON settings file management
 */

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IoResultExt, Result};
use crate::utils::DEFAULT_IGNORE_FILE;

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "ai-digest.json";

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Extra patterns applied together with the built-in defaults
    #[serde(default)]
    pub default_ignores: Vec<String>,
    /// Name of the custom ignore file inside the input directory
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
}

fn default_ignore_file() -> String {
    DEFAULT_IGNORE_FILE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_ignores: [
                "node_modules",
                ".git",
                "*.log",
                "*.swp",
                ".DS_Store",
                "Thumbs.db",
                "*.tmp",
                "*.temp",
                ".idea",
                ".vscode",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ignore_file: default_ignore_file(),
        }
    }
}

/// Loads and stores [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Manager for `path`, or `./ai-digest.json` when none is given
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(|| match env::current_dir() {
            Ok(cwd) => cwd.join(DEFAULT_SETTINGS_FILE),
            Err(_) => PathBuf::from(DEFAULT_SETTINGS_FILE),
        });
        Self { path }
    }

    /// Location of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the settings file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the settings, falling back to defaults when the file is missing
    pub fn load(&self) -> Result<Settings> {
        if !self.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file {}", self.path.display()))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the settings as pretty-printed JSON
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let data = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))
    }

    /// Create the settings file with defaults; refuses to overwrite
    pub fn init(&self) -> Result<()> {
        crate::ensure!(
            !self.exists(),
            Config,
            "config file already exists: {}",
            self.path.display()
        );
        self.save(&Settings::default())
    }

    /// Current settings rendered as pretty JSON
    pub fn show(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load()?)?)
    }
}
