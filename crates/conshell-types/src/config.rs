//! Console configuration loaded from TOML (or a JSON options object).

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConsoleError, Result};

/// Top-level console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleConfig {
    /// Echo each submitted command line to the output before running it.
    #[serde(default = "yes")]
    pub echo: bool,
    /// Text shown in front of the input while idle.
    #[serde(default = "default_prompt_prefix")]
    pub prompt_prefix: String,
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Options for the default definition provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefinitionsConfig {
    /// Built-in commands to register at construction (`HELP`, `ECHO`, `CLS`).
    #[serde(default = "default_predefined")]
    pub predefined: Vec<String>,
    /// Resolve unambiguous name prefixes to their full command.
    #[serde(default = "yes")]
    pub allow_abbreviations: bool,
}

/// Options for the default history provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Maximum remembered commands (0 = unbounded).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Options for the overlay wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverlayConfig {
    /// Open the overlay as soon as it is created.
    #[serde(default)]
    pub auto_open: bool,
    /// Character that opens a closed overlay.
    #[serde(default = "default_open_key")]
    pub open_key: char,
}

fn yes() -> bool {
    true
}
fn default_prompt_prefix() -> String {
    ">".to_string()
}
fn default_predefined() -> Vec<String> {
    vec!["HELP".to_string(), "ECHO".to_string(), "CLS".to_string()]
}
fn default_max_entries() -> usize {
    100
}
fn default_open_key() -> char {
    '`'
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            echo: true,
            prompt_prefix: default_prompt_prefix(),
            definitions: DefinitionsConfig::default(),
            history: HistoryConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            predefined: default_predefined(),
            allow_abbreviations: true,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            auto_open: false,
            open_key: default_open_key(),
        }
    }
}

impl ConsoleConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON options object, as handed over by an embedding host.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded console config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for name in &self.definitions.predefined {
            if name.trim().is_empty() {
                return Err(ConsoleError::Config(
                    "predefined command names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl DefinitionsConfig {
    /// Whether the named built-in is enabled (case-insensitive).
    pub fn is_predefined(&self, name: &str) -> bool {
        self.predefined.iter().any(|p| p.eq_ignore_ascii_case(name))
    }
}
