//! Serialization format definitions

use serde::{Deserialize, Serialize};

/// Supported state serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateFormat {
    /// JSON format (human-readable)
    Json,

    /// YAML format (human-readable, matches config files)
    Yaml,
}

impl StateFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            StateFormat::Json => "json",
            StateFormat::Yaml => "yaml",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(StateFormat::Json),
            "yaml" | "yml" => Some(StateFormat::Yaml),
            _ => None,
        }
    }
}

/// Configuration for saving state
#[derive(Debug, Clone)]
pub struct SaveConfig {
    /// Serialization format
    pub format: StateFormat,

    /// Whether to pretty-print JSON
    pub pretty: bool,
}

impl SaveConfig {
    /// Create new save config with format
    pub fn new(format: StateFormat) -> Self {
        Self {
            format,
            pretty: true,
        }
    }

    /// Enable/disable pretty printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self::new(StateFormat::Json)
    }
}
