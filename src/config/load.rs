//! Loading module configuration from YAML

use super::schema::ModuleSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Parse and validate a module spec from a YAML string
///
/// An unknown `task` surfaces as [`Error::UnsupportedTask`] rather than a
/// generic parse failure.
pub fn parse_config(yaml: &str) -> Result<ModuleSpec> {
    let spec: ModuleSpec = serde_yaml::from_str(yaml).map_err(|e| {
        let message = e.to_string();
        match unsupported_task(yaml, &message) {
            Some(task) => Error::UnsupportedTask(task),
            None => Error::ConfigError(format!("Failed to parse YAML config: {message}")),
        }
    })?;

    validate_config(&spec).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    Ok(spec)
}

/// Load a module spec from a YAML file
///
/// # Example
///
/// ```no_run
/// use anomalia::config::load_config;
///
/// let spec = load_config("padim.yaml")?;
/// println!("task: {}", spec.task);
/// # Ok::<(), anomalia::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<ModuleSpec> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    parse_config(&yaml_content)
}

/// Recover the offending task string when parsing failed on it
fn unsupported_task(yaml: &str, message: &str) -> Option<String> {
    if !message.contains("Unsupported task") {
        return None;
    }
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).ok()?;
    value
        .get("task")
        .and_then(|task| task.as_str())
        .map(str::to_string)
}
