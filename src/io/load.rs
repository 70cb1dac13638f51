//! State loading

use super::format::StateFormat;
use super::state::ModuleState;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Load module state from a file
///
/// The format is detected from the file extension.
///
/// # Example
///
/// ```no_run
/// use anomalia::io::load_state;
///
/// let state = load_state("padim_state.json")?;
/// println!("threshold: {}", state.threshold);
/// # Ok::<(), anomalia::Error>(())
/// ```
pub fn load_state(path: impl AsRef<Path>) -> Result<ModuleState> {
    let path = path.as_ref();

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Serialization("File has no extension".to_string()))?;

    let format = StateFormat::from_extension(ext)
        .ok_or_else(|| Error::Serialization(format!("Unsupported file extension: {ext}")))?;

    let content = fs::read_to_string(path)?;

    let state: ModuleState = match format {
        StateFormat::Json => serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}")))?,
        StateFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| Error::Serialization(format!("YAML deserialization failed: {e}")))?,
    };

    tracing::debug!(path = %path.display(), threshold = state.threshold, "loaded module state");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_no_extension() {
        let result = load_state("state");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let result = load_state("state.ckpt");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_state("/nonexistent/state.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
