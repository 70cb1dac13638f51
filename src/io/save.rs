//! State saving

use super::format::{SaveConfig, StateFormat};
use super::state::ModuleState;
use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save module state to a file
///
/// # Example
///
/// ```no_run
/// use anomalia::config::{ModuleSpec, TaskType};
/// use anomalia::io::{save_state, ModuleState, SaveConfig, StateFormat};
///
/// let state = ModuleState::new("padim", ModuleSpec::new(TaskType::Segmentation));
/// save_state(&state, "padim_state.json", &SaveConfig::new(StateFormat::Json))?;
/// # Ok::<(), anomalia::Error>(())
/// ```
pub fn save_state(state: &ModuleState, path: impl AsRef<Path>, config: &SaveConfig) -> Result<()> {
    let path = path.as_ref();

    let data = match config.format {
        StateFormat::Json => {
            if config.pretty {
                serde_json::to_string_pretty(state)
            } else {
                serde_json::to_string(state)
            }
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?
        }
        StateFormat::Yaml => serde_yaml::to_string(state)
            .map_err(|e| Error::Serialization(format!("YAML serialization failed: {e}")))?,
    };

    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;

    tracing::debug!(path = %path.display(), threshold = state.threshold, "saved module state");
    Ok(())
}
