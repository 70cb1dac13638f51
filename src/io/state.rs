//! Serializable module state

use crate::config::ModuleSpec;
use serde::{Deserialize, Serialize};

/// Persistent state of an anomaly module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Name of the wrapped model
    pub model_name: String,

    /// Hyperparameters the module was built from
    pub hparams: ModuleSpec,

    /// Decision threshold at the time of saving
    pub threshold: f32,
}

impl ModuleState {
    /// State for a freshly configured module
    pub fn new(model_name: impl Into<String>, hparams: ModuleSpec) -> Self {
        let threshold = hparams.threshold.default;
        Self {
            model_name: model_name.into(),
            hparams,
            threshold,
        }
    }

    /// Override the threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Carry the saved threshold and adaptive setting into `spec`
    ///
    /// The task and early stopping settings of `spec` are left as they are.
    pub fn apply_to(&self, spec: &mut ModuleSpec) {
        spec.threshold.adaptive = self.hparams.threshold.adaptive;
        spec.threshold.default = self.threshold;
    }
}
