//! Host-side phase runner
//!
//! Drives an [`AnomalyModule`](crate::module::AnomalyModule) through its
//! hooks the way a training loop would:
//! - `validate`: validation steps, step ends, then the epoch end
//! - `test`: the same with the test hooks
//! - `predict`: `predict_step` per batch
//!
//! Callbacks observe every phase and may request a stop.

pub mod callback;
mod runner;


pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, ModuleCallback, Phase,
    ProgressCallback,
};
pub use runner::{PhaseResult, Runner};
