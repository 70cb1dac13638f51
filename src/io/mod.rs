//! Module state I/O
//!
//! Persists what a module needs to resume evaluation: the hyperparameters
//! it was built from and its current decision threshold.

mod format;
mod load;
mod save;
mod state;


pub use format::{SaveConfig, StateFormat};
pub use load::load_state;
pub use save::save_state;
pub use state::ModuleState;
