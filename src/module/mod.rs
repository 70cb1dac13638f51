//! Anomaly module and its collaborators
//!
//! - **model**: the [`AnomalyModel`] trait implemented by concrete algorithms
//! - **anomaly_module**: [`AnomalyModule`], the phase hooks around a model
//! - **output**: [`StepOutput`] and score derivation from anomaly maps
//! - **logger**: metric sinks ([`TracingLogger`], [`InMemoryLogger`])

mod anomaly_module;
mod batch;
mod logger;
mod model;
mod output;

#[cfg(test)]
mod tests;

pub use anomaly_module::AnomalyModule;
pub use batch::Batch;
pub use logger::{InMemoryLogger, LogOptions, LoggedMetric, MetricLogger, TracingLogger};
pub use model::AnomalyModel;
pub use output::{max_per_sample, StepOutput};
