//! Metric logging sinks
//!
//! The module reports every performance metric through a [`MetricLogger`].
//! [`TracingLogger`] is the default; [`InMemoryLogger`] keeps the values so
//! a host (or a test) can read them back.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// How a logged value should be aggregated and displayed by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    /// Value is an epoch-level aggregate
    pub on_epoch: bool,
    /// Value should be shown in the progress display
    pub prog_bar: bool,
}

impl LogOptions {
    /// Epoch-level value shown in the progress display
    pub fn epoch_progress() -> Self {
        Self {
            on_epoch: true,
            prog_bar: true,
        }
    }
}

/// Destination for named metric values
pub trait MetricLogger: Send {
    fn log(&mut self, name: &str, value: f64, options: LogOptions);
}

/// Logs metrics as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl MetricLogger for TracingLogger {
    fn log(&mut self, name: &str, value: f64, options: LogOptions) {
        tracing::info!(
            metric = name,
            value,
            on_epoch = options.on_epoch,
            prog_bar = options.prog_bar,
            "{name}: {value:.4}"
        );
    }
}

/// A single logged value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMetric {
    pub name: String,
    pub value: f64,
    pub options: LogOptions,
}

/// Records logged metrics in memory
///
/// Clones share the same record list, so a host can keep a handle while
/// the module owns the logger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogger {
    records: Arc<Mutex<Vec<LoggedMetric>>>,
}

impl InMemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoggedMetric>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All records in logging order
    pub fn records(&self) -> Vec<LoggedMetric> {
        self.lock().clone()
    }

    /// Most recent value logged under `name`
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.lock()
            .iter()
            .rev()
            .find(|record| record.name == name)
            .map(|record| record.value)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all records
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl MetricLogger for InMemoryLogger {
    fn log(&mut self, name: &str, value: f64, options: LogOptions) {
        self.lock().push(LoggedMetric {
            name: name.to_string(),
            value,
            options,
        });
    }
}
