//! Callback system for evaluation phases
//!
//! Provides hooks for runner events:
//! - `on_phase_begin`
//! - `on_step_end`
//! - `on_epoch_end`
//!
//! # Example
//!
//! ```rust
//! use anomalia::train::callback::{CallbackAction, CallbackContext, ModuleCallback};
//!
//! struct PrintCallback;
//!
//! impl ModuleCallback for PrintCallback {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         println!("{} epoch {} at threshold {:.4}", ctx.phase, ctx.epoch, ctx.threshold);
//!         CallbackAction::Continue
//!     }
//! }
//! ```

use crate::config::EarlyStoppingSpec;
use crate::results::Performance;
use std::fmt;

/// Phase a runner is driving
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Validation,
    Test,
    Predict,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validation => "validation",
            Phase::Test => "test",
            Phase::Predict => "predict",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context passed to callbacks with the current phase state
#[derive(Clone, Debug)]
pub struct CallbackContext {
    pub phase: Phase,
    /// Validation epochs completed before this one (0-indexed)
    pub epoch: usize,
    /// Current step within the phase
    pub step: usize,
    /// Total steps in the phase
    pub steps_per_epoch: usize,
    /// Module threshold at the time of the event
    pub threshold: f32,
    /// Epoch metrics (empty until `on_epoch_end`)
    pub performance: Performance,
    /// Phase duration in seconds
    pub elapsed_secs: f64,
}

impl CallbackContext {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            epoch: 0,
            step: 0,
            steps_per_epoch: 0,
            threshold: 0.0,
            performance: Performance::new(),
            elapsed_secs: 0.0,
        }
    }

    /// Value of a logged metric, if the epoch produced it
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.performance.get(name).copied()
    }
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    /// Stop driving the module (early stopping)
    Stop,
}

/// Trait for runner callbacks
///
/// All methods have default no-op implementations, so only the events of
/// interest need implementing.
pub trait ModuleCallback: Send {
    /// Called before the first step of a phase
    fn on_phase_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each step's output has been post-processed
    fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after the epoch-end hook has evaluated the phase
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Get callback name for logging
    fn name(&self) -> &str {
        "ModuleCallback"
    }
}

// =============================================================================
// Early Stopping Callback
// =============================================================================

/// Early stopping callback to halt validation when a metric plateaus
///
/// Watches a named performance metric at the end of every validation
/// epoch and requests a stop after `patience` epochs without an
/// improvement larger than `min_delta`. Epochs that did not produce the
/// metric count as epochs without improvement.
///
/// # Example
///
/// ```rust
/// use anomalia::train::callback::EarlyStopping;
///
/// // Stop if image_f1_score has not improved by 0.001 for 5 epochs
/// let early_stop = EarlyStopping::new("image_f1_score", 5, 0.001);
/// ```
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    metric: String,
    patience: usize,
    min_delta: f64,
    higher_is_better: bool,
    best: Option<f64>,
    epochs_without_improvement: usize,
}

impl EarlyStopping {
    /// Create an early stopping callback on a metric where higher is better
    pub fn new(metric: impl Into<String>, patience: usize, min_delta: f64) -> Self {
        Self {
            metric: metric.into(),
            patience,
            min_delta,
            higher_is_better: true,
            best: None,
            epochs_without_improvement: 0,
        }
    }

    /// Create from the `early_stopping` config section
    pub fn from_spec(spec: &EarlyStoppingSpec) -> Self {
        let stopper = Self::new(spec.metric.clone(), spec.patience, spec.min_delta);
        if spec.higher_is_better {
            stopper
        } else {
            stopper.lower_is_better()
        }
    }

    /// Treat decreasing values as improvements
    pub fn lower_is_better(mut self) -> Self {
        self.higher_is_better = false;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Best value seen so far
    pub fn best(&self) -> Option<f64> {
        self.best
    }

    /// Reset internal state
    pub fn reset(&mut self) {
        self.best = None;
        self.epochs_without_improvement = 0;
    }

    fn check_improvement(&mut self, value: Option<f64>) -> bool {
        let improved = match (value, self.best) {
            (Some(v), _) if v.is_nan() => false,
            (Some(_), None) => true,
            (Some(v), Some(best)) if self.higher_is_better => v > best + self.min_delta,
            (Some(v), Some(best)) => v < best - self.min_delta,
            (None, _) => false,
        };

        if improved {
            self.best = value;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
        improved
    }
}

impl ModuleCallback for EarlyStopping {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if ctx.phase != Phase::Validation {
            return CallbackAction::Continue;
        }

        let value = ctx.metric(&self.metric);
        if value.is_none() {
            tracing::warn!(metric = %self.metric, epoch = ctx.epoch, "monitored metric not logged");
        }
        self.check_improvement(value);

        if self.epochs_without_improvement >= self.patience {
            tracing::info!(
                metric = %self.metric,
                best = ?self.best,
                patience = self.patience,
                "early stopping: no improvement"
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &str {
        "EarlyStopping"
    }
}

// =============================================================================
// Progress Callback
// =============================================================================

/// Progress callback emitting `tracing` events for each phase
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    /// Log every N steps
    log_interval: usize,
}

impl ProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl ModuleCallback for ProgressCallback {
    fn on_phase_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        tracing::info!(
            phase = %ctx.phase,
            epoch = ctx.epoch,
            steps = ctx.steps_per_epoch,
            "phase starting"
        );
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if ctx.step > 0 && ctx.step % self.log_interval == 0 {
            tracing::debug!(
                phase = %ctx.phase,
                step = ctx.step,
                steps = ctx.steps_per_epoch,
                "step finished"
            );
        }
        CallbackAction::Continue
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let metrics = ctx
            .performance
            .iter()
            .map(|(name, value)| format!("{name}: {value:.4}"))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!(
            phase = %ctx.phase,
            epoch = ctx.epoch,
            threshold = ctx.threshold,
            elapsed_secs = ctx.elapsed_secs,
            "epoch finished: {metrics}"
        );
        CallbackAction::Continue
    }

    fn name(&self) -> &str {
        "ProgressCallback"
    }
}

// =============================================================================
// Callback Manager
// =============================================================================

/// Manages multiple callbacks and dispatches events
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn ModuleCallback>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add<C: ModuleCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Registered callback names, in dispatch order
    pub fn names(&self) -> Vec<&str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// Fire phase begin event
    pub fn on_phase_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        self.dispatch(|cb| cb.on_phase_begin(ctx))
    }

    /// Fire step end event
    pub fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        self.dispatch(|cb| cb.on_step_end(ctx))
    }

    /// Fire epoch end event
    ///
    /// Every callback sees the event even when an earlier one asks to stop.
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let mut action = CallbackAction::Continue;
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                tracing::debug!(callback = cb.name(), "stop requested");
                action = CallbackAction::Stop;
            }
        }
        action
    }

    fn dispatch<F>(&mut self, mut event: F) -> CallbackAction
    where
        F: FnMut(&mut Box<dyn ModuleCallback>) -> CallbackAction,
    {
        for cb in &mut self.callbacks {
            if event(cb) == CallbackAction::Stop {
                tracing::debug!(callback = cb.name(), "stop requested");
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }
}

impl fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackManager")
            .field("callbacks", &self.names())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
