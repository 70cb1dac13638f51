//! Runner driving a module through its phases

use super::callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, ModuleCallback, Phase,
    ProgressCallback,
};
use crate::config::ModuleSpec;
use crate::module::{AnomalyModel, AnomalyModule, Batch, StepOutput};
use crate::results::{AnomalyResults, Performance};
use crate::Result;
use std::time::Instant;

/// Outcome of a validation or test phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Validation epoch index (test phases report the current count)
    pub epoch: usize,
    /// Module threshold after the epoch-end hook
    pub threshold: f32,
    pub performance: Performance,
    /// Whether a callback asked to stop
    pub action: CallbackAction,
}

impl PhaseResult {
    pub fn should_stop(&self) -> bool {
        self.action == CallbackAction::Stop
    }
}

/// Host-side loop calling the module hooks in order
///
/// # Example
///
/// ```no_run
/// use anomalia::train::{EarlyStopping, ProgressCallback, Runner};
///
/// let mut runner = Runner::new();
/// runner.add_callback(ProgressCallback::default());
/// runner.add_callback(EarlyStopping::new("image_f1_score", 3, 0.0));
///
/// // for _ in 0..max_epochs {
/// //     if runner.validate(&mut module, &val_batches)?.should_stop() {
/// //         break;
/// //     }
/// // }
/// // let report = runner.test(&mut module, &test_batches)?;
/// ```
#[derive(Debug, Default)]
pub struct Runner {
    callbacks: CallbackManager,
    epoch: usize,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with the callbacks a configuration asks for
    ///
    /// Always installs a [`ProgressCallback`]; adds
    /// [`EarlyStopping`] when the config has an `early_stopping` section.
    pub fn from_spec(spec: &ModuleSpec) -> Self {
        let mut runner = Self::new();
        runner.add_callback(ProgressCallback::default());
        if let Some(es) = &spec.early_stopping {
            runner.add_callback(EarlyStopping::from_spec(es));
        }
        runner
    }

    pub fn add_callback<C: ModuleCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }

    /// Completed validation epochs
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Run one validation epoch
    ///
    /// Each batch goes through `validation_step` and `validation_step_end`;
    /// the collected outputs are passed to `validation_epoch_end`, which
    /// may update an adaptive threshold.
    pub fn validate<M: AnomalyModel>(
        &mut self,
        module: &mut AnomalyModule<M>,
        batches: &[Batch],
    ) -> Result<PhaseResult> {
        let result = self.run_epoch(module, batches, Phase::Validation)?;
        self.epoch += 1;
        Ok(result)
    }

    /// Run the test phase at the module's current threshold
    pub fn test<M: AnomalyModel>(
        &mut self,
        module: &mut AnomalyModule<M>,
        batches: &[Batch],
    ) -> Result<PhaseResult> {
        self.run_epoch(module, batches, Phase::Test)
    }

    /// Score and label every batch with `predict_step`
    pub fn predict<M: AnomalyModel>(
        &mut self,
        module: &mut AnomalyModule<M>,
        batches: &[Batch],
    ) -> Result<Vec<StepOutput>> {
        let start = Instant::now();
        let mut ctx = self.context(Phase::Predict, module, batches.len());
        if self.callbacks.on_phase_begin(&ctx) == CallbackAction::Stop {
            return Ok(Vec::new());
        }

        let mut outputs = Vec::with_capacity(batches.len());
        for (idx, batch) in batches.iter().enumerate() {
            outputs.push(module.predict_step(batch, idx, 0)?);
            ctx.step = idx + 1;
            ctx.elapsed_secs = start.elapsed().as_secs_f64();
            if self.callbacks.on_step_end(&ctx) == CallbackAction::Stop {
                break;
            }
        }
        Ok(outputs)
    }

    fn run_epoch<M: AnomalyModel>(
        &mut self,
        module: &mut AnomalyModule<M>,
        batches: &[Batch],
        phase: Phase,
    ) -> Result<PhaseResult> {
        let start = Instant::now();
        let mut ctx = self.context(phase, module, batches.len());

        if self.callbacks.on_phase_begin(&ctx) == CallbackAction::Stop {
            return Ok(PhaseResult {
                phase,
                epoch: self.epoch,
                threshold: module.threshold(),
                performance: Performance::new(),
                action: CallbackAction::Stop,
            });
        }

        let mut outputs = Vec::with_capacity(batches.len());
        let mut action = CallbackAction::Continue;
        for (idx, batch) in batches.iter().enumerate() {
            let output = match phase {
                Phase::Test => {
                    let output = module.test_step(batch, idx)?;
                    module.test_step_end(output)?
                }
                _ => {
                    let output = module.validation_step(batch, idx)?;
                    module.validation_step_end(output)?
                }
            };
            outputs.push(output);

            ctx.step = idx + 1;
            ctx.elapsed_secs = start.elapsed().as_secs_f64();
            if self.callbacks.on_step_end(&ctx) == CallbackAction::Stop {
                action = CallbackAction::Stop;
                break;
            }
        }

        match phase {
            Phase::Test => module.test_epoch_end(&outputs)?,
            _ => module.validation_epoch_end(&outputs)?,
        }

        ctx.threshold = module.threshold();
        ctx.performance = module.results().performance().clone();
        ctx.elapsed_secs = start.elapsed().as_secs_f64();
        if self.callbacks.on_epoch_end(&ctx) == CallbackAction::Stop {
            action = CallbackAction::Stop;
        }

        Ok(PhaseResult {
            phase,
            epoch: self.epoch,
            threshold: ctx.threshold,
            performance: ctx.performance,
            action,
        })
    }

    fn context<M: AnomalyModel>(
        &self,
        phase: Phase,
        module: &AnomalyModule<M>,
        steps: usize,
    ) -> CallbackContext {
        let mut ctx = CallbackContext::new(phase);
        ctx.epoch = self.epoch;
        ctx.steps_per_epoch = steps;
        ctx.threshold = module.threshold();
        ctx
    }
}
