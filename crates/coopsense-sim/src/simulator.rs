//! Simulation driver.
//!
//! Runs a [`TrafficSource`] through a [`CoopController`] one snapshot at a
//! time and scores the smart switches:
//!
//! ```text
//! source.next_snapshot → controller.step (sense → record → trigger_switch)
//!                      → score the previous step's switch
//! ```
//!
//! Alongside the engine, a uniformly random channel pick is scored on the same
//! steps as a baseline.

use crate::error::{SimError, SimResult};
use crate::stats::SimulationStats;
use crate::traffic::TrafficSource;
use coopsense_core::config::EngineConfig;
use coopsense_core::coop::{CoopController, StepReport, SwitchOutcome};
use coopsense_core::switch::ChoiceKind;
use coopsense_core::types::ChannelState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, info_span};

/// Mixed into the engine seed so the baseline draws its own stream.
const BASELINE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Drives the decision engine over a traffic source.
pub struct Simulation<S, R = StdRng> {
    controller: CoopController<R>,
    source: S,
    baseline_rng: StdRng,
    stats: SimulationStats,
    max_steps: Option<usize>,
    last_step_smart: bool,
}

impl<S: TrafficSource> Simulation<S> {
    /// Build a controller from `config` and attach it to `source`.
    pub fn new(config: EngineConfig, source: S) -> SimResult<Self> {
        let baseline_rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ BASELINE_SEED_SALT),
            None => StdRng::from_entropy(),
        };
        let controller = CoopController::new(config)?;
        Self::with_controller(controller, source, baseline_rng)
    }
}

impl<S: TrafficSource, R: Rng> Simulation<S, R> {
    /// Attach an existing controller. The source must be as wide as the
    /// controller's channel set.
    pub fn with_controller(controller: CoopController<R>, source: S, baseline_rng: StdRng) -> SimResult<Self> {
        if source.num_channels() != controller.num_channels() {
            return Err(SimError::ChannelMismatch {
                engine: controller.num_channels(),
                traffic: source.num_channels(),
            });
        }
        Ok(Self {
            controller,
            source,
            baseline_rng,
            stats: SimulationStats::default(),
            max_steps: None,
            last_step_smart: false,
        })
    }

    /// Stop after `max_steps` steps even if the source has more.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn controller(&self) -> &CoopController<R> {
        &self.controller
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Advance one step. `None` once the source or the step limit is exhausted.
    pub fn step(&mut self) -> SimResult<Option<StepReport>> {
        if self
            .max_steps
            .is_some_and(|max| self.stats.steps >= max as u64)
        {
            return Ok(None);
        }
        let Some(snapshot) = self.source.next_snapshot() else {
            return Ok(None);
        };

        let monitored_channel = self.controller.monitored_channel();
        let report = self.controller.step(&snapshot)?;
        self.stats.steps += 1;

        if self.last_step_smart {
            self.score(&snapshot, monitored_channel);
        }

        match report.outcome {
            SwitchOutcome::Fallback => self.stats.fallback_steps += 1,
            SwitchOutcome::Switched { choice, .. } => match choice.kind {
                ChoiceKind::Explored => self.stats.explorations += 1,
                _ => self.stats.predictions += 1,
            },
            SwitchOutcome::Stayed { .. } | SwitchOutcome::Unsensed { .. } => {}
        }
        self.stats.history_flushes = self.controller.history().flush_count();
        self.last_step_smart = report.outcome.is_smart();

        Ok(Some(report))
    }

    /// Run until the source or the step limit is exhausted.
    pub fn run(&mut self) -> SimResult<&SimulationStats> {
        let span = info_span!("simulation", channels = self.controller.num_channels());
        let _guard = span.enter();

        info!(
            steps = ?self.source.num_steps(),
            max_steps = ?self.max_steps,
            "simulation started"
        );
        while self.step()?.is_some() {}
        info!(
            steps = self.stats.steps,
            smart_switches = self.stats.smart_switch_steps,
            correct = self.stats.correct,
            "simulation finished"
        );

        Ok(&self.stats)
    }

    /// Score the previous step's smart switch against this step's truth.
    fn score(&mut self, snapshot: &[ChannelState], monitored_channel: usize) {
        self.stats.smart_switch_steps += 1;

        match snapshot[monitored_channel] {
            ChannelState::Empty => self.stats.correct += 1,
            ChannelState::Occupied if snapshot.contains(&ChannelState::Empty) => self.stats.incorrect += 1,
            _ => {}
        }

        let pick = self.baseline_rng.gen_range(0..snapshot.len());
        if snapshot[pick] == ChannelState::Empty {
            self.stats.random_correct += 1;
        }
        debug!(
            monitored_channel,
            sensed = %snapshot[monitored_channel],
            baseline_channel = pick,
            "scored smart switch"
        );
    }
}
