pub mod sink;
pub mod stats;

pub use self::sink::{Checkpoint, HistorySink, NullSink, ReportSink, TraceRow};
pub use self::stats::{KernelStats, RunStatistics};

use crate::acceptance::{AcceptanceProbabilityCalculator, ExtractScoreSize};
use crate::bridge::AssignMode;
use crate::config::SearchParams;
use crate::energy::{EnergyContext, ScoreSize};
use crate::error::{MppError, MppResult};
use crate::kernel::{propose_absorbing, ErrorLog, KernelContext, KernelProposer};
use crate::mark::MarkIdAllocator;
use crate::state::KernelState;
use crate::termination::{Monitored, TerminationCondition};
use fastrand::Rng;
use std::time::Instant;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct OptimizerOptions {
    #[builder(default)]
    pub seed: Option<u64>,
    /// Reported state is refreshed every `report_every` iterations, and only
    /// if something was accepted since the last refresh.
    #[builder(default = 1)]
    pub report_every: usize,
    #[builder(default = true)]
    pub verify_consistency: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&SearchParams> for OptimizerOptions {
    fn from(p: &SearchParams) -> Self {
        Self {
            seed: p.seed,
            report_every: p.report_every,
            verify_consistency: p.verify_consistency,
        }
    }
}

/// Final state of a run.
#[derive(Debug)]
pub struct OptimizationOutcome<S, R> {
    pub state: S,
    pub reported: R,
    /// Score of `state` as acceptance saw it.
    pub kernel_score: ScoreSize,
    /// Score of `reported` as termination saw it.
    pub score: ScoreSize,
    pub iterations: usize,
    pub statistics: RunStatistics,
    /// Description of the termination conditions in force.
    pub termination_rule: String,
}

/// Sequential annealing loop over a weighted set of kernels.
///
/// `extract` scores kernel-space states for acceptance; `assign` turns the
/// accepted state into the reported one.
pub struct Optimizer<S: KernelState + 'static, X, M> {
    proposer: KernelProposer<S>,
    extract: X,
    assign: M,
    acceptance: AcceptanceProbabilityCalculator,
    termination: Monitored<Box<dyn TerminationCondition>>,
    energy: EnergyContext,
    options: OptimizerOptions,
}

impl<S, X, M> Optimizer<S, X, M>
where
    S: KernelState + 'static,
    X: ExtractScoreSize<S>,
    M: AssignMode<S>,
{
    /// `energy` is what kernels consult while proposing.
    pub fn new(
        proposer: KernelProposer<S>,
        extract: X,
        assign: M,
        acceptance: AcceptanceProbabilityCalculator,
        termination: impl TerminationCondition + 'static,
        energy: EnergyContext,
    ) -> Self {
        Self {
            proposer,
            extract,
            assign,
            acceptance,
            termination: Monitored::new(Box::new(termination)),
            energy,
            options: OptimizerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OptimizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    pub fn assign_mode(&self) -> &M {
        &self.assign
    }

    pub fn extractor(&self) -> &X {
        &self.extract
    }

    /// Runs until termination. Fatal failures are returned wrapped with the
    /// iteration and kernel they happened in.
    pub fn run<K: ReportSink<M::Reported>>(
        &mut self,
        initial: S,
        sink: &mut K,
    ) -> MppResult<OptimizationOutcome<S, M::Reported>> {
        self.proposer.validate()?;
        if self.options.report_every == 0 {
            return Err(MppError::Config("report_every must be at least 1".to_string()));
        }

        let Self {
            proposer,
            extract,
            assign,
            acceptance,
            termination,
            energy,
            options,
        } = self;
        let energy: &EnergyContext = energy;

        let mut rng = options.seed.map_or_else(Rng::new, Rng::with_seed);
        let mut ids = initial
            .largest_known_id()
            .and_then(MarkIdAllocator::after)
            .map_err(|e| e.during(0, "initial"))?;
        let mut errors = ErrorLog::default();
        let mut stats = RunStatistics::for_kernels(proposer.names());
        let region = *energy.region();
        let started = Instant::now();

        if options.verify_consistency {
            initial.check_consistency().map_err(|e| e.during(0, "initial"))?;
        }
        let mut current = initial;
        let mut current_score = extract
            .extract(&current)
            .map_err(|e| e.during(0, "initial"))?;
        stats.observe_score(current_score.score);

        let (mut reported, mut reported_score) = assign
            .report(&current, current_score)
            .map_err(|e| e.during(0, assign.name()))?;
        let mut dirty = false;

        termination.initialize();
        info!(
            "Optimizer: {} kernels, {}, stop on {}, {} reporting, start score {:.4} ({} marks)",
            proposer.len(),
            acceptance.describe(),
            termination.describe(),
            assign.name(),
            current_score.score,
            current_score.size
        );

        let mut iteration = 0usize;
        let mut keep_going =
            termination.continue_further(iteration, reported_score.score, reported_score.size);
        while keep_going {
            let temperature = acceptance.temperature(iteration);
            let index = proposer.select(&mut rng);
            let kernel = proposer
                .kernel_mut(index)
                .ok_or_else(|| MppError::abnormal("kernel selection out of range"))?;
            stats.selected(index);

            let failures_before = errors.calculation_failures;
            let proposal = {
                let mut ctx = KernelContext {
                    rng: &mut rng,
                    energy,
                    region: &region,
                    ids: &mut ids,
                    errors: &mut errors,
                    temperature,
                    iteration,
                };
                propose_absorbing(kernel, &current, &mut ctx)
                    .map_err(|e| e.during(iteration, kernel.name()))?
            };

            match proposal {
                None if errors.calculation_failures > failures_before => stats.failed(index),
                None => stats.no_proposal(index),
                Some(candidate) => match extract.extract(&candidate) {
                    Err(e) if e.is_recoverable() => {
                        errors.record(kernel.name(), iteration, &e);
                        stats.failed(index);
                    }
                    Err(e) => return Err(e.during(iteration, kernel.name())),
                    Ok(candidate_score) => {
                        if acceptance.accept(&current_score, &candidate_score, iteration, &mut rng) {
                            kernel
                                .update_after_acceptance(&current, &candidate)
                                .map_err(|e| e.during(iteration, kernel.name()))?;
                            if options.verify_consistency {
                                candidate
                                    .check_consistency()
                                    .map_err(|e| e.during(iteration, kernel.name()))?;
                            }
                            debug!(
                                "Iteration {}: {} accepted, score {:.4} -> {:.4}, {} marks",
                                iteration,
                                kernel.name(),
                                current_score.score,
                                candidate_score.score,
                                candidate_score.size
                            );
                            current = candidate;
                            current_score = candidate_score;
                            stats.accepted(index, current_score.score);
                            dirty = true;
                        } else {
                            stats.rejected(index);
                        }
                    }
                },
            }

            if dirty && (iteration + 1) % options.report_every == 0 {
                match assign.report(&current, current_score) {
                    Ok((state, score)) => {
                        reported = state;
                        reported_score = score;
                        dirty = false;
                        stats.checkpoints += 1;
                        sink.report(&Checkpoint {
                            iteration,
                            temperature,
                            score: reported_score,
                            state: &reported,
                        })?;
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!("Iteration {}: reporting deferred: {}", iteration, e);
                    }
                    Err(e) => return Err(e.during(iteration, assign.name())),
                }
            }

            iteration += 1;
            // A dirty transformed report is stale; score-based conditions skip it.
            keep_going = if assign.reports_kernel_score() {
                termination.continue_further(iteration, current_score.score, current_score.size)
            } else if dirty {
                termination.continue_unscored(iteration)
            } else {
                termination.continue_further(iteration, reported_score.score, reported_score.size)
            };
        }

        if dirty {
            let (state, score) = assign
                .report(&current, current_score)
                .map_err(|e| e.during(iteration, assign.name()))?;
            reported = state;
            reported_score = score;
            stats.checkpoints += 1;
            sink.report(&Checkpoint {
                iteration: iteration.saturating_sub(1),
                temperature: acceptance.temperature(iteration.saturating_sub(1)),
                score: reported_score,
                state: &reported,
            })?;
        }

        stats.elapsed_secs = started.elapsed().as_secs_f64();
        sink.finish(&stats)?;

        let termination_rule = termination.describe();
        info!(
            "Optimizer: stopped after {} iterations ({}), score {:.4} ({} marks), acceptance {:.1}%",
            iteration,
            termination_rule,
            reported_score.score,
            reported_score.size,
            stats.acceptance_rate() * 100.0
        );

        Ok(OptimizationOutcome {
            state: current,
            reported,
            kernel_score: current_score,
            score: reported_score,
            iterations: iteration,
            statistics: stats,
            termination_rule,
        })
    }
}
