use crate::anneal::AnnealScheme;
use crate::consts::TEMPERATURE_EPSILON;
use crate::energy::{EnergyContext, ScoreSize};
use crate::error::MppResult;
use crate::state::KernelState;
use fastrand::Rng;

/// Pulls `(score, size)` out of a state.
pub trait ExtractScoreSize<S> {
    fn extract(&self, state: &S) -> MppResult<ScoreSize>;
}

/// Scores kernel-space states with the energy oracle.
#[derive(Clone)]
pub struct OracleExtract {
    energy: EnergyContext,
}

impl OracleExtract {
    pub fn new(energy: EnergyContext) -> Self {
        Self { energy }
    }
}

impl<S: KernelState> ExtractScoreSize<S> for OracleExtract {
    fn extract(&self, state: &S) -> MppResult<ScoreSize> {
        self.energy.score(state.marks())
    }
}

/// Metropolis acceptance under an annealing schedule. Lower scores are better.
pub struct AcceptanceProbabilityCalculator {
    anneal: Box<dyn AnnealScheme>,
}

impl AcceptanceProbabilityCalculator {
    pub fn new(anneal: Box<dyn AnnealScheme>) -> Self {
        Self { anneal }
    }

    pub fn temperature(&self, iteration: usize) -> f64 {
        self.anneal.temperature(iteration)
    }

    pub fn describe(&self) -> String {
        self.anneal.describe()
    }

    /// Probability of moving from `current` to `candidate` at `temperature`.
    pub fn probability(current: f64, candidate: f64, temperature: f64) -> f64 {
        let delta = candidate - current;
        if delta <= 0.0 {
            return 1.0;
        }
        if temperature <= TEMPERATURE_EPSILON || !delta.is_finite() {
            return 0.0;
        }
        (-delta / temperature).exp()
    }

    pub fn calc_accept_prob<S, X: ExtractScoreSize<S>>(
        &self,
        extract: &X,
        current: &S,
        candidate: &S,
        iteration: usize,
    ) -> MppResult<f64> {
        let cur = extract.extract(current)?;
        let cand = extract.extract(candidate)?;
        Ok(Self::probability(
            cur.score,
            cand.score,
            self.temperature(iteration),
        ))
    }

    /// Draws the accept/reject decision for already-scored states.
    pub fn accept(
        &self,
        current: &ScoreSize,
        candidate: &ScoreSize,
        iteration: usize,
        rng: &mut Rng,
    ) -> bool {
        let p = Self::probability(current.score, candidate.score, self.temperature(iteration));
        if p >= 1.0 {
            return true;
        }
        rng.f64() < p
    }
}
