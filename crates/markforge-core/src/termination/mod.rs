pub mod external;
pub mod unchanged;

pub use self::external::{CancellationFlag, TimeLimit};
pub use self::unchanged::{Unchanged, UnchangedScore, UnchangedSize};

use crate::config::TerminationParams;
use std::time::Duration;
use strum_macros::Display;
use tracing::{debug, warn};

/// Decides after every completed iteration whether the run goes on.
pub trait TerminationCondition: Send {
    /// Resets all history. Called once before the first `continue_further`.
    fn initialize(&mut self);

    /// `iteration` is the number of iterations completed so far; `score` and
    /// `size` describe the current reported state.
    fn continue_further(&mut self, iteration: usize, score: f64, size: usize) -> bool;

    /// Same as `continue_further` for an iteration whose reported score is
    /// stale. Score-based conditions keep their history untouched.
    fn continue_unscored(&mut self, iteration: usize) -> bool;

    fn describe(&self) -> String;
}

impl TerminationCondition for Box<dyn TerminationCondition> {
    fn initialize(&mut self) {
        (**self).initialize()
    }

    fn continue_further(&mut self, iteration: usize, score: f64, size: usize) -> bool {
        (**self).continue_further(iteration, score, size)
    }

    fn continue_unscored(&mut self, iteration: usize) -> bool {
        (**self).continue_unscored(iteration)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumberIterations {
    iterations: usize,
}

impl NumberIterations {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl TerminationCondition for NumberIterations {
    fn initialize(&mut self) {}

    fn continue_further(&mut self, iteration: usize, _score: f64, _size: usize) -> bool {
        iteration < self.iterations
    }

    fn continue_unscored(&mut self, iteration: usize) -> bool {
        iteration < self.iterations
    }

    fn describe(&self) -> String {
        format!("{} iterations", self.iterations)
    }
}

/// Continues only while every member continues. Every member sees every call.
#[derive(Default)]
pub struct AllOf {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn push(&mut self, condition: Box<dyn TerminationCondition>) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn all<F>(&mut self, mut keep_going: F) -> bool
    where
        F: FnMut(&mut Box<dyn TerminationCondition>) -> bool,
    {
        let mut result = true;
        for c in &mut self.conditions {
            if !keep_going(c) {
                debug!("Termination: '{}' stopped the run", c.describe());
                result = false;
            }
        }
        result
    }
}

impl TerminationCondition for AllOf {
    fn initialize(&mut self) {
        self.conditions.iter_mut().for_each(|c| c.initialize());
    }

    fn continue_further(&mut self, iteration: usize, score: f64, size: usize) -> bool {
        self.all(|c| c.continue_further(iteration, score, size))
    }

    fn continue_unscored(&mut self, iteration: usize) -> bool {
        self.all(|c| c.continue_unscored(iteration))
    }

    fn describe(&self) -> String {
        if self.conditions.is_empty() {
            return "never".to_string();
        }
        self.conditions
            .iter()
            .map(|c| c.describe())
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    Terminated,
}

/// Tracks the lifecycle of a wrapped condition.
pub struct Monitored<C> {
    inner: C,
    phase: Phase,
}

impl<C: TerminationCondition> Monitored<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            phase: Phase::Created,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn step(&mut self, query: impl FnOnce(&mut C) -> bool) -> bool {
        match self.phase {
            Phase::Terminated => {
                warn!("Termination condition queried after it already stopped the run");
                return false;
            }
            Phase::Created => {
                warn!("Termination condition used before initialize(); initializing now");
                self.initialize();
            }
            Phase::Initialized | Phase::Running => {}
        }
        self.phase = Phase::Running;
        let keep_going = query(&mut self.inner);
        if !keep_going {
            self.phase = Phase::Terminated;
        }
        keep_going
    }
}

impl<C: TerminationCondition> TerminationCondition for Monitored<C> {
    fn initialize(&mut self) {
        self.inner.initialize();
        self.phase = Phase::Initialized;
    }

    fn continue_further(&mut self, iteration: usize, score: f64, size: usize) -> bool {
        self.step(|c| c.continue_further(iteration, score, size))
    }

    fn continue_unscored(&mut self, iteration: usize) -> bool {
        self.step(|c| c.continue_unscored(iteration))
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Builds the conjunction of every condition the parameters enable.
pub fn from_params(params: &TerminationParams) -> AllOf {
    let mut all = AllOf::new().with(NumberIterations::new(params.max_iterations));
    if let Some(n) = params.unchanged_score_iterations {
        all.push(Box::new(UnchangedScore::new(n, params.score_tolerance)));
    }
    if let Some(n) = params.unchanged_size_iterations {
        all.push(Box::new(UnchangedSize::new(n)));
    }
    if let Some(secs) = params.max_seconds {
        all.push(Box::new(TimeLimit::new(Duration::from_secs(secs))));
    }
    all
}
