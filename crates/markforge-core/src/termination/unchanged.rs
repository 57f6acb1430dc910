use super::TerminationCondition;
use std::marker::PhantomData;

/// Quantity an [`Unchanged`] condition watches.
pub trait Measure: Send {
    const NAME: &'static str;

    fn value(score: f64, size: usize) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreMeasure;

impl Measure for ScoreMeasure {
    const NAME: &'static str = "score";

    fn value(score: f64, _size: usize) -> f64 {
        score
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SizeMeasure;

impl Measure for SizeMeasure {
    const NAME: &'static str = "size";

    fn value(_score: f64, size: usize) -> f64 {
        size as f64
    }
}

/// Stops once the measure has stayed within `threshold` of its previous value
/// for `iterations` consecutive calls. The first call never stops.
#[derive(Debug, Clone)]
pub struct Unchanged<M> {
    iterations: usize,
    threshold: f64,
    previous: Option<f64>,
    repeats: usize,
    _measure: PhantomData<M>,
}

pub type UnchangedScore = Unchanged<ScoreMeasure>;
pub type UnchangedSize = Unchanged<SizeMeasure>;

impl<M> Unchanged<M> {
    fn with_threshold(iterations: usize, threshold: f64) -> Self {
        Self {
            iterations,
            threshold,
            previous: None,
            repeats: 0,
            _measure: PhantomData,
        }
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }
}

impl Unchanged<ScoreMeasure> {
    /// `tolerance` is a power of ten: `-2` treats moves below `0.01` as no change.
    pub fn new(iterations: usize, tolerance: i32) -> Self {
        Self::with_threshold(iterations, 10f64.powi(tolerance))
    }
}

impl Unchanged<SizeMeasure> {
    pub fn new(iterations: usize) -> Self {
        Self::with_threshold(iterations, 0.5)
    }
}

impl<M: Measure> TerminationCondition for Unchanged<M> {
    fn initialize(&mut self) {
        self.previous = None;
        self.repeats = 0;
    }

    fn continue_further(&mut self, _iteration: usize, score: f64, size: usize) -> bool {
        let value = M::value(score, size);
        let keep_going = match self.previous {
            None => true,
            Some(prev) if (value - prev).abs() < self.threshold => {
                self.repeats += 1;
                self.repeats < self.iterations
            }
            Some(_) => {
                self.repeats = 0;
                true
            }
        };
        self.previous = Some(value);
        keep_going
    }

    fn continue_unscored(&mut self, _iteration: usize) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!(
            "{} unchanged (±{}) for {} iterations",
            M::NAME,
            self.threshold,
            self.iterations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_resets_the_counter() {
        let mut c = UnchangedSize::new(2);
        c.initialize();
        assert!(c.continue_further(0, 0.0, 3));
        assert!(c.continue_further(1, 0.0, 3));
        assert!(c.continue_further(2, 0.0, 4));
        assert_eq!(c.repeats(), 0);
        assert!(c.continue_further(3, 0.0, 4));
        assert!(!c.continue_further(4, 0.0, 4));
    }

    #[test]
    fn initialize_forgets_history() {
        let mut c = UnchangedScore::new(1, -2);
        c.initialize();
        assert!(c.continue_further(0, 1.0, 0));
        assert!(!c.continue_further(1, 1.0, 0));
        c.initialize();
        assert!(c.continue_further(2, 1.0, 0));
    }

    #[test]
    fn unscored_iterations_do_not_count_as_unchanged() {
        let mut c = UnchangedScore::new(2, -2);
        c.initialize();
        assert!(c.continue_further(0, 5.0, 0));
        for i in 1..10 {
            assert!(c.continue_unscored(i));
        }
        assert_eq!(c.repeats(), 0);
        assert!(c.continue_further(10, 3.0, 0));
    }
}
