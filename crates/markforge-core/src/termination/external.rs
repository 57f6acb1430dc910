use super::TerminationCondition;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stops once another thread raises the shared flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    flag: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl TerminationCondition for CancellationFlag {
    fn initialize(&mut self) {}

    fn continue_further(&mut self, _iteration: usize, _score: f64, _size: usize) -> bool {
        !self.flag.load(Ordering::SeqCst)
    }

    fn continue_unscored(&mut self, _iteration: usize) -> bool {
        !self.flag.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "cancellation".to_string()
    }
}

/// Wall-clock budget counted from `initialize`.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    limit: Duration,
    start: Option<Instant>,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        Self { limit, start: None }
    }
}

impl TerminationCondition for TimeLimit {
    fn initialize(&mut self) {
        self.start = Some(Instant::now());
    }

    fn continue_further(&mut self, iteration: usize, _score: f64, _size: usize) -> bool {
        self.continue_unscored(iteration)
    }

    fn continue_unscored(&mut self, _iteration: usize) -> bool {
        let start = *self.start.get_or_insert_with(Instant::now);
        start.elapsed() < self.limit
    }

    fn describe(&self) -> String {
        format!("{:?} wall clock", self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_seen_through_the_handle() {
        let mut c = CancellationFlag::new();
        let handle = c.handle();
        assert!(c.continue_further(0, 0.0, 0));
        handle.store(true, Ordering::SeqCst);
        assert!(!c.continue_further(1, 0.0, 0));
    }

    #[test]
    fn zero_budget_stops_immediately() {
        let mut c = TimeLimit::new(Duration::ZERO);
        c.initialize();
        assert!(!c.continue_further(0, 0.0, 0));
    }
}
