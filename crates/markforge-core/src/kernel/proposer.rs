use super::Kernel;
use crate::error::{MppError, MppResult};
use crate::state::KernelState;
use fastrand::Rng;

struct Entry<S: KernelState> {
    probability: f64,
    kernel: Box<dyn Kernel<S>>,
}

/// Weighted set of kernels; one is drawn per iteration.
pub struct KernelProposer<S: KernelState> {
    entries: Vec<Entry<S>>,
}

impl<S: KernelState> Default for KernelProposer<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: KernelState + 'static> KernelProposer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernel(mut self, probability: f64, kernel: impl Kernel<S> + 'static) -> Self {
        self.push(probability, Box::new(kernel));
        self
    }
}

impl<S: KernelState> KernelProposer<S> {
    pub fn push(&mut self, probability: f64, kernel: Box<dyn Kernel<S>>) {
        self.entries.push(Entry {
            probability,
            kernel,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.kernel.name().to_string())
            .collect()
    }

    pub fn validate(&self) -> MppResult<()> {
        if self.entries.is_empty() {
            return Err(MppError::misconfigured("proposer", "no kernels registered"));
        }
        for e in &self.entries {
            if !e.probability.is_finite() || e.probability < 0.0 {
                return Err(MppError::misconfigured(
                    e.kernel.name(),
                    format!("invalid selection probability {}", e.probability),
                ));
            }
        }
        if self.total() <= 0.0 {
            return Err(MppError::misconfigured(
                "proposer",
                "selection probabilities sum to zero",
            ));
        }
        Ok(())
    }

    fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.probability).sum()
    }

    /// Index of the kernel to run, drawn proportionally to its probability.
    pub fn select(&self, rng: &mut Rng) -> usize {
        let total = self.total();
        let mut target = rng.f64() * total;
        for (i, e) in self.entries.iter().enumerate() {
            if target < e.probability {
                return i;
            }
            target -= e.probability;
        }
        self.entries
            .iter()
            .rposition(|e| e.probability > 0.0)
            .unwrap_or(0)
    }

    pub fn kernel_mut(&mut self, index: usize) -> Option<&mut (dyn Kernel<S> + 'static)> {
        self.entries.get_mut(index).map(|e| e.kernel.as_mut())
    }

    pub fn kernel(&self, index: usize) -> Option<&dyn Kernel<S>> {
        self.entries.get(index).map(|e| e.kernel.as_ref())
    }
}
