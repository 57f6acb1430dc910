use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KernelStats {
    pub name: String,
    pub selected: usize,
    pub no_proposal: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl KernelStats {
    pub fn acceptance_rate(&self) -> f64 {
        let decided = self.accepted + self.rejected;
        if decided == 0 {
            0.0
        } else {
            self.accepted as f64 / decided as f64
        }
    }
}

/// Counters owned by one run. Passed around explicitly; nothing is global.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub iterations: usize,
    pub proposals: usize,
    pub no_proposals: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub calculation_failures: usize,
    pub checkpoints: usize,
    pub best_score: Option<f64>,
    pub elapsed_secs: f64,
    pub per_kernel: Vec<KernelStats>,
}

impl RunStatistics {
    pub fn for_kernels<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            per_kernel: names
                .into_iter()
                .map(|name| KernelStats {
                    name,
                    ..KernelStats::default()
                })
                .collect(),
            ..Self::default()
        }
    }

    fn kernel(&mut self, index: usize) -> Option<&mut KernelStats> {
        self.per_kernel.get_mut(index)
    }

    pub(crate) fn selected(&mut self, index: usize) {
        self.iterations += 1;
        if let Some(k) = self.kernel(index) {
            k.selected += 1;
        }
    }

    pub(crate) fn no_proposal(&mut self, index: usize) {
        self.no_proposals += 1;
        if let Some(k) = self.kernel(index) {
            k.no_proposal += 1;
        }
    }

    pub(crate) fn accepted(&mut self, index: usize, score: f64) {
        self.proposals += 1;
        self.accepted += 1;
        self.observe_score(score);
        if let Some(k) = self.kernel(index) {
            k.accepted += 1;
        }
    }

    pub(crate) fn rejected(&mut self, index: usize) {
        self.proposals += 1;
        self.rejected += 1;
        if let Some(k) = self.kernel(index) {
            k.rejected += 1;
        }
    }

    pub(crate) fn failed(&mut self, index: usize) {
        self.calculation_failures += 1;
        if let Some(k) = self.kernel(index) {
            k.failed += 1;
        }
    }

    pub(crate) fn observe_score(&mut self, score: f64) {
        if self.best_score.map_or(true, |best| score < best) {
            self.best_score = Some(score);
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }
}
