//! Proposal kernels.
//!
//! A kernel proposes a candidate state from the current one without touching
//! anything shared, and commits its side effects in
//! [`Kernel::update_after_acceptance`] once the driver has accepted the
//! candidate. A rejected proposal therefore leaves the partition and every
//! published configuration exactly as they were.

pub mod birth;
pub mod death;
pub mod factory;
pub mod proposer;
pub mod removal;
pub mod replace;

pub use self::birth::{Birth, BirthPartition};
pub use self::death::{Death, DeathPartition};
pub use self::factory::{MarkFactory, RandomMarkFactory};
pub use self::proposer::KernelProposer;
pub use self::removal::{EnergyWeightedRemoval, RemovalPolicy, UniformRemoval};
pub use self::replace::Replace;

use crate::energy::EnergyContext;
use crate::error::{MppError, MppResult};
use crate::mark::{Mark, MarkIdAllocator};
use crate::region::Region;
use crate::state::KernelState;
use fastrand::Rng;
use std::sync::Arc;
use tracing::warn;

/// Everything a kernel may consult while proposing.
pub struct KernelContext<'a> {
    pub rng: &'a mut Rng,
    pub energy: &'a EnergyContext,
    /// Where marks may be placed.
    pub region: &'a Region,
    pub ids: &'a mut MarkIdAllocator,
    pub errors: &'a mut ErrorLog,
    pub temperature: f64,
    pub iteration: usize,
}

/// Sink for recoverable failures absorbed at the kernel boundary.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    pub calculation_failures: usize,
    pub last_message: Option<String>,
}

impl ErrorLog {
    pub fn record(&mut self, kernel: &str, iteration: usize, err: &MppError) {
        warn!(
            "Iteration {}: kernel '{}' proposal discarded: {}",
            iteration, kernel, err
        );
        self.calculation_failures += 1;
        self.last_message = Some(err.to_string());
    }
}

pub trait Kernel<S: KernelState> {
    fn name(&self) -> &str;

    /// Candidate successor of `existing`, or `None` when the kernel has
    /// nothing to offer this round. Must not mutate shared state.
    fn propose(&mut self, existing: &S, ctx: &mut KernelContext<'_>) -> MppResult<Option<S>>;

    fn is_compatible_with(&self, mark: &Mark) -> bool;

    /// Commits the last proposal. Called only when the driver accepted it,
    /// and before the next kernel is selected.
    fn update_after_acceptance(&mut self, previous: &S, accepted: &S) -> MppResult<()>;
}

/// Runs `kernel.propose`, turning recoverable failures into "no proposal".
pub fn propose_absorbing<S: KernelState>(
    kernel: &mut dyn Kernel<S>,
    existing: &S,
    ctx: &mut KernelContext<'_>,
) -> MppResult<Option<S>> {
    match kernel.propose(existing, ctx) {
        Err(e) if e.is_recoverable() => {
            ctx.errors.record(kernel.name(), ctx.iteration, &e);
            Ok(None)
        }
        other => other,
    }
}

pub(crate) fn fold_births<S: KernelState>(existing: &S, born: &[Arc<Mark>]) -> MppResult<S> {
    let mut cfg = existing.marks().shallow_copy();
    for m in born {
        cfg.add(Arc::clone(m))?;
    }
    Ok(existing.copy_change(cfg))
}

pub(crate) fn remove_at<S: KernelState>(existing: &S, index: usize) -> MppResult<(S, Arc<Mark>)> {
    let mut cfg = existing.marks().shallow_copy();
    let removed = cfg.remove(index)?;
    Ok((existing.copy_change(cfg), removed))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::energy::{CoverageOracle, EnergyStack};
    use crate::mark::{Geometry, MarkId};

    /// Owns everything a `KernelContext` borrows.
    pub struct Harness {
        pub rng: Rng,
        pub energy: EnergyContext,
        pub region: Region,
        pub ids: MarkIdAllocator,
        pub errors: ErrorLog,
    }

    impl Harness {
        pub fn new(seed: u64) -> Self {
            let region = Region::new(10, 10, 1);
            let stack = EnergyStack::filled(region, -1.0);
            Self {
                rng: Rng::with_seed(seed),
                energy: EnergyContext::new(Arc::new(CoverageOracle::default()), Arc::new(stack)),
                region,
                ids: MarkIdAllocator::new(1000),
                errors: ErrorLog::default(),
            }
        }

        pub fn ctx(&mut self) -> KernelContext<'_> {
            KernelContext {
                rng: &mut self.rng,
                energy: &self.energy,
                region: &self.region,
                ids: &mut self.ids,
                errors: &mut self.errors,
                temperature: 1.0,
                iteration: 0,
            }
        }
    }

    pub fn point(id: u64, x: i64, y: i64) -> Arc<Mark> {
        Arc::new(
            Mark::new(
                MarkId(id),
                Geometry::PointSet {
                    points: vec![[x, y, 0]],
                },
            )
            .unwrap(),
        )
    }
}
