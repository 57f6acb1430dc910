//! Kernel space versus reported space.
//!
//! Kernels work on cheap states (`U`). Reports and termination may want a
//! richer projection (`T`), e.g. per-mark voxel contributions. A bridge maps
//! between the two, and an [`AssignMode`] decides whether the driver reports
//! the kernel state as is or projects it first.

use crate::acceptance::ExtractScoreSize;
use crate::energy::{EnergyContext, ScoreSize};
use crate::error::{MppError, MppResult};
use crate::mark::MarkId;
use crate::state::KernelState;
use rayon::prelude::*;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

pub trait KernelStateBridge<U, T> {
    fn transform(&self, kernel: &U) -> MppResult<T>;

    fn state_to_kernel(&self, state: &T) -> U;

    /// Absent input yields absent output without calling `transform`.
    fn kernel_to_state(&self, kernel: Option<&U>) -> MppResult<Option<T>> {
        kernel.map(|k| self.transform(k)).transpose()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityBridge;

impl<U: Clone> KernelStateBridge<U, U> for IdentityBridge {
    fn transform(&self, kernel: &U) -> MppResult<U> {
        Ok(kernel.clone())
    }

    fn state_to_kernel(&self, state: &U) -> U {
        state.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkEnergy {
    pub id: MarkId,
    pub voxels: usize,
    pub energy: f64,
}

/// Kernel state plus per-mark voxel-level energy contributions.
#[derive(Debug, Clone)]
pub struct Pixelized<U> {
    pub kernel: U,
    pub contributions: Vec<MarkEnergy>,
    /// Configuration energy, interactions included.
    pub total: f64,
}

impl<U: KernelState> Pixelized<U> {
    pub fn size(&self) -> usize {
        self.kernel.marks().size()
    }
}

/// Projects kernel states onto the voxel grid.
pub struct Pixelizer {
    energy: EnergyContext,
    transforms: AtomicUsize,
}

impl Pixelizer {
    pub fn new(energy: EnergyContext) -> Self {
        Self {
            energy,
            transforms: AtomicUsize::new(0),
        }
    }

    /// Number of projections computed so far.
    pub fn transform_count(&self) -> usize {
        self.transforms.load(Ordering::Relaxed)
    }
}

impl<U: KernelState> KernelStateBridge<U, Pixelized<U>> for Pixelizer {
    fn transform(&self, kernel: &U) -> MppResult<Pixelized<U>> {
        self.transforms.fetch_add(1, Ordering::Relaxed);
        let region = self.energy.region();
        let contributions = kernel
            .marks()
            .marks()
            .par_iter()
            .map(|m| -> MppResult<MarkEnergy> {
                Ok(MarkEnergy {
                    id: m.id(),
                    voxels: m.voxels(region).len(),
                    energy: self.energy.mark_energy(m)?,
                })
            })
            .collect::<MppResult<Vec<_>>>()?;
        let total = self.energy.score(kernel.marks())?.score;
        Ok(Pixelized {
            kernel: kernel.clone(),
            contributions,
            total,
        })
    }

    fn state_to_kernel(&self, state: &Pixelized<U>) -> U {
        state.kernel.clone()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PixelizedExtract;

impl<U: KernelState> ExtractScoreSize<Pixelized<U>> for PixelizedExtract {
    fn extract(&self, state: &Pixelized<U>) -> MppResult<ScoreSize> {
        Ok(ScoreSize::new(state.total, state.size()))
    }
}

/// How the driver turns the accepted kernel state into a reported state.
pub trait AssignMode<U> {
    type Reported;

    fn name(&self) -> &'static str;

    /// Reported state and the `(score, size)` termination sees. `kernel_score`
    /// is what acceptance already computed for `kernel`.
    fn report(&self, kernel: &U, kernel_score: ScoreSize) -> MppResult<(Self::Reported, ScoreSize)>;

    /// True when the reported score is always the acceptance score, so the
    /// driver can hand termination a fresh value without reporting.
    fn reports_kernel_score(&self) -> bool {
        false
    }
}

/// Reports the kernel state itself, reusing the acceptance score.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectAssignMode;

impl<U: Clone> AssignMode<U> for DirectAssignMode {
    type Reported = U;

    fn name(&self) -> &'static str {
        "direct"
    }

    fn report(&self, kernel: &U, kernel_score: ScoreSize) -> MppResult<(U, ScoreSize)> {
        Ok((kernel.clone(), kernel_score))
    }

    fn reports_kernel_score(&self) -> bool {
        true
    }
}

/// Projects through a bridge and scores the projection.
pub struct TransformationAssignMode<B, X, T> {
    bridge: B,
    extract: X,
    _reported: PhantomData<fn() -> T>,
}

impl<B, X, T> TransformationAssignMode<B, X, T> {
    pub fn new(bridge: B, extract: X) -> Self {
        Self {
            bridge,
            extract,
            _reported: PhantomData,
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }
}

impl<U, T, B, X> AssignMode<U> for TransformationAssignMode<B, X, T>
where
    B: KernelStateBridge<U, T>,
    X: ExtractScoreSize<T>,
{
    type Reported = T;

    fn name(&self) -> &'static str {
        "transformation"
    }

    fn report(&self, kernel: &U, _kernel_score: ScoreSize) -> MppResult<(T, ScoreSize)> {
        let state = self
            .bridge
            .kernel_to_state(Some(kernel))?
            .ok_or_else(|| MppError::abnormal("bridge dropped a present kernel state"))?;
        let score = self.extract.extract(&state)?;
        Ok((state, score))
    }
}

/// Transformation mode producing [`Pixelized`] reports.
pub type PixelizedAssignMode<U> = TransformationAssignMode<Pixelizer, PixelizedExtract, Pixelized<U>>;

pub fn pixelized_assign_mode<U: KernelState>(energy: EnergyContext) -> PixelizedAssignMode<U> {
    TransformationAssignMode::new(Pixelizer::new(energy), PixelizedExtract)
}
