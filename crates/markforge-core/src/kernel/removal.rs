use super::KernelContext;
use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};

/// Chooses which mark a death removes.
pub trait RemovalPolicy {
    fn name(&self) -> &'static str;

    /// Index into `marks`, or `None` when there is nothing to remove.
    fn select_index_to_remove(
        &mut self,
        marks: &Configuration,
        ctx: &mut KernelContext<'_>,
    ) -> MppResult<Option<usize>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRemoval;

impl RemovalPolicy for UniformRemoval {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn select_index_to_remove(
        &mut self,
        marks: &Configuration,
        ctx: &mut KernelContext<'_>,
    ) -> MppResult<Option<usize>> {
        if marks.is_empty() {
            return Ok(None);
        }
        Ok(Some(ctx.rng.usize(0..marks.len())))
    }
}

/// Prefers removing marks with high individual energy.
///
/// Weight of a mark is `(e - e_min + 1) ^ exponent`, so the best mark still
/// keeps a non-zero chance.
#[derive(Debug, Clone, Copy)]
pub struct EnergyWeightedRemoval {
    exponent: f64,
}

impl EnergyWeightedRemoval {
    pub fn new(exponent: f64) -> MppResult<Self> {
        if !exponent.is_finite() || exponent < 0.0 {
            return Err(MppError::misconfigured(
                "death",
                format!("removal exponent must be finite and non-negative, got {}", exponent),
            ));
        }
        Ok(Self { exponent })
    }
}

impl RemovalPolicy for EnergyWeightedRemoval {
    fn name(&self) -> &'static str {
        "energy_weighted"
    }

    fn select_index_to_remove(
        &mut self,
        marks: &Configuration,
        ctx: &mut KernelContext<'_>,
    ) -> MppResult<Option<usize>> {
        if marks.is_empty() {
            return Ok(None);
        }
        let energies = marks
            .iter()
            .map(|m| ctx.energy.mark_energy(m))
            .collect::<MppResult<Vec<f64>>>()?;
        let min = energies.iter().copied().fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = energies
            .iter()
            .map(|e| (e - min + 1.0).powf(self.exponent))
            .collect();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Ok(Some(ctx.rng.usize(0..marks.len())));
        }

        let mut target = ctx.rng.f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                return Ok(Some(i));
            }
            target -= w;
        }
        Ok(Some(weights.len() - 1))
    }
}
