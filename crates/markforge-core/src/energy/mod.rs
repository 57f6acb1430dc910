pub mod coverage;

pub use self::coverage::CoverageOracle;

use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};
use crate::mark::Mark;
use crate::region::Region;
use markforge_protocol::scene::StackRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Energy and mark count of one state. Lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSize {
    pub score: f64,
    pub size: usize,
}

impl ScoreSize {
    pub fn new(score: f64, size: usize) -> Self {
        Self { score, size }
    }
}

/// Dense voxel energy volume derived from an image. Negative values mark
/// evidence for objects, positive values mark background.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyStack {
    region: Region,
    values: Vec<f64>,
}

impl EnergyStack {
    pub fn new(region: Region, values: Vec<f64>) -> MppResult<Self> {
        let expected = region.checked_voxel_count().ok_or_else(|| {
            MppError::Validation(format!(
                "energy stack {}x{}x{} is too large",
                region.width, region.height, region.depth
            ))
        })?;
        if values.len() != expected {
            return Err(MppError::Validation(format!(
                "energy stack {}x{}x{} needs {} values, got {}",
                region.width,
                region.height,
                region.depth,
                expected,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MppError::Validation(
                "energy stack contains non-finite values".to_string(),
            ));
        }
        Ok(Self { region, values })
    }

    pub fn filled(region: Region, value: f64) -> Self {
        Self {
            region,
            values: vec![value; region.voxel_count()],
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.values[self.region.index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        let idx = self.region.index(x, y, z);
        self.values[idx] = value;
    }
}

impl TryFrom<&StackRecord> for EnergyStack {
    type Error = MppError;

    fn try_from(rec: &StackRecord) -> MppResult<Self> {
        let expected = rec.expected_len().ok_or_else(|| {
            MppError::Validation(format!(
                "stack record {}x{}x{} overflows the voxel count",
                rec.width, rec.height, rec.depth
            ))
        })?;
        if rec.values.len() != expected {
            return Err(MppError::Validation(format!(
                "stack record declares {} voxels but carries {}",
                expected,
                rec.values.len()
            )));
        }
        EnergyStack::new(
            Region::new(rec.width, rec.height, rec.depth),
            rec.values.clone(),
        )
    }
}

/// Scores configurations against an energy stack. Treated as an opaque,
/// read-only collaborator: implementations must be pure functions of their
/// inputs so one oracle can serve many runs.
pub trait EnergyOracle: Send + Sync {
    /// Energy contributed by a single mark in isolation.
    fn mark_energy(&self, mark: &Mark, stack: &EnergyStack) -> MppResult<f64>;

    /// Total energy of a configuration, interactions included.
    fn score(&self, cfg: &Configuration, stack: &EnergyStack) -> MppResult<ScoreSize>;
}

/// Oracle plus the stack it scores against.
#[derive(Clone)]
pub struct EnergyContext {
    pub oracle: Arc<dyn EnergyOracle>,
    pub stack: Arc<EnergyStack>,
}

impl EnergyContext {
    pub fn new(oracle: Arc<dyn EnergyOracle>, stack: Arc<EnergyStack>) -> Self {
        Self { oracle, stack }
    }

    pub fn score(&self, cfg: &Configuration) -> MppResult<ScoreSize> {
        self.oracle.score(cfg, &self.stack)
    }

    pub fn mark_energy(&self, mark: &Mark) -> MppResult<f64> {
        self.oracle.mark_energy(mark, &self.stack)
    }

    pub fn region(&self) -> &Region {
        self.stack.region()
    }
}
