use super::{EnergyOracle, EnergyStack, ScoreSize};
use crate::configuration::Configuration;
use crate::consts::{DEFAULT_MARK_COST, DEFAULT_OVERLAP_PENALTY};
use crate::error::{MppError, MppResult};
use crate::mark::Mark;
use fnv::FnvHashMap;

/// Reference oracle: a mark's energy is the sum of the voxel energies it
/// covers plus a fixed cost; a configuration additionally pays for every
/// voxel covered more than once.
#[derive(Debug, Clone, Copy)]
pub struct CoverageOracle {
    pub mark_cost: f64,
    pub overlap_penalty: f64,
}

impl Default for CoverageOracle {
    fn default() -> Self {
        Self {
            mark_cost: DEFAULT_MARK_COST,
            overlap_penalty: DEFAULT_OVERLAP_PENALTY,
        }
    }
}

impl CoverageOracle {
    pub fn new(mark_cost: f64, overlap_penalty: f64) -> Self {
        Self {
            mark_cost,
            overlap_penalty,
        }
    }
}

impl EnergyOracle for CoverageOracle {
    fn mark_energy(&self, mark: &Mark, stack: &EnergyStack) -> MppResult<f64> {
        let voxels = mark.voxels(stack.region());
        if voxels.is_empty() {
            return Err(MppError::Calculation(format!(
                "mark {} covers no voxel of the stack",
                mark.id()
            )));
        }
        let covered: f64 = voxels.iter().map(|v| stack.get(v[0], v[1], v[2])).sum();
        Ok(covered + self.mark_cost)
    }

    fn score(&self, cfg: &Configuration, stack: &EnergyStack) -> MppResult<ScoreSize> {
        let mut total = 0.0;
        let mut occupancy: FnvHashMap<[usize; 3], u32> = FnvHashMap::default();

        for mark in cfg.iter() {
            let voxels = mark.voxels(stack.region());
            if voxels.is_empty() {
                return Err(MppError::Calculation(format!(
                    "mark {} covers no voxel of the stack",
                    mark.id()
                )));
            }
            for v in voxels {
                total += stack.get(v[0], v[1], v[2]);
                *occupancy.entry(v).or_insert(0) += 1;
            }
            total += self.mark_cost;
        }

        let overlaps: u32 = occupancy.values().map(|&c| c - 1).sum();
        total += overlaps as f64 * self.overlap_penalty;

        Ok(ScoreSize::new(total, cfg.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::{Geometry, MarkId};
    use crate::region::Region;
    use std::sync::Arc;

    fn points(id: u64, pts: &[[i64; 3]]) -> Arc<Mark> {
        Arc::new(
            Mark::new(
                MarkId(id),
                Geometry::PointSet {
                    points: pts.to_vec(),
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn overlap_is_charged_once_per_extra_cover() {
        let stack = EnergyStack::filled(Region::new(4, 1, 1), -1.0);
        let oracle = CoverageOracle::new(0.0, 10.0);
        let cfg = Configuration::from_marks([
            points(1, &[[0, 0, 0], [1, 0, 0]]),
            points(2, &[[1, 0, 0], [2, 0, 0]]),
        ])
        .unwrap();

        let s = oracle.score(&cfg, &stack).unwrap();
        assert_eq!(s.size, 2);
        assert!((s.score - (-4.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn mark_outside_stack_is_a_calculation_failure() {
        let stack = EnergyStack::filled(Region::new(2, 2, 1), 0.0);
        let oracle = CoverageOracle::default();
        let far = points(9, &[[50, 50, 0]]);

        let err = oracle.mark_energy(&far, &stack).unwrap_err();
        assert!(err.is_recoverable());

        let cfg = Configuration::from_marks([far]).unwrap();
        assert!(oracle.score(&cfg, &stack).unwrap_err().is_recoverable());
    }

    #[test]
    fn empty_configuration_scores_zero() {
        let stack = EnergyStack::filled(Region::new(2, 2, 1), 1.0);
        let s = CoverageOracle::default()
            .score(&Configuration::new(), &stack)
            .unwrap();
        assert_eq!(s, ScoreSize::new(0.0, 0));
    }
}
