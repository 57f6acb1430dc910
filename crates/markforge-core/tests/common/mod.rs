#![allow(dead_code)]

use markforge_core::energy::{CoverageOracle, EnergyContext, EnergyStack};
use markforge_core::mark::{Geometry, Mark, MarkId};
use markforge_core::partition::Partition;
use markforge_core::region::Region;
use markforge_core::scene::{MarkRecord, SceneDefinition, ShapeRecord, StackRecord};
use markforge_core::state::MarksFromPartition;
use std::sync::Arc;

pub fn point_mark(id: u64, x: i64, y: i64) -> Arc<Mark> {
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

/// `n` single-voxel marks on row 0, one per column.
pub fn point_pool(n: u64) -> Vec<Arc<Mark>> {
    (0..n).map(|i| point_mark(i, i as i64, 0)).collect()
}

pub fn pool_state(n: u64, initial: &[u64]) -> MarksFromPartition {
    let ids: Vec<MarkId> = initial.iter().map(|&i| MarkId(i)).collect();
    MarksFromPartition::seed(Partition::from_pool(point_pool(n)).unwrap(), &ids).unwrap()
}

pub fn flat_energy(width: usize, height: usize, value: f64) -> EnergyContext {
    let stack = EnergyStack::filled(Region::new(width, height, 1), value);
    EnergyContext::new(Arc::new(CoverageOracle::new(0.0, 0.0)), Arc::new(stack))
}

/// Builder for small synthetic scenes.
pub struct SceneBuilder {
    scene: SceneDefinition,
}

impl SceneBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            scene: SceneDefinition {
                name: "test".to_string(),
                stack: StackRecord {
                    width,
                    height,
                    depth: 1,
                    values: vec![1.0; width * height],
                },
                pool: Vec::new(),
                initial: Vec::new(),
            },
        }
    }

    pub fn energy_at(mut self, x: usize, y: usize, value: f64) -> Self {
        let w = self.scene.stack.width;
        self.scene.stack.values[y * w + x] = value;
        self
    }

    pub fn ellipse(mut self, id: u64, cx: f64, cy: f64, r: f64) -> Self {
        self.scene.pool.push(MarkRecord {
            id,
            shape: ShapeRecord::Ellipse {
                center: [cx, cy],
                radii: [r, r],
                angle: 0.0,
            },
        });
        self
    }

    pub fn point(mut self, id: u64, x: i64, y: i64) -> Self {
        self.scene.pool.push(MarkRecord {
            id,
            shape: ShapeRecord::PointSet {
                points: vec![[x, y, 0]],
            },
        });
        self
    }

    pub fn initial(mut self, ids: &[u64]) -> Self {
        self.scene.initial = ids.to_vec();
        self
    }

    pub fn build(self) -> SceneDefinition {
        self.scene
    }
}
