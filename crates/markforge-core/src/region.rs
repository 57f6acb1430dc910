use serde::{Deserialize, Serialize};

/// Voxel extent marks may occupy. Doubles as the region-membership object
/// handed to kernels: births are placed inside it and voxels outside it never
/// contribute energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

/// Inclusive voxel box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: [i64; 3],
    pub max: [i64; 3],
}

impl Region {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Assumes dimensions already vetted by [`Region::checked_voxel_count`].
    pub fn voxel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn checked_voxel_count(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(self.depth)
    }

    pub fn is_empty(&self) -> bool {
        self.voxel_count() == 0
    }

    #[inline(always)]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.depth
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height + y) * self.width + x
    }

    /// The whole region as a box, or `None` when it has no voxels.
    pub fn as_box(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(BoundingBox {
            min: [0, 0, 0],
            max: [
                self.width as i64 - 1,
                self.height as i64 - 1,
                self.depth as i64 - 1,
            ],
        })
    }

    pub fn clip(&self, bbox: &BoundingBox) -> Option<BoundingBox> {
        let full = self.as_box()?;
        let mut out = *bbox;
        for axis in 0..3 {
            out.min[axis] = out.min[axis].max(full.min[axis]);
            out.max[axis] = out.max[axis].min(full.max[axis]);
            if out.min[axis] > out.max[axis] {
                return None;
            }
        }
        Some(out)
    }
}

impl BoundingBox {
    pub fn volume(&self) -> usize {
        (0..3)
            .map(|a| (self.max[a] - self.min[a] + 1).max(0) as usize)
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_discards_disjoint_boxes() {
        let region = Region::new(4, 4, 1);
        let outside = BoundingBox {
            min: [10, 10, 0],
            max: [12, 12, 0],
        };
        assert_eq!(region.clip(&outside), None);

        let straddling = BoundingBox {
            min: [-2, 1, -5],
            max: [1, 9, 5],
        };
        let clipped = region.clip(&straddling).unwrap();
        assert_eq!(clipped.min, [0, 1, 0]);
        assert_eq!(clipped.max, [1, 3, 0]);
        assert_eq!(clipped.volume(), 6);
    }
}
