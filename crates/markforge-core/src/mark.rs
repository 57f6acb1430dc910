use crate::error::{MppError, MppResult};
use crate::region::{BoundingBox, Region};
use markforge_protocol::scene::{MarkRecord, ShapeRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Identity of a mark. Configurations and partitions compare marks by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkId(pub u64);

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Ellipse,
    Ellipsoid,
    PointSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Rotated 2-D ellipse; covers its footprint in every z-slice.
    Ellipse {
        center: [f64; 2],
        radii: [f64; 2],
        angle: f64,
    },
    Ellipsoid {
        center: [f64; 3],
        radii: [f64; 3],
    },
    PointSet {
        points: Vec<[i64; 3]>,
    },
}

/// A placed geometric proposal. Immutable once constructed; shared between
/// configurations through `Arc<Mark>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    id: MarkId,
    geometry: Geometry,
}

impl Mark {
    pub fn new(id: MarkId, geometry: Geometry) -> MppResult<Self> {
        match &geometry {
            Geometry::Ellipse { center, radii, angle } => {
                check_finite(id, center.iter().chain(radii.iter()).chain([angle]))?;
                check_radii(id, radii)?;
            }
            Geometry::Ellipsoid { center, radii } => {
                check_finite(id, center.iter().chain(radii.iter()))?;
                check_radii(id, radii)?;
            }
            Geometry::PointSet { points } => {
                if points.is_empty() {
                    return Err(MppError::Validation(format!(
                        "point-set mark {} has no points",
                        id
                    )));
                }
            }
        }
        Ok(Self { id, geometry })
    }

    #[inline(always)]
    pub fn id(&self) -> MarkId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn kind(&self) -> MarkKind {
        match self.geometry {
            Geometry::Ellipse { .. } => MarkKind::Ellipse,
            Geometry::Ellipsoid { .. } => MarkKind::Ellipsoid,
            Geometry::PointSet { .. } => MarkKind::PointSet,
        }
    }

    /// Does the mark cover the voxel centred at `(x, y, z)`?
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        match &self.geometry {
            Geometry::Ellipse {
                center,
                radii,
                angle,
            } => {
                let dx = x as f64 - center[0];
                let dy = y as f64 - center[1];
                let (sin, cos) = angle.sin_cos();
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                (u / radii[0]).powi(2) + (v / radii[1]).powi(2) <= 1.0
            }
            Geometry::Ellipsoid { center, radii } => {
                let p = [x as f64, y as f64, z as f64];
                (0..3)
                    .map(|a| ((p[a] - center[a]) / radii[a]).powi(2))
                    .sum::<f64>()
                    <= 1.0
            }
            Geometry::PointSet { points } => points.contains(&[x, y, z]),
        }
    }

    /// Smallest voxel box around the mark, clipped to `region`. `None` when the
    /// mark lies entirely outside.
    pub fn bounding_box(&self, region: &Region) -> Option<BoundingBox> {
        let raw = match &self.geometry {
            Geometry::Ellipse { center, radii, .. } => {
                let r = radii[0].max(radii[1]);
                BoundingBox {
                    min: [
                        (center[0] - r).floor() as i64,
                        (center[1] - r).floor() as i64,
                        0,
                    ],
                    max: [
                        (center[0] + r).ceil() as i64,
                        (center[1] + r).ceil() as i64,
                        region.depth as i64 - 1,
                    ],
                }
            }
            Geometry::Ellipsoid { center, radii } => BoundingBox {
                min: [
                    (center[0] - radii[0]).floor() as i64,
                    (center[1] - radii[1]).floor() as i64,
                    (center[2] - radii[2]).floor() as i64,
                ],
                max: [
                    (center[0] + radii[0]).ceil() as i64,
                    (center[1] + radii[1]).ceil() as i64,
                    (center[2] + radii[2]).ceil() as i64,
                ],
            },
            Geometry::PointSet { points } => {
                let mut min = [i64::MAX; 3];
                let mut max = [i64::MIN; 3];
                for p in points {
                    for a in 0..3 {
                        min[a] = min[a].min(p[a]);
                        max[a] = max[a].max(p[a]);
                    }
                }
                BoundingBox { min, max }
            }
        };
        region.clip(&raw)
    }

    /// Voxels covered by the mark inside `region`, in x-fastest order.
    pub fn voxels(&self, region: &Region) -> Vec<[usize; 3]> {
        let Some(bbox) = self.bounding_box(region) else {
            return Vec::new();
        };

        if let Geometry::PointSet { points } = &self.geometry {
            let mut out: Vec<[usize; 3]> = points
                .iter()
                .filter(|p| region.contains(p[0], p[1], p[2]))
                .map(|p| [p[0] as usize, p[1] as usize, p[2] as usize])
                .collect();
            out.sort_by_key(|p| (p[2], p[1], p[0]));
            out.dedup();
            return out;
        }

        let mut out = Vec::new();
        for z in bbox.min[2]..=bbox.max[2] {
            for y in bbox.min[1]..=bbox.max[1] {
                for x in bbox.min[0]..=bbox.max[0] {
                    if self.contains(x, y, z) {
                        out.push([x as usize, y as usize, z as usize]);
                    }
                }
            }
        }
        out
    }

    pub fn to_record(&self) -> MarkRecord {
        let shape = match &self.geometry {
            Geometry::Ellipse {
                center,
                radii,
                angle,
            } => ShapeRecord::Ellipse {
                center: *center,
                radii: *radii,
                angle: *angle,
            },
            Geometry::Ellipsoid { center, radii } => ShapeRecord::Ellipsoid {
                center: *center,
                radii: *radii,
            },
            Geometry::PointSet { points } => ShapeRecord::PointSet {
                points: points.clone(),
            },
        };
        MarkRecord {
            id: self.id.0,
            shape,
        }
    }
}

impl TryFrom<&MarkRecord> for Mark {
    type Error = MppError;

    fn try_from(rec: &MarkRecord) -> MppResult<Self> {
        let geometry = match &rec.shape {
            ShapeRecord::Ellipse {
                center,
                radii,
                angle,
            } => Geometry::Ellipse {
                center: *center,
                radii: *radii,
                angle: *angle,
            },
            ShapeRecord::Ellipsoid { center, radii } => Geometry::Ellipsoid {
                center: *center,
                radii: *radii,
            },
            ShapeRecord::PointSet { points } => Geometry::PointSet {
                points: points.clone(),
            },
        };
        Mark::new(MarkId(rec.id), geometry)
    }
}

fn check_finite<'a>(id: MarkId, values: impl Iterator<Item = &'a f64>) -> MppResult<()> {
    for v in values {
        if !v.is_finite() {
            return Err(MppError::Validation(format!(
                "mark {} has a non-finite parameter",
                id
            )));
        }
    }
    Ok(())
}

fn check_radii(id: MarkId, radii: &[f64]) -> MppResult<()> {
    if radii.iter().any(|&r| r <= 0.0) {
        return Err(MppError::Validation(format!(
            "mark {} has a non-positive radius",
            id
        )));
    }
    Ok(())
}

/// Hands out fresh mark ids. Owned by the run and passed through the kernel
/// context so births never reuse an id already present in a pool.
#[derive(Debug, Clone)]
pub struct MarkIdAllocator {
    next: u64,
}

impl MarkIdAllocator {
    pub fn new(first: u64) -> Self {
        Self { next: first }
    }

    /// Starts right after the largest id seen so far.
    pub fn after(largest: Option<MarkId>) -> MppResult<Self> {
        match largest {
            None => Ok(Self::new(0)),
            Some(id) => id.0.checked_add(1).map(Self::new).ok_or_else(|| {
                MppError::Validation(format!("mark {} leaves no room for fresh ids", id))
            }),
        }
    }

    pub fn next_id(&mut self) -> MppResult<MarkId> {
        let id = MarkId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| MppError::abnormal("mark id space exhausted"))?;
        Ok(id)
    }

    pub fn peek(&self) -> MarkId {
        MarkId(self.next)
    }
}
