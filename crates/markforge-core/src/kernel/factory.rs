use crate::error::{MppError, MppResult};
use crate::mark::{Geometry, Mark, MarkId, MarkKind};
use crate::region::Region;
use fastrand::Rng;
use std::f64::consts::PI;

/// Source of brand-new marks for births that do not draw from a pool.
pub trait MarkFactory {
    fn kind(&self) -> MarkKind;

    /// A new mark with identity `id` inside `region`, or `None` if the region
    /// cannot hold one.
    fn create(&mut self, id: MarkId, region: &Region, rng: &mut Rng) -> MppResult<Option<Mark>>;
}

/// Places marks of one kind uniformly over the region with uniformly drawn
/// radii. Centres sit on voxel centres so every mark covers at least one voxel.
#[derive(Debug, Clone)]
pub struct RandomMarkFactory {
    kind: MarkKind,
    min_radius: f64,
    max_radius: f64,
}

impl RandomMarkFactory {
    pub fn new(kind: MarkKind, min_radius: f64, max_radius: f64) -> MppResult<Self> {
        if !(min_radius > 0.0 && min_radius <= max_radius && max_radius.is_finite()) {
            return Err(MppError::misconfigured(
                "birth",
                format!(
                    "radius range [{}, {}] must be positive and ordered",
                    min_radius, max_radius
                ),
            ));
        }
        Ok(Self {
            kind,
            min_radius,
            max_radius,
        })
    }

    fn radius(&self, rng: &mut Rng) -> f64 {
        self.min_radius + rng.f64() * (self.max_radius - self.min_radius)
    }
}

impl MarkFactory for RandomMarkFactory {
    fn kind(&self) -> MarkKind {
        self.kind
    }

    fn create(&mut self, id: MarkId, region: &Region, rng: &mut Rng) -> MppResult<Option<Mark>> {
        if region.is_empty() {
            return Ok(None);
        }
        let x = rng.usize(0..region.width);
        let y = rng.usize(0..region.height);
        let z = rng.usize(0..region.depth);

        let geometry = match self.kind {
            MarkKind::Ellipse => Geometry::Ellipse {
                center: [x as f64, y as f64],
                radii: [self.radius(rng), self.radius(rng)],
                angle: rng.f64() * PI,
            },
            MarkKind::Ellipsoid => Geometry::Ellipsoid {
                center: [x as f64, y as f64, z as f64],
                radii: [self.radius(rng), self.radius(rng), self.radius(rng)],
            },
            MarkKind::PointSet => {
                let reach = self.radius(rng).round().max(0.0) as i64;
                let extra = rng.usize(0..=(2 * reach as usize));
                let mut points = vec![[x as i64, y as i64, z as i64]];
                for _ in 0..extra {
                    let p = [
                        x as i64 + rng.i64(-reach..=reach),
                        y as i64 + rng.i64(-reach..=reach),
                        z as i64,
                    ];
                    if !points.contains(&p) {
                        points.push(p);
                    }
                }
                Geometry::PointSet { points }
            }
        };
        Mark::new(id, geometry).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn created_marks_touch_the_region() {
        let region = Region::new(8, 6, 2);
        let mut rng = Rng::with_seed(3);
        for kind in MarkKind::iter() {
            let mut f = RandomMarkFactory::new(kind, 0.5, 2.5).unwrap();
            for i in 0..50 {
                let m = f.create(MarkId(i), &region, &mut rng).unwrap().unwrap();
                assert_eq!(m.kind(), kind);
                assert!(!m.voxels(&region).is_empty());
            }
        }
    }

    #[test]
    fn empty_region_yields_nothing() {
        let mut f = RandomMarkFactory::new(MarkKind::Ellipse, 1.0, 1.0).unwrap();
        let mut rng = Rng::with_seed(1);
        assert!(f
            .create(MarkId(0), &Region::new(0, 4, 1), &mut rng)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bad_radius_range_is_misconfiguration() {
        let err = RandomMarkFactory::new(MarkKind::Ellipse, 3.0, 1.0).unwrap_err();
        assert!(matches!(err, MppError::MisconfiguredKernel { .. }));
    }
}
