use criterion::{criterion_group, criterion_main, Criterion};
use fastrand::Rng;
use markforge_core::bridge::{KernelStateBridge, Pixelizer};
use markforge_core::configuration::Configuration;
use markforge_core::energy::{CoverageOracle, EnergyContext, EnergyStack};
use markforge_core::kernel::{
    BirthPartition, DeathPartition, ErrorLog, Kernel, KernelContext, Replace, UniformRemoval,
};
use markforge_core::mark::{Geometry, Mark, MarkId, MarkIdAllocator};
use markforge_core::partition::Partition;
use markforge_core::region::Region;
use markforge_core::state::MarksFromPartition;
use std::hint::black_box;
use std::sync::Arc;

const SIDE: usize = 64;

fn setup_energy() -> EnergyContext {
    let region = Region::new(SIDE, SIDE, 1);
    let mut stack = EnergyStack::filled(region, 1.0);
    for y in 0..SIDE {
        for x in 0..SIDE {
            if (x / 8 + y / 8) % 2 == 0 {
                stack.set(x, y, 0, -2.0);
            }
        }
    }
    EnergyContext::new(Arc::new(CoverageOracle::default()), Arc::new(stack))
}

// 8x8 grid of disks, one per checkerboard cell
fn setup_pool() -> Vec<Arc<Mark>> {
    let mut pool = Vec::new();
    for cy in 0..8 {
        for cx in 0..8 {
            let geometry = Geometry::Ellipse {
                center: [(cx * 8 + 4) as f64, (cy * 8 + 4) as f64],
                radii: [3.0, 3.0],
                angle: 0.0,
            };
            let mark = Mark::new(MarkId((cy * 8 + cx) as u64), geometry)
                .expect("Failed to build mark");
            pool.push(Arc::new(mark));
        }
    }
    pool
}

fn seeded_state(pool: &[Arc<Mark>], initial: usize) -> MarksFromPartition {
    let ids: Vec<MarkId> = pool.iter().take(initial).map(|m| m.id()).collect();
    let partition = Partition::from_pool(pool.iter().cloned()).expect("Failed to build pool");
    MarksFromPartition::seed(partition, &ids).expect("Failed to seed state")
}

fn criterion_benchmark(c: &mut Criterion) {
    let energy = setup_energy();
    let region = *energy.region();
    let pool = setup_pool();

    let full = Configuration::from_marks(pool.iter().cloned()).expect("Failed to build config");
    c.bench_function("score (64 disks)", |b| {
        b.iter(|| energy.score(black_box(&full)))
    });

    let pixelizer = Pixelizer::new(energy.clone());
    let state = seeded_state(&pool, 32);
    c.bench_function("pixelize (32 disks)", |b| {
        b.iter(|| pixelizer.transform(black_box(&state)))
    });

    let mut rng = Rng::with_seed(7);
    let mut ids = MarkIdAllocator::new(1_000);
    let mut errors = ErrorLog::default();

    let mut birth = BirthPartition::new(1).expect("Failed to build birth");
    c.bench_function("birth_partition propose", |b| {
        b.iter(|| {
            let mut ctx = KernelContext {
                rng: &mut rng,
                energy: &energy,
                region: &region,
                ids: &mut ids,
                errors: &mut errors,
                temperature: 1.0,
                iteration: 0,
            };
            birth.propose(black_box(&state), &mut ctx)
        })
    });

    let mut replace = Replace::<MarksFromPartition>::new(
        Box::new(DeathPartition::new(Box::new(UniformRemoval))),
        Box::new(BirthPartition::new(1).expect("Failed to build birth")),
        3,
    )
    .expect("Failed to build replace");
    c.bench_function("replace propose", |b| {
        b.iter(|| {
            let mut ctx = KernelContext {
                rng: &mut rng,
                energy: &energy,
                region: &region,
                ids: &mut ids,
                errors: &mut errors,
                temperature: 1.0,
                iteration: 0,
            };
            replace.propose(black_box(&state), &mut ctx)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
