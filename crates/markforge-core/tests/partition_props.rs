mod common;

use common::point_pool;
use fastrand::Rng;
use markforge_core::mark::MarkId;
use markforge_core::partition::Partition;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Birth(usize),
    Death(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![(1usize..4).prop_map(Op::Birth), (0usize..8).prop_map(Op::Death)]
}

proptest! {
    #[test]
    fn prop_sample_size_and_distinctness(pool in 0u64..30, n in 0usize..40, seed in any::<u64>()) {
        let mut p = Partition::from_pool(point_pool(pool)).unwrap();
        let mut rng = Rng::with_seed(seed);

        let drawn = p.sample_from_available(n, &mut rng);
        prop_assert_eq!(drawn.len(), n.min(pool as usize));

        let ids: HashSet<MarkId> = drawn.iter().map(|m| m.id()).collect();
        prop_assert_eq!(ids.len(), drawn.len());
        prop_assert!(ids.iter().all(|id| p.is_available(*id)));
        prop_assert_eq!(p.available_len(), pool as usize);
    }

    #[test]
    fn prop_consecutive_samples_do_not_overlap(pool in 2u64..30, seed in any::<u64>()) {
        let mut p = Partition::from_pool(point_pool(pool)).unwrap();
        let mut rng = Rng::with_seed(seed);
        let half = pool as usize / 2;

        let a: HashSet<MarkId> = p.sample_from_available(half, &mut rng).iter().map(|m| m.id()).collect();
        let b: HashSet<MarkId> = p.sample_from_available(half, &mut rng).iter().map(|m| m.id()).collect();
        prop_assert_eq!(a.len(), half);
        prop_assert_eq!(b.len(), half);
        prop_assert!(a.is_disjoint(&b));
    }

    #[test]
    fn prop_sets_stay_disjoint_under_moves(ops in proptest::collection::vec(arb_op(), 0..60), seed in any::<u64>()) {
        let pool = 12u64;
        let mut p = Partition::from_pool(point_pool(pool)).unwrap();
        let mut rng = Rng::with_seed(seed);
        let mut accepted = Vec::new();

        for op in ops {
            match op {
                Op::Birth(n) => {
                    let drawn = p.sample_from_available(n, &mut rng);
                    p.move_available_to_accepted(&drawn).unwrap();
                    accepted.extend(drawn);
                }
                Op::Death(i) if !accepted.is_empty() => {
                    let victim = accepted.swap_remove(i % accepted.len());
                    p.move_accepted_to_available(&victim).unwrap();
                }
                Op::Death(_) => {}
            }

            let avail: HashSet<MarkId> = p.available_ids().into_iter().collect();
            let acc: HashSet<MarkId> = p.accepted_ids().into_iter().collect();
            prop_assert!(avail.is_disjoint(&acc));
            prop_assert_eq!(avail.len() + acc.len(), pool as usize);
            prop_assert_eq!(acc.len(), accepted.len());
        }
    }
}

#[test]
fn failed_move_changes_nothing() {
    let pool = point_pool(3);
    let mut p = Partition::from_pool(pool.clone()).unwrap();
    p.move_available_to_accepted(&pool[..1]).unwrap();

    let err = p.move_available_to_accepted(&pool[..2]).unwrap_err();
    assert!(!err.is_recoverable());
    assert_eq!(p.available_ids(), vec![MarkId(1), MarkId(2)]);
    assert_eq!(p.accepted_ids(), vec![MarkId(0)]);
}

#[test]
fn exhausted_pool_samples_nothing() {
    let pool = point_pool(2);
    let mut p = Partition::from_pool(pool.clone()).unwrap();
    p.move_available_to_accepted(&pool).unwrap();
    let mut rng = Rng::with_seed(1);
    assert!(p.sample_from_available(3, &mut rng).is_empty());
}
