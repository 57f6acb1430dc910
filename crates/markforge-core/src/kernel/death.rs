use super::{remove_at, Kernel, KernelContext, RemovalPolicy};
use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};
use crate::mark::Mark;
use crate::state::{KernelState, MarksFromPartition};
use std::marker::PhantomData;
use std::sync::Arc;

/// What a state has to do once one of its marks has died for good.
pub trait CommitRemoval: KernelState {
    fn commit_removal(&self, removed: &Arc<Mark>) -> MppResult<()>;
}

impl CommitRemoval for Configuration {
    fn commit_removal(&self, _removed: &Arc<Mark>) -> MppResult<()> {
        Ok(())
    }
}

impl CommitRemoval for MarksFromPartition {
    fn commit_removal(&self, removed: &Arc<Mark>) -> MppResult<()> {
        self.partition_mut()?.move_accepted_to_available(removed)
    }
}

/// Removes one mark picked by a [`RemovalPolicy`].
pub struct Death<S = Configuration> {
    policy: Box<dyn RemovalPolicy>,
    last_removed: Option<Arc<Mark>>,
    _state: PhantomData<fn() -> S>,
}

/// Death whose victim returns to the available side of the partition.
pub type DeathPartition = Death<MarksFromPartition>;

impl<S: CommitRemoval> Death<S> {
    pub fn new(policy: Box<dyn RemovalPolicy>) -> Self {
        Self {
            policy,
            last_removed: None,
            _state: PhantomData,
        }
    }

    pub fn last_removed(&self) -> Option<&Arc<Mark>> {
        self.last_removed.as_ref()
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

impl<S: CommitRemoval> Kernel<S> for Death<S> {
    fn name(&self) -> &str {
        "death"
    }

    fn propose(&mut self, existing: &S, ctx: &mut KernelContext<'_>) -> MppResult<Option<S>> {
        self.last_removed = None;
        let marks = existing.marks();
        let Some(index) = self.policy.select_index_to_remove(marks, ctx)? else {
            return Ok(None);
        };
        if index >= marks.len() {
            return Err(MppError::abnormal(format!(
                "removal policy '{}' chose index {} of {} marks",
                self.policy.name(),
                index,
                marks.len()
            )));
        }
        let (next, removed) = remove_at(existing, index)?;
        self.last_removed = Some(removed);
        Ok(Some(next))
    }

    fn is_compatible_with(&self, _mark: &Mark) -> bool {
        true
    }

    fn update_after_acceptance(&mut self, _previous: &S, accepted: &S) -> MppResult<()> {
        let Some(removed) = self.last_removed.take() else {
            return Err(MppError::abnormal(
                "death accepted without a recorded removal",
            ));
        };
        if accepted.marks().contains(removed.id()) {
            return Err(MppError::abnormal_mark(
                "removed mark is still in the accepted configuration",
                removed.id(),
            ));
        }
        accepted.commit_removal(&removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{point, Harness};
    use super::*;
    use crate::kernel::UniformRemoval;
    use crate::mark::MarkId;
    use crate::partition::Partition;

    struct FixedIndex(usize);

    impl RemovalPolicy for FixedIndex {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn select_index_to_remove(
            &mut self,
            _marks: &Configuration,
            _ctx: &mut KernelContext<'_>,
        ) -> MppResult<Option<usize>> {
            Ok(Some(self.0))
        }
    }

    #[test]
    fn death_on_empty_configuration_proposes_nothing() {
        let mut h = Harness::new(0);
        let mut kernel: Death = Death::new(Box::new(UniformRemoval));
        assert!(kernel
            .propose(&Configuration::new(), &mut h.ctx())
            .unwrap()
            .is_none());
    }

    #[test]
    fn out_of_range_index_is_abnormal() {
        let mut h = Harness::new(0);
        let cfg = Configuration::from_marks([point(1, 0, 0)]).unwrap();
        let mut kernel: Death = Death::new(Box::new(FixedIndex(4)));
        let err = kernel.propose(&cfg, &mut h.ctx()).unwrap_err();
        assert!(matches!(err, MppError::Abnormal { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn death_partition_returns_victim_to_pool_on_acceptance() {
        let mut h = Harness::new(5);
        let pool = (0..3).map(|i| point(i, i as i64, 0));
        let state = MarksFromPartition::seed(
            Partition::from_pool(pool).unwrap(),
            &[MarkId(0), MarkId(2)],
        )
        .unwrap();
        let mut kernel = DeathPartition::new(Box::new(FixedIndex(0)));

        let next = kernel.propose(&state, &mut h.ctx()).unwrap().unwrap();
        assert_eq!(next.marks().size(), 1);
        assert_eq!(state.partition().unwrap().accepted_len(), 2);

        kernel.update_after_acceptance(&state, &next).unwrap();
        let p = state.partition().unwrap();
        assert!(p.is_available(MarkId(0)));
        assert_eq!(p.accepted_ids(), vec![MarkId(2)]);
        drop(p);
        next.check_consistency().unwrap();
    }
}
