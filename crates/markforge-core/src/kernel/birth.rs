use super::{fold_births, Kernel, KernelContext, MarkFactory};
use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};
use crate::mark::{Mark, MarkKind};
use crate::state::{KernelState, MarksFromPartition};
use std::sync::Arc;
use tracing::trace;

/// Adds freshly created marks to a plain configuration.
pub struct Birth {
    factory: Box<dyn MarkFactory>,
    count: usize,
    last_born: Vec<Arc<Mark>>,
}

impl Birth {
    pub fn new(factory: Box<dyn MarkFactory>, count: usize) -> MppResult<Self> {
        if count == 0 {
            return Err(MppError::misconfigured("birth", "must add at least one mark"));
        }
        Ok(Self {
            factory,
            count,
            last_born: Vec::new(),
        })
    }

    pub fn last_born(&self) -> &[Arc<Mark>] {
        &self.last_born
    }

    fn propose_new_marks(&mut self, ctx: &mut KernelContext<'_>) -> MppResult<Vec<Arc<Mark>>> {
        let mut born = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let id = ctx.ids.next_id()?;
            if let Some(mark) = self.factory.create(id, ctx.region, ctx.rng)? {
                born.push(Arc::new(mark));
            }
        }
        Ok(born)
    }
}

impl Kernel<Configuration> for Birth {
    fn name(&self) -> &str {
        "birth"
    }

    fn propose(
        &mut self,
        existing: &Configuration,
        ctx: &mut KernelContext<'_>,
    ) -> MppResult<Option<Configuration>> {
        self.last_born.clear();
        let born = self.propose_new_marks(ctx)?;
        if born.is_empty() {
            return Ok(None);
        }
        let next = fold_births(existing, &born)?;
        self.last_born = born;
        Ok(Some(next))
    }

    fn is_compatible_with(&self, mark: &Mark) -> bool {
        mark.kind() == self.factory.kind()
    }

    fn update_after_acceptance(
        &mut self,
        _previous: &Configuration,
        accepted: &Configuration,
    ) -> MppResult<()> {
        for m in self.last_born.drain(..) {
            if !accepted.contains(m.id()) {
                return Err(MppError::abnormal_mark(
                    "accepted configuration lost a newborn mark",
                    m.id(),
                ));
            }
        }
        Ok(())
    }
}

/// Adds marks drawn from the available side of the partition.
///
/// Proposing only advances the partition's sampling round; the marks move to
/// the accepted side in `update_after_acceptance`.
pub struct BirthPartition {
    count: usize,
    kinds: Option<Vec<MarkKind>>,
    last_born: Vec<Arc<Mark>>,
}

impl BirthPartition {
    pub fn new(count: usize) -> MppResult<Self> {
        if count == 0 {
            return Err(MppError::misconfigured(
                "birth_partition",
                "must add at least one mark",
            ));
        }
        Ok(Self {
            count,
            kinds: None,
            last_born: Vec::new(),
        })
    }

    /// Restricts births to the given mark kinds.
    pub fn with_kinds(mut self, kinds: Vec<MarkKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    pub fn last_born(&self) -> &[Arc<Mark>] {
        &self.last_born
    }
}

impl Kernel<MarksFromPartition> for BirthPartition {
    fn name(&self) -> &str {
        "birth_partition"
    }

    fn propose(
        &mut self,
        existing: &MarksFromPartition,
        ctx: &mut KernelContext<'_>,
    ) -> MppResult<Option<MarksFromPartition>> {
        self.last_born.clear();
        let sampled = existing
            .partition_mut()?
            .sample_from_available(self.count, ctx.rng);
        let born: Vec<Arc<Mark>> = sampled
            .into_iter()
            .filter(|m| self.is_compatible_with(m))
            .collect();
        if born.is_empty() {
            trace!("birth_partition: nothing available this round");
            return Ok(None);
        }
        let next = fold_births(existing, &born)?;
        self.last_born = born;
        Ok(Some(next))
    }

    fn is_compatible_with(&self, mark: &Mark) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&mark.kind()))
    }

    fn update_after_acceptance(
        &mut self,
        _previous: &MarksFromPartition,
        accepted: &MarksFromPartition,
    ) -> MppResult<()> {
        let born = std::mem::take(&mut self.last_born);
        if let Some(lost) = born.iter().find(|m| !accepted.marks().contains(m.id())) {
            return Err(MppError::abnormal_mark(
                "accepted configuration lost a newborn mark",
                lost.id(),
            ));
        }
        accepted.partition_mut()?.move_available_to_accepted(&born)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{point, Harness};
    use super::*;
    use crate::kernel::RandomMarkFactory;
    use crate::partition::Partition;
    use itertools::Itertools;

    fn pool_state(n: u64) -> MarksFromPartition {
        let pool = (0..n).map(|i| point(i, i as i64, 0));
        MarksFromPartition::seed(Partition::from_pool(pool).unwrap(), &[]).unwrap()
    }

    #[test]
    fn birth_partition_leaves_partition_alone_until_accepted() {
        let mut h = Harness::new(7);
        let state = pool_state(5);
        let mut kernel = BirthPartition::new(2).unwrap();

        let next = kernel.propose(&state, &mut h.ctx()).unwrap().unwrap();
        assert_eq!(next.marks().size(), 2);
        assert_eq!(state.marks().size(), 0);
        assert_eq!(state.partition().unwrap().available_len(), 5);
        assert!(next.shares_partition_with(&state));

        kernel.update_after_acceptance(&state, &next).unwrap();
        let p = state.partition().unwrap();
        assert_eq!(p.available_len(), 3);
        assert_eq!(p.accepted_ids(), next.marks().ids().into_iter().sorted().collect::<Vec<_>>());
    }

    #[test]
    fn birth_partition_on_exhausted_pool_proposes_nothing() {
        let mut h = Harness::new(1);
        let state = pool_state(0);
        let mut kernel = BirthPartition::new(1).unwrap();
        assert!(kernel.propose(&state, &mut h.ctx()).unwrap().is_none());
    }

    #[test]
    fn birth_partition_kind_filter() {
        let mut h = Harness::new(2);
        let state = pool_state(3);
        let mut kernel = BirthPartition::new(3)
            .unwrap()
            .with_kinds(vec![MarkKind::Ellipse]);
        assert!(kernel.propose(&state, &mut h.ctx()).unwrap().is_none());
    }

    #[test]
    fn birth_allocates_fresh_ids() {
        let mut h = Harness::new(3);
        let factory = RandomMarkFactory::new(MarkKind::Ellipse, 1.0, 2.0).unwrap();
        let mut kernel = Birth::new(Box::new(factory), 2).unwrap();
        let existing = Configuration::from_marks([point(1, 0, 0)]).unwrap();

        let next = kernel.propose(&existing, &mut h.ctx()).unwrap().unwrap();
        assert_eq!(next.size(), 3);
        assert_eq!(existing.size(), 1);
        assert!(kernel.last_born().iter().all(|m| m.id().0 >= 1000));

        kernel.update_after_acceptance(&existing, &next).unwrap();
        assert!(kernel.last_born().is_empty());
    }

    #[test]
    fn zero_count_is_misconfiguration() {
        assert!(matches!(
            BirthPartition::new(0),
            Err(MppError::MisconfiguredKernel { .. })
        ));
    }
}
