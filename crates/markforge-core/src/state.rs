use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};
use crate::mark::MarkId;
use fnv::FnvHashSet;
use crate::partition::Partition;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Cheap kernel-space state: a configuration plus whatever bookkeeping the
/// kernels working on it need.
pub trait KernelState: Clone {
    fn marks(&self) -> &Configuration;

    /// Same bookkeeping, different configuration.
    fn copy_change(&self, marks: Configuration) -> Self;

    /// Largest mark id the state knows about, pools included. Fresh ids are
    /// allocated past it.
    fn largest_known_id(&self) -> MppResult<Option<MarkId>> {
        Ok(self.marks().largest_id())
    }

    /// Verifies the bookkeeping still agrees with the configuration.
    fn check_consistency(&self) -> MppResult<()> {
        Ok(())
    }
}

impl KernelState for Configuration {
    fn marks(&self) -> &Configuration {
        self
    }

    fn copy_change(&self, marks: Configuration) -> Self {
        marks
    }
}

/// Partition shared by every state of one run. Single-threaded by contract.
pub type SharedPartition = Rc<RefCell<Partition>>;

/// Configuration whose marks are drawn from a partitioned candidate pool.
///
/// Every copy refers to the same partition. The partition only changes when
/// a kernel commits an accepted proposal, never while proposing.
#[derive(Debug, Clone)]
pub struct MarksFromPartition {
    marks: Configuration,
    partition: SharedPartition,
}

impl MarksFromPartition {
    pub fn new(marks: Configuration, partition: SharedPartition) -> Self {
        Self { marks, partition }
    }

    /// Seeds a run: the marks listed in `initial` move from available to
    /// accepted and form the starting configuration.
    pub fn seed(mut partition: Partition, initial: &[MarkId]) -> MppResult<Self> {
        let mut seen = FnvHashSet::default();
        if let Some(dup) = initial.iter().find(|id| !seen.insert(**id)) {
            return Err(MppError::Validation(format!(
                "initial mark {} is listed twice",
                dup
            )));
        }

        let mut chosen = Vec::with_capacity(initial.len());
        for id in initial {
            let mark = partition
                .available()
                .find(|m| m.id() == *id)
                .cloned()
                .ok_or_else(|| {
                    MppError::Validation(format!("initial mark {} is not in the pool", id))
                })?;
            chosen.push(mark);
        }
        partition.move_available_to_accepted(&chosen)?;
        let marks = Configuration::from_marks(chosen)?;
        Ok(Self::new(marks, Rc::new(RefCell::new(partition))))
    }

    pub fn partition_handle(&self) -> &SharedPartition {
        &self.partition
    }

    pub fn partition(&self) -> MppResult<Ref<'_, Partition>> {
        self.partition
            .try_borrow()
            .map_err(|_| MppError::abnormal("partition is already borrowed for mutation"))
    }

    pub fn partition_mut(&self) -> MppResult<RefMut<'_, Partition>> {
        self.partition
            .try_borrow_mut()
            .map_err(|_| MppError::abnormal("partition is already borrowed"))
    }

    pub fn shares_partition_with(&self, other: &MarksFromPartition) -> bool {
        Rc::ptr_eq(&self.partition, &other.partition)
    }
}

impl KernelState for MarksFromPartition {
    fn marks(&self) -> &Configuration {
        &self.marks
    }

    fn copy_change(&self, marks: Configuration) -> Self {
        Self {
            marks,
            partition: Rc::clone(&self.partition),
        }
    }

    fn largest_known_id(&self) -> MppResult<Option<MarkId>> {
        let pool = self.partition()?.largest_id();
        Ok(pool.max(self.marks.largest_id()))
    }

    fn check_consistency(&self) -> MppResult<()> {
        self.partition()?.check_mirrors(&self.marks)
    }
}
