use super::{Kernel, KernelContext};
use crate::error::{MppError, MppResult};
use crate::mark::Mark;
use crate::state::KernelState;
use tracing::trace;

/// Death followed by up to `repeats` birth attempts.
///
/// The first birth that proposes something wins. If none does, the proposal
/// is the death alone.
pub struct Replace<S: KernelState> {
    death: Box<dyn Kernel<S>>,
    birth: Box<dyn Kernel<S>>,
    repeats: usize,
    birth_taken: bool,
}

impl<S: KernelState> Replace<S> {
    pub fn new(death: Box<dyn Kernel<S>>, birth: Box<dyn Kernel<S>>, repeats: i64) -> MppResult<Self> {
        let repeats = usize::try_from(repeats).map_err(|_| {
            MppError::misconfigured("replace", format!("repeats must be >= 0, got {}", repeats))
        })?;
        Ok(Self {
            death,
            birth,
            repeats,
            birth_taken: false,
        })
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }
}

impl<S: KernelState> Kernel<S> for Replace<S> {
    fn name(&self) -> &str {
        "replace"
    }

    fn propose(&mut self, existing: &S, ctx: &mut KernelContext<'_>) -> MppResult<Option<S>> {
        self.birth_taken = false;
        let Some(after_death) = self.death.propose(existing, ctx)? else {
            return Ok(None);
        };

        let removed = existing
            .marks()
            .iter()
            .find(|m| !after_death.marks().contains(m.id()));
        if let Some(removed) = removed {
            if !self.birth.is_compatible_with(removed) {
                trace!("replace: birth cannot replace mark {}", removed.id());
                return Ok(None);
            }
        }

        for _ in 0..self.repeats {
            if let Some(next) = self.birth.propose(&after_death, ctx)? {
                self.birth_taken = true;
                return Ok(Some(next));
            }
        }
        Ok(Some(after_death))
    }

    fn is_compatible_with(&self, mark: &Mark) -> bool {
        self.death.is_compatible_with(mark) && self.birth.is_compatible_with(mark)
    }

    fn update_after_acceptance(&mut self, previous: &S, accepted: &S) -> MppResult<()> {
        self.death.update_after_acceptance(previous, accepted)?;
        if self.birth_taken {
            self.birth_taken = false;
            self.birth.update_after_acceptance(previous, accepted)?;
        }
        Ok(())
    }
}
