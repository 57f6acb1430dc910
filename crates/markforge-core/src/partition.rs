use crate::configuration::Configuration;
use crate::error::{MppError, MppResult};
use crate::mark::{Mark, MarkId};
use fastrand::Rng;
use fnv::FnvHashMap;
use itertools::Itertools;
use std::sync::Arc;

/// Splits a fixed pool of candidate marks into `available` (not yet in the
/// configuration) and `accepted` (currently in the configuration).
///
/// Sampling walks a shuffled round over the available marks: consecutive
/// draws never repeat a mark until the round is used up, and every mark
/// rejected in one round comes back in the next. Any change of membership
/// starts a fresh round.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    available: Vec<Arc<Mark>>,
    available_index: FnvHashMap<MarkId, usize>,
    accepted: FnvHashMap<MarkId, Arc<Mark>>,

    round: Vec<MarkId>,
    round_cursor: usize,
    round_valid: bool,
}

impl Partition {
    /// Every mark of `pool` starts out available.
    pub fn from_pool<I: IntoIterator<Item = Arc<Mark>>>(pool: I) -> MppResult<Self> {
        let mut p = Partition::default();
        for m in pool {
            if p.available_index.contains_key(&m.id()) {
                return Err(MppError::Validation(format!(
                    "candidate pool lists mark {} twice",
                    m.id()
                )));
            }
            p.push_available(m);
        }
        Ok(p)
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn accepted_len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_available(&self, id: MarkId) -> bool {
        self.available_index.contains_key(&id)
    }

    pub fn is_accepted(&self, id: MarkId) -> bool {
        self.accepted.contains_key(&id)
    }

    pub fn available_ids(&self) -> Vec<MarkId> {
        self.available.iter().map(|m| m.id()).sorted().collect()
    }

    pub fn accepted_ids(&self) -> Vec<MarkId> {
        self.accepted.keys().copied().sorted().collect()
    }

    pub fn available(&self) -> impl Iterator<Item = &Arc<Mark>> {
        self.available.iter()
    }

    pub fn largest_id(&self) -> Option<MarkId> {
        self.available
            .iter()
            .map(|m| m.id())
            .chain(self.accepted.keys().copied())
            .max()
    }

    /// Draws up to `n` distinct available marks. Returns fewer once the
    /// current round has fewer left; the following call opens a new round.
    /// Membership is left untouched.
    pub fn sample_from_available(&mut self, n: usize, rng: &mut Rng) -> Vec<Arc<Mark>> {
        if self.available.is_empty() || n == 0 {
            return Vec::new();
        }
        if !self.round_valid || self.round_cursor >= self.round.len() {
            self.round = self.available.iter().map(|m| m.id()).collect();
            rng.shuffle(&mut self.round);
            self.round_cursor = 0;
            self.round_valid = true;
        }

        let end = (self.round_cursor + n).min(self.round.len());
        let drawn: Vec<Arc<Mark>> = self.round[self.round_cursor..end]
            .iter()
            .filter_map(|id| self.available_index.get(id))
            .map(|&i| self.available[i].clone())
            .collect();
        self.round_cursor = end;
        drawn
    }

    /// Moves every mark from available to accepted. All-or-nothing: if any
    /// mark is not currently available nothing moves.
    pub fn move_available_to_accepted(&mut self, marks: &[Arc<Mark>]) -> MppResult<()> {
        for (i, m) in marks.iter().enumerate() {
            if !self.is_available(m.id()) {
                return Err(MppError::abnormal_mark(
                    "mark accepted by a birth is not in the available pool",
                    m.id(),
                ));
            }
            if marks[..i].iter().any(|o| o.id() == m.id()) {
                return Err(MppError::abnormal_mark(
                    "birth proposed the same mark twice",
                    m.id(),
                ));
            }
        }
        for m in marks {
            let moved = self.take_available(m.id())?;
            self.accepted.insert(moved.id(), moved);
        }
        Ok(())
    }

    pub fn move_accepted_to_available(&mut self, mark: &Arc<Mark>) -> MppResult<()> {
        match self.accepted.remove(&mark.id()) {
            Some(m) => {
                self.push_available(m);
                Ok(())
            }
            None => Err(MppError::abnormal_mark(
                "mark removed by a death was not accepted",
                mark.id(),
            )),
        }
    }

    /// Accepted must equal the configuration's marks and stay disjoint from available.
    pub fn check_mirrors(&self, cfg: &Configuration) -> MppResult<()> {
        if cfg.size() != self.accepted.len() {
            return Err(MppError::abnormal(format!(
                "partition holds {} accepted marks but configuration has {}",
                self.accepted.len(),
                cfg.size()
            )));
        }
        for m in cfg.iter() {
            if !self.accepted.contains_key(&m.id()) {
                return Err(MppError::abnormal_mark(
                    "configuration mark is not accepted in the partition",
                    m.id(),
                ));
            }
            if self.available_index.contains_key(&m.id()) {
                return Err(MppError::abnormal_mark(
                    "mark is both available and accepted",
                    m.id(),
                ));
            }
        }
        Ok(())
    }

    fn push_available(&mut self, mark: Arc<Mark>) {
        self.available_index.insert(mark.id(), self.available.len());
        self.available.push(mark);
        self.round_valid = false;
    }

    fn take_available(&mut self, id: MarkId) -> MppResult<Arc<Mark>> {
        let idx = self
            .available_index
            .remove(&id)
            .ok_or_else(|| MppError::abnormal_mark("mark is not available", id))?;
        let mark = self.available.swap_remove(idx);
        if let Some(moved) = self.available.get(idx) {
            self.available_index.insert(moved.id(), idx);
        }
        self.round_valid = false;
        Ok(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Geometry;

    fn pool(n: u64) -> Vec<Arc<Mark>> {
        (0..n)
            .map(|i| {
                Arc::new(
                    Mark::new(
                        MarkId(i),
                        Geometry::PointSet {
                            points: vec![[i as i64, 0, 0]],
                        },
                    )
                    .unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn rounds_do_not_repeat_until_exhausted() {
        let mut p = Partition::from_pool(pool(5)).unwrap();
        let mut rng = Rng::with_seed(7);

        let a = p.sample_from_available(2, &mut rng);
        let b = p.sample_from_available(2, &mut rng);
        let c = p.sample_from_available(2, &mut rng);
        assert_eq!((a.len(), b.len(), c.len()), (2, 2, 1));

        let ids: Vec<MarkId> = a.iter().chain(&b).chain(&c).map(|m| m.id()).sorted().collect();
        assert_eq!(ids, (0..5).map(MarkId).collect::<Vec<_>>());

        // Next round starts over.
        assert_eq!(p.sample_from_available(5, &mut rng).len(), 5);
    }

    #[test]
    fn move_is_all_or_nothing() {
        let marks = pool(3);
        let mut p = Partition::from_pool(marks.clone()).unwrap();
        p.move_available_to_accepted(&marks[..1]).unwrap();

        let err = p.move_available_to_accepted(&[marks[1].clone(), marks[0].clone()]);
        assert!(err.is_err());
        assert_eq!(p.available_ids(), vec![MarkId(1), MarkId(2)]);
        assert_eq!(p.accepted_ids(), vec![MarkId(0)]);
    }

    #[test]
    fn swap_remove_keeps_index_consistent() {
        let marks = pool(4);
        let mut p = Partition::from_pool(marks.clone()).unwrap();
        p.move_available_to_accepted(&[marks[0].clone()]).unwrap();
        p.move_available_to_accepted(&[marks[3].clone()]).unwrap();
        p.move_accepted_to_available(&marks[0]).unwrap();

        assert_eq!(p.available_ids(), vec![MarkId(0), MarkId(1), MarkId(2)]);
        for id in p.available_ids() {
            assert!(p.is_available(id));
        }
        assert!(p.move_accepted_to_available(&marks[1]).is_err());
    }

    #[test]
    fn duplicate_pool_entries_rejected() {
        let mut marks = pool(2);
        marks.push(marks[0].clone());
        assert!(Partition::from_pool(marks).is_err());
    }
}
