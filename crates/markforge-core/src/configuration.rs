use crate::error::{MppError, MppResult};
use crate::mark::{Mark, MarkId};
use fnv::FnvHashSet;
use std::sync::Arc;

/// Ordered collection of marks forming one solution state.
///
/// Cloning is shallow: the marks are shared, only the list of handles is
/// copied. Kernels never mutate a published configuration; they copy it,
/// change the copy and hand the copy back as a proposal.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    marks: Vec<Arc<Mark>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks<I: IntoIterator<Item = Arc<Mark>>>(marks: I) -> MppResult<Self> {
        let mut cfg = Self::new();
        for m in marks {
            cfg.add(m)?;
        }
        Ok(cfg)
    }

    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    /// Appends a mark. A second mark with an id already present is refused.
    pub fn add(&mut self, mark: Arc<Mark>) -> MppResult<()> {
        if self.contains(mark.id()) {
            return Err(MppError::abnormal_mark(
                "mark is already part of the configuration",
                mark.id(),
            ));
        }
        self.marks.push(mark);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> MppResult<Arc<Mark>> {
        if index >= self.marks.len() {
            return Err(MppError::abnormal(format!(
                "removal index {} out of range for {} marks",
                index,
                self.marks.len()
            )));
        }
        Ok(self.marks.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Mark>> {
        self.marks.get(index)
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.marks.len()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Mark>> {
        self.marks.iter()
    }

    pub fn marks(&self) -> &[Arc<Mark>] {
        &self.marks
    }

    pub fn position(&self, id: MarkId) -> Option<usize> {
        self.marks.iter().position(|m| m.id() == id)
    }

    pub fn contains(&self, id: MarkId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> FnvHashSet<MarkId> {
        self.marks.iter().map(|m| m.id()).collect()
    }

    /// Same marks by identity, order ignored.
    pub fn same_identities(&self, other: &Configuration) -> bool {
        self.len() == other.len() && self.ids() == other.ids()
    }

    pub fn largest_id(&self) -> Option<MarkId> {
        self.marks.iter().map(|m| m.id()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Geometry;

    fn point(id: u64) -> Arc<Mark> {
        Arc::new(
            Mark::new(
                MarkId(id),
                Geometry::PointSet {
                    points: vec![[id as i64, 0, 0]],
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn shallow_copy_shares_marks_but_not_list() {
        let original = Configuration::from_marks([point(1), point(2)]).unwrap();
        let mut copy = original.shallow_copy();
        copy.add(point(3)).unwrap();

        assert_eq!(original.size(), 2);
        assert_eq!(copy.size(), 3);
        assert!(Arc::ptr_eq(original.get(0).unwrap(), copy.get(0).unwrap()));
    }

    #[test]
    fn duplicate_identity_refused() {
        let mut cfg = Configuration::from_marks([point(1)]).unwrap();
        let err = cfg.add(point(1)).unwrap_err();
        assert!(matches!(err, MppError::Abnormal { mark: Some(MarkId(1)), .. }));
    }

    #[test]
    fn remove_out_of_range_is_abnormal() {
        let mut cfg = Configuration::from_marks([point(1)]).unwrap();
        assert!(cfg.remove(3).is_err());
        assert_eq!(cfg.remove(0).unwrap().id(), MarkId(1));
        assert!(cfg.is_empty());
    }

    #[test]
    fn identity_comparison_ignores_order() {
        let a = Configuration::from_marks([point(1), point(2)]).unwrap();
        let b = Configuration::from_marks([point(2), point(1)]).unwrap();
        assert!(a.same_identities(&b));
        assert_eq!(a.largest_id(), Some(MarkId(2)));
    }
}
