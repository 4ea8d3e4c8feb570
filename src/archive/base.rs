use crate::error::{Error, Result};
use crate::individual::{IndividualId, IndividualRef};
use crate::population::Population;
use std::collections::{BTreeMap, BTreeSet};

/// Duplicate-free archive storage, iterated in individual creation order.
pub struct Members<G, P> {
    members: BTreeMap<IndividualId, IndividualRef<G, P>>,
}

impl<G, P> Default for Members<G, P> {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }
}

impl<G, P> Members<G, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, individual: IndividualRef<G, P>) -> bool {
        self.members.insert(individual.id(), individual).is_none()
    }

    pub fn remove(&mut self, id: IndividualId) -> bool {
        self.members.remove(&id).is_some()
    }

    pub fn contains(&self, id: IndividualId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndividualRef<G, P>> {
        self.members.values()
    }

    pub fn to_vec(&self) -> Vec<IndividualRef<G, P>> {
        self.members.values().cloned().collect()
    }

    fn ids(&self) -> BTreeSet<IndividualId> {
        self.members.keys().copied().collect()
    }

    /// Replaces the content wholesale. Returns true if membership changed.
    pub fn replace(&mut self, individuals: Vec<IndividualRef<G, P>>) -> bool {
        let before = self.ids();
        self.members = individuals.into_iter().map(|i| (i.id(), i)).collect();
        before != self.ids()
    }
}

/// A long-lived set of individuals approximating the Pareto front.
///
/// [`Archive::update`] is the only dominance-aware mutation. The direct
/// [`Archive::add`]/[`Archive::remove`] calls skip dominance checks and exist
/// for culling and tests. Updates must be serialized by the caller; `&self`
/// methods may be used by observers while no update runs.
pub trait Archive<G, P> {
    /// Folds `candidates` into the archive. Returns true if membership changed.
    ///
    /// # Panics
    ///
    /// Panics if a candidate is not `EVALUATED`.
    fn update(&mut self, candidates: &[IndividualRef<G, P>]) -> bool;

    fn members(&self) -> &Members<G, P>;

    fn members_mut(&mut self) -> &mut Members<G, P>;

    /// `None` for unbounded archives.
    fn capacity(&self) -> Option<usize> {
        None
    }

    fn update_from(&mut self, population: &Population<G, P>) -> bool {
        self.update(&population.to_vec())
    }

    fn contains(&self, individual: &IndividualRef<G, P>) -> bool {
        self.members().contains(individual.id())
    }

    fn remove(&mut self, individual: &IndividualRef<G, P>) -> bool {
        self.members_mut().remove(individual.id())
    }

    fn len(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    fn clear(&mut self) {
        self.members_mut().clear();
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &IndividualRef<G, P>> + '_> {
        Box::new(self.members().iter())
    }

    fn to_vec(&self) -> Vec<IndividualRef<G, P>> {
        self.members().to_vec()
    }

    /// Inserts without a dominance check.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if a bounded archive is full.
    fn add(&mut self, individual: IndividualRef<G, P>) -> Result<bool> {
        self.add_all(std::slice::from_ref(&individual))
    }

    /// Inserts all or nothing, without dominance checks.
    fn add_all(&mut self, individuals: &[IndividualRef<G, P>]) -> Result<bool> {
        if let Some(capacity) = self.capacity() {
            let fresh: BTreeSet<IndividualId> = individuals
                .iter()
                .map(|i| i.id())
                .filter(|id| !self.members().contains(*id))
                .collect();
            if self.len() + fresh.len() > capacity {
                return Err(Error::OutOfBounds { capacity });
            }
        }
        let mut changed = false;
        for individual in individuals {
            changed |= self.members_mut().insert(individual.clone());
        }
        Ok(changed)
    }
}

/// Outcome of folding candidates into an archive's current content.
pub struct Survivors<G, P> {
    /// Candidates that are new and not weakly dominated by anything, in input order.
    pub candidates: Vec<IndividualRef<G, P>>,
    /// Archive members strictly dominated by a surviving candidate.
    pub dominated: Vec<IndividualId>,
}

/// Non-dominated subset of `individuals`, in input order.
///
/// An individual is dropped if another one weakly dominates it. Among
/// individuals with equal objectives the first one survives. Repeated entries
/// of the same individual are collapsed.
///
/// # Panics
///
/// Panics if an individual is not `EVALUATED`.
pub fn nondominated<G, P>(individuals: &[IndividualRef<G, P>]) -> Vec<IndividualRef<G, P>> {
    let mut seen = BTreeSet::new();
    let mut front: Vec<IndividualRef<G, P>> = Vec::new();
    for candidate in individuals {
        if !seen.insert(candidate.id()) {
            continue;
        }
        let objectives = candidate.evaluated_objectives();
        if front
            .iter()
            .any(|kept| kept.evaluated_objectives().weakly_dominates(objectives))
        {
            continue;
        }
        front.retain(|kept| !objectives.weakly_dominates(kept.evaluated_objectives()));
        front.push(candidate.clone());
    }
    front
}

/// Computes which candidates enter and which members leave, before any
/// capacity policy applies.
///
/// Candidates already in the archive are ignored. A candidate weakly
/// dominated by a member is rejected, so incumbents win ties.
pub fn survivors<G, P>(
    members: &Members<G, P>,
    candidates: &[IndividualRef<G, P>],
) -> Survivors<G, P> {
    let fresh: Vec<IndividualRef<G, P>> = candidates
        .iter()
        .filter(|c| !members.contains(c.id()))
        .cloned()
        .collect();

    let mut entering = Vec::new();
    let mut dominated = BTreeSet::new();
    for candidate in nondominated(&fresh) {
        let objectives = candidate.evaluated_objectives();
        if members
            .iter()
            .any(|m| m.evaluated_objectives().weakly_dominates(objectives))
        {
            continue;
        }
        for member in members.iter() {
            if objectives.dominates(member.evaluated_objectives()) {
                dominated.insert(member.id());
            }
        }
        entering.push(candidate);
    }

    Survivors {
        candidates: entering,
        dominated: dominated.into_iter().collect(),
    }
}

/// Validates a bounded archive capacity.
pub(crate) fn check_capacity(capacity: usize) -> Result<usize> {
    if capacity == 0 {
        return Err(Error::IllegalArgument(
            "archive capacity must be at least 1".into(),
        ));
    }
    Ok(capacity)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_nondominated_keeps_first_of_equals() {
        let a = evaluated(&[1.0, 1.0]);
        let b = evaluated(&[1.0, 1.0]);
        let front = nondominated(&[a.clone(), b]);
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].id(), a.id());
    }

    #[test]
    fn test_nondominated_drops_later_dominated_and_earlier_dominated() {
        let low = evaluated(&[1.0, 1.0]);
        let mid = evaluated(&[2.0, 0.0]);
        let high = evaluated(&[3.0, 3.0]);
        let front = nondominated(&[low, mid, high.clone(), high.clone()]);
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].id(), high.id());
    }

    #[test]
    fn test_survivors_incumbent_wins_tie() {
        let mut members = Members::new();
        let incumbent = evaluated(&[2.0, 2.0]);
        members.insert(incumbent.clone());
        let twin = evaluated(&[2.0, 2.0]);
        let better = evaluated(&[3.0, 2.0]);

        let s = survivors(&members, &[twin.clone()]);
        assert!(s.candidates.is_empty());
        assert!(s.dominated.is_empty());

        let s = survivors(&members, &[better.clone(), incumbent.clone()]);
        assert_eq!(s.candidates.len(), 1);
        assert_eq!(s.dominated, vec![incumbent.id()]);
    }

    #[test]
    #[should_panic(expected = "used as evaluated")]
    fn test_unevaluated_candidate_panics() {
        let raw: IndividualRef<Vec<f64>, Vec<f64>> =
            std::sync::Arc::new(crate::individual::Individual::new());
        nondominated(&[raw]);
    }
}
