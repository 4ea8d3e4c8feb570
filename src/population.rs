use crate::individual::{IndividualId, IndividualRef};
use std::collections::BTreeMap;

/// Working set of individuals mutated by an optimizer between completer calls.
///
/// Set semantics by individual identity. Iteration follows creation order,
/// which keeps completion and archive updates reproducible.
pub struct Population<G, P> {
    members: BTreeMap<IndividualId, IndividualRef<G, P>>,
}

impl<G, P> Default for Population<G, P> {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }
}

impl<G, P> Population<G, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the individual was already present.
    pub fn add(&mut self, individual: IndividualRef<G, P>) -> bool {
        self.members.insert(individual.id(), individual).is_none()
    }

    pub fn remove(&mut self, individual: &IndividualRef<G, P>) -> bool {
        self.members.remove(&individual.id()).is_some()
    }

    pub fn contains(&self, individual: &IndividualRef<G, P>) -> bool {
        self.members.contains_key(&individual.id())
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&IndividualRef<G, P>) -> bool,
    {
        self.members.retain(|_, individual| keep(individual));
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndividualRef<G, P>> {
        self.members.values()
    }

    /// Members not yet `EVALUATED`.
    pub fn pending(&self) -> impl Iterator<Item = &IndividualRef<G, P>> {
        self.iter().filter(|i| !i.is_evaluated())
    }

    pub fn to_vec(&self) -> Vec<IndividualRef<G, P>> {
        self.members.values().cloned().collect()
    }
}

impl<G, P> Extend<IndividualRef<G, P>> for Population<G, P> {
    fn extend<I: IntoIterator<Item = IndividualRef<G, P>>>(&mut self, iter: I) {
        for individual in iter {
            self.add(individual);
        }
    }
}

impl<G, P> FromIterator<IndividualRef<G, P>> for Population<G, P> {
    fn from_iter<I: IntoIterator<Item = IndividualRef<G, P>>>(iter: I) -> Self {
        let mut population = Population::new();
        population.extend(iter);
        population
    }
}

impl<'a, G, P> IntoIterator for &'a Population<G, P> {
    type Item = &'a IndividualRef<G, P>;
    type IntoIter = std::collections::btree_map::Values<'a, IndividualId, IndividualRef<G, P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Individual;
    use std::sync::Arc;

    #[test]
    fn test_set_semantics() {
        let a: IndividualRef<u8, u8> = Arc::new(Individual::new());
        let b: IndividualRef<u8, u8> = Arc::new(Individual::new());
        let mut population = Population::new();
        assert!(population.add(a.clone()));
        assert!(!population.add(a.clone()));
        population.add(b.clone());
        assert_eq!(population.len(), 2);
        assert!(population.remove(&a));
        assert!(!population.contains(&a));
        assert!(population.contains(&b));
        population.clear();
        assert!(population.is_empty());
    }

    #[test]
    fn test_iterates_in_creation_order() {
        let individuals: Vec<IndividualRef<u8, u8>> =
            (0..5).map(|_| Arc::new(Individual::new())).collect();
        let population: Population<_, _> = individuals.iter().rev().cloned().collect();
        let ids: Vec<_> = population.iter().map(|i| i.id()).collect();
        let expected: Vec<_> = individuals.iter().map(|i| i.id()).collect();
        assert_eq!(ids, expected);
        assert_eq!(population.pending().count(), 5);
    }
}
