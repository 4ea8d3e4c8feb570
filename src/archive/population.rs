use super::base::{Archive, Members, nondominated};
use crate::individual::IndividualRef;

/// Mirrors the non-dominated part of the set it was last updated with.
///
/// Meant to be fed the current population every iteration. Members that left
/// the population are dropped even if nothing dominates them, so unlike the
/// other archives it does not keep the best front seen across iterations.
pub struct PopulationArchive<G, P> {
    members: Members<G, P>,
}

impl<G, P> Default for PopulationArchive<G, P> {
    fn default() -> Self {
        Self {
            members: Members::new(),
        }
    }
}

impl<G, P> PopulationArchive<G, P> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G, P> Archive<G, P> for PopulationArchive<G, P> {
    fn update(&mut self, candidates: &[IndividualRef<G, P>]) -> bool {
        self.members.replace(nondominated(candidates))
    }

    fn members(&self) -> &Members<G, P> {
        &self.members
    }

    fn members_mut(&mut self) -> &mut Members<G, P> {
        &mut self.members
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::testing::*;
    use super::*;

    #[test]
    fn test_tracks_current_population_only() {
        let mut archive = PopulationArchive::new();
        let a = evaluated(&[1.0, 5.0]);
        let b = evaluated(&[5.0, 1.0]);
        let weak = evaluated(&[0.0, 0.0]);
        assert!(archive.update(&[a.clone(), b.clone(), weak.clone()]));
        assert_eq!(archive.len(), 2);

        // `a` and `b` left the population; the weak survivor takes over.
        assert!(archive.update(&[weak.clone()]));
        assert_eq!(archive.to_vec(), vec![weak]);
    }

    #[test]
    fn test_same_population_is_unchanged() {
        let mut archive = PopulationArchive::new();
        let batch = vec![evaluated(&[1.0, 2.0]), evaluated(&[2.0, 1.0])];
        assert!(archive.update(&batch));
        assert!(!archive.update(&batch));
    }
}
