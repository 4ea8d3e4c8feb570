use super::base::{Archive, Members, survivors};
use crate::individual::IndividualRef;

/// Keeps every non-dominated individual ever offered. No capacity limit.
pub struct UnboundedArchive<G, P> {
    members: Members<G, P>,
}

impl<G, P> Default for UnboundedArchive<G, P> {
    fn default() -> Self {
        Self {
            members: Members::new(),
        }
    }
}

impl<G, P> UnboundedArchive<G, P> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G, P> Archive<G, P> for UnboundedArchive<G, P> {
    fn update(&mut self, candidates: &[IndividualRef<G, P>]) -> bool {
        let survivors = survivors(&self.members, candidates);
        let changed = !survivors.dominated.is_empty() || !survivors.candidates.is_empty();
        for id in survivors.dominated {
            self.members.remove(id);
        }
        for candidate in survivors.candidates {
            self.members.insert(candidate);
        }
        changed
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
    fn test_dominated_point_is_rejected() {
        let mut archive = UnboundedArchive::new();
        let batch = vec![
            evaluated(&[1.0, 5.0]),
            evaluated(&[5.0, 1.0]),
            evaluated(&[3.0, 3.0]),
            evaluated(&[2.0, 2.0]),
        ];
        assert!(archive.update(&batch));
        let mut kept: Vec<Vec<f64>> = archive.iter().map(values).collect();
        kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(kept, vec![vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]]);
    }

    #[test]
    fn test_signed_zero_candidate_does_not_evict_incumbent() {
        let mut archive = UnboundedArchive::new();
        let incumbent = evaluated(&[0.0, 1.0]);
        archive.update(&[incumbent.clone()]);
        let twin = evaluated(&[-0.0, 1.0]);
        assert!(!archive.update(&[twin.clone()]));
        assert!(archive.contains(&incumbent));
        assert!(!archive.contains(&twin));
    }

    #[test]
    fn test_update_evicts_newly_dominated_members() {
        let mut archive = UnboundedArchive::new();
        let old = evaluated(&[1.0, 1.0]);
        archive.update(&[old.clone()]);
        let new = evaluated(&[2.0, 2.0]);
        assert!(archive.update(&[new.clone()]));
        assert!(!archive.contains(&old));
        assert!(archive.contains(&new));
    }

    #[test]
    fn test_repeated_update_reports_no_change() {
        let mut archive = UnboundedArchive::new();
        let batch = vec![evaluated(&[1.0, 2.0]), evaluated(&[2.0, 1.0])];
        assert!(archive.update(&batch));
        assert!(!archive.update(&batch));
        assert!(!archive.update(&[evaluated(&[0.5, 0.5])]));
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_direct_add_is_unbounded() {
        let mut archive = UnboundedArchive::new();
        for i in 0..100 {
            assert!(archive.add(evaluated(&[i as f64, 0.0])).unwrap());
        }
        assert_eq!(archive.capacity(), None);
        assert_eq!(archive.len(), 100);
    }
}
