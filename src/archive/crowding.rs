use super::base::{Archive, Members, check_capacity, survivors};
use crate::crowding::density_values;
use crate::error::Result;
use crate::individual::IndividualRef;
use std::cmp::Ordering;

/// Bounded archive that culls the most crowded individuals first.
///
/// When the non-dominated survivors exceed the capacity, the crowding
/// distance is computed over all of them (members in creation order, then
/// candidates in input order) and the `capacity` most isolated are kept.
/// Boundary individuals have infinite distance and so outlive interior ones.
/// Ties keep the earlier individual, which makes the outcome a function of
/// the input order alone.
pub struct CrowdingArchive<G, P> {
    members: Members<G, P>,
    capacity: usize,
}

impl<G, P> CrowdingArchive<G, P> {
    /// # Errors
    ///
    /// [`crate::Error::IllegalArgument`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            members: Members::new(),
            capacity: check_capacity(capacity)?,
        })
    }
}

impl<G, P> Archive<G, P> for CrowdingArchive<G, P> {
    fn update(&mut self, candidates: &[IndividualRef<G, P>]) -> bool {
        let survivors = survivors(&self.members, candidates);
        if survivors.candidates.is_empty() && survivors.dominated.is_empty() {
            return false;
        }

        let mut combined: Vec<IndividualRef<G, P>> = self
            .members
            .iter()
            .filter(|m| !survivors.dominated.contains(&m.id()))
            .cloned()
            .collect();
        combined.extend(survivors.candidates);

        if combined.len() > self.capacity {
            let density = density_values(&combined);
            let mut order: Vec<usize> = (0..combined.len()).collect();
            order.sort_by(|&a, &b| {
                density[b]
                    .partial_cmp(&density[a])
                    .unwrap_or(Ordering::Equal)
            });
            log::debug!(
                "crowding archive culls {} of {} survivors",
                combined.len() - self.capacity,
                combined.len()
            );
            order.truncate(self.capacity);
            order.sort_unstable();
            combined = order.into_iter().map(|i| combined[i].clone()).collect();
        }
        self.members.replace(combined)
    }

    fn members(&self) -> &Members<G, P> {
        &self.members
    }

    fn members_mut(&mut self) -> &mut Members<G, P> {
        &mut self.members
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::testing::*;
    use super::*;
    use crate::error::Error;

    fn line(n: usize) -> Vec<IndividualRef<Vec<f64>, Vec<f64>>> {
        (0..n)
            .map(|i| evaluated(&[i as f64, (n - 1 - i) as f64]))
            .collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            CrowdingArchive::<u8, u8>::new(0),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_capacity_respected_and_extremes_kept() {
        let mut archive = CrowdingArchive::new(4).unwrap();
        let front = line(20);
        archive.update(&front);
        assert_eq!(archive.len(), 4);
        assert!(archive.contains(&front[0]));
        assert!(archive.contains(&front[19]));
    }

    #[test]
    fn test_fits_without_culling() {
        let mut archive = CrowdingArchive::new(10).unwrap();
        let front = line(5);
        assert!(archive.update(&front));
        assert_eq!(archive.len(), 5);
    }

    #[test]
    fn test_prefers_isolated_interior_point() {
        let mut archive = CrowdingArchive::new(3).unwrap();
        let a = evaluated(&[0.0, 10.0]);
        let crowded = evaluated(&[1.0, 9.0]);
        let isolated = evaluated(&[5.0, 5.0]);
        let b = evaluated(&[10.0, 0.0]);
        archive.update(&[a.clone(), crowded.clone(), isolated.clone(), b.clone()]);
        assert!(archive.contains(&a));
        assert!(archive.contains(&b));
        assert!(archive.contains(&isolated));
        assert!(!archive.contains(&crowded));
    }

    #[test]
    fn test_direct_add_beyond_capacity_fails() {
        let mut archive = CrowdingArchive::new(2).unwrap();
        let front = line(3);
        archive.add_all(&front[..2]).unwrap();
        assert_eq!(
            archive.add(front[2].clone()),
            Err(Error::OutOfBounds { capacity: 2 })
        );
        assert_eq!(archive.len(), 2);
        // Re-adding a member does not count against capacity.
        assert_eq!(archive.add(front[0].clone()), Ok(false));
    }
}
