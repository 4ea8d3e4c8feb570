//! Bounded archive driven by an adaptive hyper-grid.
//!
//! The objective space spanned by the current survivors is split into
//! `divisions` cells per dimension. While over capacity, an individual is
//! evicted from the most populated cell. The grid bounds follow the
//! survivors, so they are recomputed after each eviction. For every objective
//! the first individual holding its best value is protected, which keeps the
//! extremes of the front as long as the capacity is at least the number of
//! objectives.

use super::base::{Archive, Members, check_capacity, survivors};
use crate::error::{Error, Result};
use crate::individual::IndividualRef;
use rand::prelude::SeedableRng;
use rand::Rng;
use rand_pcg::Pcg64;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_DIVISIONS: usize = 7;

pub struct AdaptiveGridArchive<G, P> {
    members: Members<G, P>,
    capacity: usize,
    divisions: usize,
    rng: Pcg64,
}

impl<G, P> AdaptiveGridArchive<G, P> {
    /// Archive with [`DEFAULT_DIVISIONS`] divisions per objective.
    pub fn new(capacity: usize, seed: u64) -> Result<Self> {
        Self::with_divisions(capacity, DEFAULT_DIVISIONS, seed)
    }

    /// # Errors
    ///
    /// [`Error::IllegalArgument`] if `capacity` or `divisions` is 0.
    pub fn with_divisions(capacity: usize, divisions: usize, seed: u64) -> Result<Self> {
        if divisions == 0 {
            return Err(Error::IllegalArgument(
                "grid divisions must be at least 1".into(),
            ));
        }
        Ok(Self {
            members: Members::new(),
            capacity: check_capacity(capacity)?,
            divisions,
            rng: Pcg64::seed_from_u64(seed),
        })
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Index of the point to evict.
    fn victim(&mut self, points: &[Vec<f64>]) -> usize {
        let grid = Grid::span(points, self.divisions);
        let protected = extremes(points);

        let mut cells: BTreeMap<Vec<usize>, Vec<usize>> = BTreeMap::new();
        for (i, point) in points.iter().enumerate() {
            cells.entry(grid.cell(point)).or_default().push(i);
        }
        let mut crowded: Vec<&Vec<usize>> = cells.values().collect();
        // Stable: equally populated cells keep grid order.
        crowded.sort_by(|a, b| b.len().cmp(&a.len()));

        for cell in &crowded {
            let open: Vec<usize> = cell
                .iter()
                .copied()
                .filter(|i| !protected.contains(i))
                .collect();
            if !open.is_empty() {
                return open[self.rng.random_range(0..open.len())];
            }
        }
        // Only extremes are left: give one up from the densest cell.
        let densest = crowded[0];
        densest[self.rng.random_range(0..densest.len())]
    }
}

impl<G, P> Archive<G, P> for AdaptiveGridArchive<G, P> {
    fn update(&mut self, candidates: &[IndividualRef<G, P>]) -> bool {
        let survivors = survivors(&self.members, candidates);
        if survivors.candidates.is_empty() && survivors.dominated.is_empty() {
            return false;
        }

        let mut pool: Vec<IndividualRef<G, P>> = self
            .members
            .iter()
            .filter(|m| !survivors.dominated.contains(&m.id()))
            .cloned()
            .collect();
        pool.extend(survivors.candidates);

        if pool.len() > self.capacity {
            log::debug!(
                "adaptive grid archive culls {} of {} survivors",
                pool.len() - self.capacity,
                pool.len()
            );
            let mut points: Vec<Vec<f64>> = pool
                .iter()
                .map(|i| i.evaluated_objectives().normalized())
                .collect();
            while pool.len() > self.capacity {
                let victim = self.victim(&points);
                pool.remove(victim);
                points.remove(victim);
            }
        }
        self.members.replace(pool)
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

/// Per-dimension bounds of a point set, cut into equal divisions.
struct Grid {
    lower: Vec<f64>,
    upper: Vec<f64>,
    divisions: usize,
}

impl Grid {
    fn span(points: &[Vec<f64>], divisions: usize) -> Self {
        let dims = points.iter().map(Vec::len).min().unwrap_or(0);
        let mut lower = vec![f64::INFINITY; dims];
        let mut upper = vec![f64::NEG_INFINITY; dims];
        for point in points {
            for m in 0..dims {
                if point[m].is_finite() {
                    lower[m] = lower[m].min(point[m]);
                    upper[m] = upper[m].max(point[m]);
                }
            }
        }
        Self {
            lower,
            upper,
            divisions,
        }
    }

    fn cell(&self, point: &[f64]) -> Vec<usize> {
        self.lower
            .iter()
            .zip(&self.upper)
            .zip(point)
            .map(|((&lo, &hi), &v)| {
                let range = hi - lo;
                if !(range.is_finite() && range > 0.0) {
                    return 0;
                }
                let scaled = ((v - lo) / range).clamp(0.0, 1.0) * self.divisions as f64;
                (scaled.floor() as usize).min(self.divisions - 1)
            })
            .collect()
    }
}

/// For each dimension, the first point holding the smallest value.
fn extremes(points: &[Vec<f64>]) -> BTreeSet<usize> {
    let dims = points.iter().map(Vec::len).min().unwrap_or(0);
    (0..dims)
        .filter_map(|m| {
            points
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                    Some((_, v)) if v <= p[m] => best,
                    _ => Some((i, p[m])),
                })
                .map(|(i, _)| i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::base::testing::*;
    use super::*;

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(AdaptiveGridArchive::<u8, u8>::with_divisions(5, 0, 1).is_err());
        assert!(AdaptiveGridArchive::<u8, u8>::new(0, 1).is_err());
        let archive = AdaptiveGridArchive::<u8, u8>::new(5, 1).unwrap();
        assert_eq!(archive.divisions(), DEFAULT_DIVISIONS);
    }

    #[test]
    fn test_grid_cells_clamp_to_last_division() {
        let grid = Grid::span(&[vec![0.0, 0.0], vec![1.0, 2.0]], 4);
        assert_eq!(grid.cell(&[0.0, 0.0]), vec![0, 0]);
        assert_eq!(grid.cell(&[1.0, 2.0]), vec![3, 3]);
        assert_eq!(grid.cell(&[0.5, 0.9]), vec![2, 1]);
    }

    #[test]
    fn test_extremes_pick_first_minimum() {
        let points = vec![vec![1.0, 3.0], vec![0.0, 3.0], vec![0.0, 1.0]];
        assert_eq!(extremes(&points), BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_evicts_from_crowded_cell_and_keeps_extremes() {
        let mut archive = AdaptiveGridArchive::with_divisions(3, 2, 9).unwrap();
        let left = evaluated(&[0.0, 100.0]);
        let right = evaluated(&[100.0, 0.0]);
        let cluster: Vec<_> = (0..4)
            .map(|i| evaluated(&[60.0 + i as f64, 39.0 - i as f64]))
            .collect();
        let mut batch = vec![left.clone(), right.clone()];
        batch.extend(cluster.iter().cloned());
        archive.update(&batch);
        assert_eq!(archive.len(), 3);
        assert!(archive.contains(&left));
        assert!(archive.contains(&right));
        assert_eq!(cluster.iter().filter(|c| archive.contains(c)).count(), 1);
    }
}
