//! Crowding-distance density indicator.
//!
//! For every objective the individuals are ordered by their sign-normalized
//! value. The two boundary individuals of each dimension get an infinite
//! distance; interior ones accumulate the normalized gap between their
//! neighbours. A larger distance means a more isolated individual, which a
//! bounded archive prefers to keep.

use crate::individual::IndividualRef;
use std::cmp::Ordering;

/// Crowding distance of each individual, aligned with the input slice.
///
/// Pure and order-stable: the same input in the same order always yields the
/// same values. Sets of at most two individuals are all boundary.
///
/// # Panics
///
/// Panics if an individual is not evaluated.
pub fn density_values<G, P>(individuals: &[IndividualRef<G, P>]) -> Vec<f64> {
    let points: Vec<Vec<f64>> = individuals
        .iter()
        .map(|i| i.evaluated_objectives().normalized())
        .collect();
    crowding_distances(&points)
}

/// Crowding distance over raw, already sign-normalized objective vectors.
pub fn crowding_distances(points: &[Vec<f64>]) -> Vec<f64> {
    let n = points.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let dims = points.iter().map(Vec::len).min().unwrap_or(0);
    let mut distance = vec![0.0; n];
    if dims == 0 {
        return vec![f64::INFINITY; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    for m in 0..dims {
        // Stable sort keeps input order among equal values.
        order.sort_by(|&a, &b| {
            points[a][m]
                .partial_cmp(&points[b][m])
                .unwrap_or(Ordering::Equal)
        });
        let first = order[0];
        let last = order[n - 1];
        distance[first] = f64::INFINITY;
        distance[last] = f64::INFINITY;

        let range = points[last][m] - points[first][m];
        if !(range.is_finite() && range > 0.0) {
            continue;
        }
        for k in 1..(n - 1) {
            let i = order[k];
            if distance[i] != f64::INFINITY {
                let gap = points[order[k + 1]][m] - points[order[k - 1]][m];
                if gap.is_finite() {
                    distance[i] += gap / range;
                }
            }
        }
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_infinite() {
        let points = vec![
            vec![0.0, 4.0],
            vec![1.0, 3.0],
            vec![2.0, 2.0],
            vec![4.0, 0.0],
        ];
        let d = crowding_distances(&points);
        assert_eq!(d[0], f64::INFINITY);
        assert_eq!(d[3], f64::INFINITY);
        assert!(d[1].is_finite() && d[2].is_finite());
    }

    #[test]
    fn test_interior_sums_normalized_gaps() {
        let points = vec![
            vec![0.0, 4.0],
            vec![1.0, 3.0],
            vec![2.0, 2.0],
            vec![4.0, 0.0],
        ];
        let d = crowding_distances(&points);
        // (2 - 0) / 4 in both dimensions.
        assert!((d[1] - 1.0).abs() < 1e-12);
        // (4 - 1) / 4 in both dimensions.
        assert!((d[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_range_dimension_is_skipped() {
        let points = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0]];
        let d = crowding_distances(&points);
        // Only the second dimension contributes: (2 - 0) / 2.
        assert_eq!(d[1], 1.0);
    }

    #[test]
    fn test_small_sets_are_all_boundary() {
        assert!(crowding_distances(&[]).is_empty());
        assert_eq!(
            crowding_distances(&[vec![1.0], vec![2.0]]),
            vec![f64::INFINITY; 2]
        );
    }

    #[test]
    fn test_deterministic() {
        let points: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 20) as f64])
            .collect();
        assert_eq!(crowding_distances(&points), crowding_distances(&points));
    }
}
