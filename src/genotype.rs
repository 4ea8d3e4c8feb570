//! Tagged genotype representation and operator dispatch.
//!
//! [`Genotype`] covers the common encodings plus a composite of named
//! children. Variation operators are looked up by [`GenotypeKind`] in an
//! [`OperatorTable`]; composites are handled by recursing into their
//! children, so only leaf kinds need registered operators.

use crate::error::{Error, Result};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Genotype {
    Boolean(Vec<bool>),
    Double {
        values: Vec<f64>,
        lower: f64,
        upper: f64,
    },
    Integer {
        values: Vec<i64>,
        lower: i64,
        upper: i64,
    },
    Permutation(Vec<usize>),
    Composite(BTreeMap<String, Genotype>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenotypeKind {
    Boolean,
    Double,
    Integer,
    Permutation,
    Composite,
}

impl GenotypeKind {
    pub fn name(self) -> &'static str {
        match self {
            GenotypeKind::Boolean => "boolean",
            GenotypeKind::Double => "double",
            GenotypeKind::Integer => "integer",
            GenotypeKind::Permutation => "permutation",
            GenotypeKind::Composite => "composite",
        }
    }
}

impl Genotype {
    pub fn kind(&self) -> GenotypeKind {
        match self {
            Genotype::Boolean(_) => GenotypeKind::Boolean,
            Genotype::Double { .. } => GenotypeKind::Double,
            Genotype::Integer { .. } => GenotypeKind::Integer,
            Genotype::Permutation(_) => GenotypeKind::Permutation,
            Genotype::Composite(_) => GenotypeKind::Composite,
        }
    }

    /// Number of genes; for composites, the sum over all children.
    pub fn len(&self) -> usize {
        match self {
            Genotype::Boolean(v) => v.len(),
            Genotype::Double { values, .. } => values.len(),
            Genotype::Integer { values, .. } => values.len(),
            Genotype::Permutation(v) => v.len(),
            Genotype::Composite(children) => children.values().map(Genotype::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mismatch(&self, expected: GenotypeKind) -> Error {
        Error::Incompatible {
            expected: expected.name(),
            found: self.kind().name(),
        }
    }

    pub fn as_booleans(&self) -> Result<&[bool]> {
        match self {
            Genotype::Boolean(v) => Ok(v),
            _ => Err(self.mismatch(GenotypeKind::Boolean)),
        }
    }

    pub fn as_doubles(&self) -> Result<&[f64]> {
        match self {
            Genotype::Double { values, .. } => Ok(values),
            _ => Err(self.mismatch(GenotypeKind::Double)),
        }
    }

    pub fn as_integers(&self) -> Result<&[i64]> {
        match self {
            Genotype::Integer { values, .. } => Ok(values),
            _ => Err(self.mismatch(GenotypeKind::Integer)),
        }
    }

    pub fn as_permutation(&self) -> Result<&[usize]> {
        match self {
            Genotype::Permutation(v) => Ok(v),
            _ => Err(self.mismatch(GenotypeKind::Permutation)),
        }
    }

    pub fn child(&self, name: &str) -> Result<&Genotype> {
        match self {
            Genotype::Composite(children) => children
                .get(name)
                .ok_or_else(|| Error::NotFound(format!("genotype child {name}"))),
            _ => Err(self.mismatch(GenotypeKind::Composite)),
        }
    }
}

pub type Mutation = fn(&mut Genotype, &mut dyn RngCore, f64) -> Result<()>;
pub type Crossover = fn(&Genotype, &Genotype, &mut dyn RngCore) -> Result<Genotype>;

/// Variation operators keyed by genotype kind.
#[derive(Default, Clone)]
pub struct OperatorTable {
    mutations: BTreeMap<GenotypeKind, Mutation>,
    crossovers: BTreeMap<GenotypeKind, Crossover>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with bit-flip, bounded uniform and swap mutations and
    /// single-point/order crossovers for every leaf kind.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register_mutation(GenotypeKind::Boolean, flip_bits);
        table.register_mutation(GenotypeKind::Double, perturb_doubles);
        table.register_mutation(GenotypeKind::Integer, reset_integers);
        table.register_mutation(GenotypeKind::Permutation, swap_positions);
        table.register_crossover(GenotypeKind::Boolean, single_point);
        table.register_crossover(GenotypeKind::Double, single_point);
        table.register_crossover(GenotypeKind::Integer, single_point);
        table.register_crossover(GenotypeKind::Permutation, order_crossover);
        table
    }

    pub fn register_mutation(&mut self, kind: GenotypeKind, mutation: Mutation) {
        self.mutations.insert(kind, mutation);
    }

    pub fn register_crossover(&mut self, kind: GenotypeKind, crossover: Crossover) {
        self.crossovers.insert(kind, crossover);
    }

    pub fn supports(&self, kind: GenotypeKind) -> bool {
        kind == GenotypeKind::Composite
            || (self.mutations.contains_key(&kind) && self.crossovers.contains_key(&kind))
    }

    /// Mutates each gene with probability `rate`.
    pub fn mutate(&self, genotype: &mut Genotype, rng: &mut dyn RngCore, rate: f64) -> Result<()> {
        if let Genotype::Composite(children) = genotype {
            for child in children.values_mut() {
                self.mutate(child, rng, rate)?;
            }
            return Ok(());
        }
        let mutation = self
            .mutations
            .get(&genotype.kind())
            .ok_or(Error::Incompatible {
                expected: "a kind with a registered mutation",
                found: genotype.kind().name(),
            })?;
        mutation(genotype, rng, rate)
    }

    pub fn crossover(
        &self,
        a: &Genotype,
        b: &Genotype,
        rng: &mut dyn RngCore,
    ) -> Result<Genotype> {
        if a.kind() != b.kind() {
            return Err(b.mismatch(a.kind()));
        }
        if let (Genotype::Composite(left), Genotype::Composite(right)) = (a, b) {
            let mut children = BTreeMap::new();
            for (name, child) in left {
                let other = right
                    .get(name)
                    .ok_or_else(|| Error::NotFound(format!("genotype child {name}")))?;
                children.insert(name.clone(), self.crossover(child, other, rng)?);
            }
            return Ok(Genotype::Composite(children));
        }
        let crossover = self.crossovers.get(&a.kind()).ok_or(Error::Incompatible {
            expected: "a kind with a registered crossover",
            found: a.kind().name(),
        })?;
        crossover(a, b, rng)
    }
}

fn flip_bits(genotype: &mut Genotype, rng: &mut dyn RngCore, rate: f64) -> Result<()> {
    let found = genotype.kind().name();
    let Genotype::Boolean(bits) = genotype else {
        return Err(Error::Incompatible {
            expected: "boolean",
            found,
        });
    };
    for bit in bits.iter_mut() {
        if rng.random::<f64>() < rate {
            *bit = !*bit;
        }
    }
    Ok(())
}

fn perturb_doubles(genotype: &mut Genotype, rng: &mut dyn RngCore, rate: f64) -> Result<()> {
    let found = genotype.kind().name();
    let Genotype::Double {
        values,
        lower,
        upper,
    } = genotype
    else {
        return Err(Error::Incompatible {
            expected: "double",
            found,
        });
    };
    let span = *upper - *lower;
    for v in values.iter_mut() {
        if rng.random::<f64>() < rate {
            let step = (rng.random::<f64>() - 0.5) * 0.2 * span;
            *v = (*v + step).clamp(*lower, *upper);
        }
    }
    Ok(())
}

fn reset_integers(genotype: &mut Genotype, rng: &mut dyn RngCore, rate: f64) -> Result<()> {
    let found = genotype.kind().name();
    let Genotype::Integer {
        values,
        lower,
        upper,
    } = genotype
    else {
        return Err(Error::Incompatible {
            expected: "integer",
            found,
        });
    };
    for v in values.iter_mut() {
        if rng.random::<f64>() < rate {
            *v = rng.random_range(*lower..=*upper);
        }
    }
    Ok(())
}

fn swap_positions(genotype: &mut Genotype, rng: &mut dyn RngCore, rate: f64) -> Result<()> {
    let found = genotype.kind().name();
    let Genotype::Permutation(order) = genotype else {
        return Err(Error::Incompatible {
            expected: "permutation",
            found,
        });
    };
    let n = order.len();
    if n < 2 {
        return Ok(());
    }
    for i in 0..n {
        if rng.random::<f64>() < rate {
            let j = rng.random_range(0..n);
            order.swap(i, j);
        }
    }
    Ok(())
}

fn cut<T: Clone>(a: &[T], b: &[T], rng: &mut dyn RngCore) -> Vec<T> {
    let n = a.len().min(b.len());
    if n == 0 {
        return a.to_vec();
    }
    let point = rng.random_range(0..n);
    let mut child = a[..point].to_vec();
    child.extend_from_slice(&b[point..]);
    child
}

fn single_point(a: &Genotype, b: &Genotype, rng: &mut dyn RngCore) -> Result<Genotype> {
    Ok(match (a, b) {
        (Genotype::Boolean(x), Genotype::Boolean(y)) => Genotype::Boolean(cut(x, y, rng)),
        (
            Genotype::Double {
                values: x,
                lower,
                upper,
            },
            Genotype::Double { values: y, .. },
        ) => Genotype::Double {
            values: cut(x, y, rng),
            lower: *lower,
            upper: *upper,
        },
        (
            Genotype::Integer {
                values: x,
                lower,
                upper,
            },
            Genotype::Integer { values: y, .. },
        ) => Genotype::Integer {
            values: cut(x, y, rng),
            lower: *lower,
            upper: *upper,
        },
        _ => return Err(b.mismatch(a.kind())),
    })
}

/// Keeps a prefix of `a` and appends the remaining elements in `b`'s order.
fn order_crossover(a: &Genotype, b: &Genotype, rng: &mut dyn RngCore) -> Result<Genotype> {
    let x = a.as_permutation()?;
    let y = b.as_permutation()?;
    if x.is_empty() {
        return Ok(a.clone());
    }
    let point = rng.random_range(0..x.len());
    let mut child = x[..point].to_vec();
    child.extend(y.iter().filter(|g| !x[..point].contains(g)));
    Ok(Genotype::Permutation(child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::SeedableRng;
    use rand_pcg::Pcg64;

    fn doubles(values: Vec<f64>) -> Genotype {
        Genotype::Double {
            values,
            lower: 0.0,
            upper: 1.0,
        }
    }

    #[test]
    fn test_typed_access_reports_incompatibility() {
        let g = Genotype::Boolean(vec![true]);
        assert_eq!(
            g.as_doubles(),
            Err(Error::Incompatible {
                expected: "double",
                found: "boolean"
            })
        );
        assert_eq!(g.as_booleans().unwrap(), &[true]);
    }

    #[test]
    fn test_double_mutation_stays_in_bounds() {
        let table = OperatorTable::standard();
        let mut rng = Pcg64::seed_from_u64(3);
        let mut g = doubles(vec![0.0, 0.5, 1.0]);
        for _ in 0..100 {
            table.mutate(&mut g, &mut rng, 1.0).unwrap();
        }
        assert!(g.as_doubles().unwrap().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_permutation_operators_preserve_elements() {
        let table = OperatorTable::standard();
        let mut rng = Pcg64::seed_from_u64(11);
        let a = Genotype::Permutation(vec![0, 1, 2, 3, 4, 5]);
        let b = Genotype::Permutation(vec![5, 4, 3, 2, 1, 0]);
        let mut child = table.crossover(&a, &b, &mut rng).unwrap();
        table.mutate(&mut child, &mut rng, 0.5).unwrap();
        let mut sorted = child.as_permutation().unwrap().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_composite_recurses_into_children() {
        let table = OperatorTable::standard();
        let mut rng = Pcg64::seed_from_u64(5);
        let mut g = Genotype::Composite(BTreeMap::from([
            ("bits".to_string(), Genotype::Boolean(vec![false; 8])),
            ("reals".to_string(), doubles(vec![0.5; 4])),
        ]));
        assert_eq!(g.len(), 12);
        table.mutate(&mut g, &mut rng, 1.0).unwrap();
        assert_eq!(g.child("bits").unwrap().as_booleans().unwrap(), &[true; 8]);
        let other = g.clone();
        let child = table.crossover(&g, &other, &mut rng).unwrap();
        assert_eq!(child, g);
    }

    #[test]
    fn test_missing_operator_is_incompatible() {
        let table = OperatorTable::new();
        let mut rng = Pcg64::seed_from_u64(1);
        let mut g = Genotype::Boolean(vec![true]);
        assert!(matches!(
            table.mutate(&mut g, &mut rng, 1.0),
            Err(Error::Incompatible { .. })
        ));
        assert!(!table.supports(GenotypeKind::Boolean));
        assert!(OperatorTable::standard().supports(GenotypeKind::Permutation));
    }

    #[test]
    fn test_crossover_kind_mismatch() {
        let table = OperatorTable::standard();
        let mut rng = Pcg64::seed_from_u64(1);
        let err = table
            .crossover(&Genotype::Boolean(vec![true]), &doubles(vec![0.1]), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            Error::Incompatible {
                expected: "boolean",
                found: "double"
            }
        );
    }

    #[test]
    fn test_bincode_roundtrip() {
        let g = Genotype::Composite(BTreeMap::from([(
            "order".to_string(),
            Genotype::Permutation(vec![2, 0, 1]),
        )]));
        let bytes = bincode::serialize(&g).unwrap();
        let back: Genotype = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, g);
    }
}
