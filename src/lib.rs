use rand::Rng;

pub use crate::error::{Error, Result};
pub use crate::objective::{Objective, Objectives, Sign, Value};

/// Produces fresh genotypes. Called repeatedly, possibly from several
/// threads at once when a population is initialized in parallel.
pub trait Creator: Send + Sync {
    type Genotype: Send + Sync;

    fn create<R: Rng>(&self, rng: &mut R) -> Self::Genotype;
}

/// Turns a genotype into its problem-domain phenotype.
/// Invoked exactly once per individual, while it is `DECODING`.
pub trait Decoder<G>: Send + Sync {
    type Phenotype: Send + Sync;

    fn decode(&self, genotype: &G) -> Self::Phenotype;
}

/// Scores a phenotype. Every call for one problem must return the same set
/// of objectives; the completers enforce this with an assertion.
pub trait Evaluator<P>: Send + Sync {
    fn evaluate(&self, phenotype: &P) -> Objectives;
}

pub mod config;
pub mod control;
pub mod crowding;
pub mod error;
pub mod genotype;
pub mod individual;
pub mod objective;
pub mod population;

pub mod archive {
    mod base;
    pub use self::base::*;

    pub mod adaptive_grid;
    pub mod crowding;
    pub mod population;
    pub mod unbounded;
}

pub mod completer {
    mod base;
    pub use self::base::*;

    #[cfg(feature = "parallel")]
    pub mod parallel;
    pub mod sequential;
}
