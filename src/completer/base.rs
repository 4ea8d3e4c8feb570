use crate::control::Control;
use crate::error::Result;
use crate::individual::{IndividualRef, State};
use crate::objective::{Objective, Objectives};
use crate::population::Population;
use crate::{Decoder, Evaluator};
use std::sync::OnceLock;

/// Drives individuals through decoding and evaluation.
///
/// Individuals that are already `EVALUATED` are skipped, so completing the
/// same individual twice is a no-op.
pub trait IndividualCompleter<G, P>: Send + Sync {
    fn complete(&self, individuals: &[IndividualRef<G, P>]) -> Result<()>;

    fn complete_population(&self, population: &Population<G, P>) -> Result<()> {
        self.complete(&population.to_vec())
    }

    /// Releases worker resources. Idempotent.
    fn shutdown(&self) {}
}

/// Remembers the objective set of the first evaluation and checks every
/// later evaluation against it.
#[derive(Debug, Default)]
pub struct ObjectiveKeys {
    first: OnceLock<Vec<Objective>>,
}

impl ObjectiveKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key set recorded by the first evaluation, if any happened yet.
    pub fn keys(&self) -> Option<&[Objective]> {
        self.first.get().map(Vec::as_slice)
    }

    /// # Panics
    ///
    /// Panics if `objectives` does not carry exactly the first-seen objectives.
    pub fn verify(&self, objectives: &Objectives) {
        let first = self
            .first
            .get_or_init(|| objectives.keys().cloned().collect());
        let matches = first.len() == objectives.len()
            && first.iter().all(|o| objectives.get(o).is_ok());
        assert!(
            matches,
            "evaluator returned objectives {} but the first evaluation produced {:?}",
            objectives,
            first.iter().map(Objective::name).collect::<Vec<_>>()
        );
    }
}

/// Evaluator decorator that runs every result through [`ObjectiveKeys::verify`].
pub struct CheckedEvaluator<'a, E: ?Sized> {
    inner: &'a E,
    keys: &'a ObjectiveKeys,
}

impl<'a, E: ?Sized> CheckedEvaluator<'a, E> {
    pub fn new(inner: &'a E, keys: &'a ObjectiveKeys) -> Self {
        Self { inner, keys }
    }
}

impl<P, E> Evaluator<P> for CheckedEvaluator<'_, E>
where
    E: Evaluator<P> + ?Sized,
{
    fn evaluate(&self, phenotype: &P) -> Objectives {
        let objectives = self.inner.evaluate(phenotype);
        self.keys.verify(&objectives);
        objectives
    }
}

/// Completes one individual, polling `control` before decoding, before
/// evaluating and after evaluating.
pub(crate) fn complete_one<G, D, E>(
    individual: &IndividualRef<G, D::Phenotype>,
    decoder: &D,
    evaluator: &E,
    control: &Control,
) -> Result<()>
where
    D: Decoder<G> + ?Sized,
    E: Evaluator<D::Phenotype> + ?Sized,
{
    if individual.state() == State::Genotyped {
        control.checkpoint()?;
        individual.decode(decoder)?;
    }
    match individual.state() {
        State::Evaluated => Ok(()),
        _ => {
            control.checkpoint()?;
            individual.evaluate(evaluator)?;
            control.checkpoint()
        }
    }
}
