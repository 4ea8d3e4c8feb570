use super::base::{CheckedEvaluator, IndividualCompleter, ObjectiveKeys, complete_one};
use crate::control::Control;
use crate::error::Result;
use crate::individual::IndividualRef;
use crate::{Decoder, Evaluator};
use std::sync::Arc;

/// Completes individuals one after another on the calling thread, in the
/// order they are given.
pub struct SequentialCompleter<D, E> {
    decoder: D,
    evaluator: E,
    control: Arc<Control>,
    keys: ObjectiveKeys,
}

impl<D, E> SequentialCompleter<D, E> {
    pub fn new(decoder: D, evaluator: E, control: Arc<Control>) -> Self {
        Self {
            decoder,
            evaluator,
            control,
            keys: ObjectiveKeys::new(),
        }
    }

    pub fn objective_keys(&self) -> &ObjectiveKeys {
        &self.keys
    }
}

impl<G, D, E> IndividualCompleter<G, D::Phenotype> for SequentialCompleter<D, E>
where
    G: Send + Sync,
    D: Decoder<G>,
    E: Evaluator<D::Phenotype>,
{
    fn complete(&self, individuals: &[IndividualRef<G, D::Phenotype>]) -> Result<()> {
        let evaluator = CheckedEvaluator::new(&self.evaluator, &self.keys);
        for individual in individuals.iter().filter(|i| !i.is_evaluated()) {
            complete_one(individual, &self.decoder, &evaluator, &self.control)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::individual::{Individual, State};
    use crate::objective::{Objective, Objectives};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Square;
    impl Decoder<i64> for Square {
        type Phenotype = i64;
        fn decode(&self, genotype: &i64) -> i64 {
            genotype * genotype
        }
    }

    #[derive(Default)]
    struct CountingEval(AtomicUsize);
    impl Evaluator<i64> for CountingEval {
        fn evaluate(&self, phenotype: &i64) -> Objectives {
            self.0.fetch_add(1, Ordering::SeqCst);
            Objectives::new().with(Objective::minimize("sq"), *phenotype)
        }
    }

    fn genotyped(value: i64) -> IndividualRef<i64, i64> {
        let individual = Arc::new(Individual::new());
        individual.set_genotype(value).unwrap();
        individual
    }

    #[test]
    fn test_complete_is_idempotent() {
        let completer =
            SequentialCompleter::new(Square, CountingEval::default(), Arc::new(Control::new()));
        let batch = vec![genotyped(2), genotyped(3)];
        completer.complete(&batch).unwrap();
        completer.complete(&batch).unwrap();
        assert_eq!(completer.evaluator.0.load(Ordering::SeqCst), 2);
        let o = Objective::minimize("sq");
        assert_eq!(
            batch[1].objectives().unwrap().get(&o).unwrap().as_f64(),
            Some(9.0)
        );
    }

    #[test]
    fn test_resumes_partially_decoded_individual() {
        let completer =
            SequentialCompleter::new(Square, CountingEval::default(), Arc::new(Control::new()));
        let individual = genotyped(4);
        individual.decode(&Square).unwrap();
        completer.complete(&[individual.clone()]).unwrap();
        assert_eq!(individual.state(), State::Evaluated);
    }

    #[test]
    fn test_terminated_control_stops_before_decoding() {
        let control = Arc::new(Control::new());
        control.terminate();
        let completer = SequentialCompleter::new(Square, CountingEval::default(), control);
        let individual = genotyped(1);
        assert_eq!(
            completer.complete(&[individual.clone()]),
            Err(Error::Termination)
        );
        assert_eq!(individual.state(), State::Genotyped);
    }

    #[test]
    fn test_empty_individual_is_illegal_state() {
        let completer =
            SequentialCompleter::new(Square, CountingEval::default(), Arc::new(Control::new()));
        let empty: IndividualRef<i64, i64> = Arc::new(Individual::new());
        assert!(matches!(
            completer.complete(&[empty]),
            Err(Error::IllegalState {
                state: State::Empty,
                ..
            })
        ));
    }

    #[test]
    #[should_panic(expected = "evaluator returned objectives")]
    fn test_changing_objective_set_is_fatal() {
        struct Shifty(AtomicUsize);
        impl Evaluator<i64> for Shifty {
            fn evaluate(&self, phenotype: &i64) -> Objectives {
                let name = match self.0.fetch_add(1, Ordering::SeqCst) {
                    0 => "first",
                    _ => "second",
                };
                Objectives::new().with(Objective::minimize(name), *phenotype)
            }
        }
        let completer = SequentialCompleter::new(
            Square,
            Shifty(AtomicUsize::new(0)),
            Arc::new(Control::new()),
        );
        let _ = completer.complete(&[genotyped(1), genotyped(2)]);
    }
}
