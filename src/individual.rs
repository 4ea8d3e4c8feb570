//! The [`Individual`] state machine.
//!
//! An individual moves strictly forward through
//! `EMPTY -> GENOTYPED -> DECODING -> PHENOTYPED -> EVALUATING -> EVALUATED`.
//! Genotype, phenotype and objectives are each written exactly once, so the
//! accessors hand out plain references without holding a lock. Identity is
//! the process-unique [`IndividualId`]: two individuals with equal genotypes
//! are still distinct archive members.

use crate::error::{Error, Result};
use crate::objective::Objectives;
use crate::{Creator, Decoder, Evaluator};
use rand::prelude::SeedableRng;
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Lifecycle stage of an [`Individual`], in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    Empty,
    Genotyped,
    Decoding,
    Phenotyped,
    Evaluating,
    Evaluated,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Empty => "EMPTY",
            State::Genotyped => "GENOTYPED",
            State::Decoding => "DECODING",
            State::Phenotyped => "PHENOTYPED",
            State::Evaluating => "EVALUATING",
            State::Evaluated => "EVALUATED",
        })
    }
}

/// Process-unique identity of an individual. Ids grow with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(u64);

impl IndividualId {
    fn next() -> Self {
        IndividualId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observer of individual state transitions (loggers, adaptive operators).
pub trait IndividualStateListener<G, P>: Send + Sync {
    fn in_state_changed(&self, individual: &Individual<G, P>, state: State);
}

/// Observer list shared by every individual of one factory.
///
/// Registration and delivery may happen concurrently: delivery works on a
/// snapshot taken under the lock, and listeners run with the lock released.
pub struct StateListeners<G, P> {
    listeners: Mutex<Vec<Arc<dyn IndividualStateListener<G, P>>>>,
}

impl<G, P> Default for StateListeners<G, P> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<G, P> StateListeners<G, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn IndividualStateListener<G, P>>) {
        self.lock().push(listener);
    }

    /// Removes a listener by pointer identity. Returns false if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn IndividualStateListener<G, P>>) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn notify(&self, individual: &Individual<G, P>, state: State) {
        let snapshot = self.lock().clone();
        for listener in snapshot {
            listener.in_state_changed(individual, state);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn IndividualStateListener<G, P>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One candidate solution and the data derived from it.
pub struct Individual<G, P> {
    id: IndividualId,
    state: Mutex<State>,
    genotype: OnceLock<G>,
    phenotype: OnceLock<P>,
    objectives: OnceLock<Objectives>,
    listeners: Arc<StateListeners<G, P>>,
}

/// Shared handle under which populations, archives and completers hold individuals.
pub type IndividualRef<G, P> = Arc<Individual<G, P>>;

impl<G, P> Individual<G, P> {
    /// Creates an `EMPTY` individual with no listeners attached.
    pub fn new() -> Self {
        Self::with_listeners(Arc::new(StateListeners::new()))
    }

    pub fn with_listeners(listeners: Arc<StateListeners<G, P>>) -> Self {
        Self {
            id: IndividualId::next(),
            state: Mutex::new(State::Empty),
            genotype: OnceLock::new(),
            phenotype: OnceLock::new(),
            objectives: OnceLock::new(),
            listeners,
        }
    }

    /// A `GENOTYPED` individual. The caller fires the transition once the
    /// individual is shared.
    fn genotyped(listeners: Arc<StateListeners<G, P>>, genotype: G) -> Self {
        Self {
            id: IndividualId::next(),
            state: Mutex::new(State::Genotyped),
            genotype: OnceLock::from(genotype),
            phenotype: OnceLock::new(),
            objectives: OnceLock::new(),
            listeners,
        }
    }

    pub fn id(&self) -> IndividualId {
        self.id
    }

    pub fn state(&self) -> State {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_evaluated(&self) -> bool {
        self.state() == State::Evaluated
    }

    pub fn genotype(&self) -> Option<&G> {
        self.genotype.get()
    }

    pub fn phenotype(&self) -> Option<&P> {
        self.phenotype.get()
    }

    pub fn objectives(&self) -> Option<&Objectives> {
        self.objectives.get()
    }

    /// Objectives of an individual that must already be evaluated.
    ///
    /// # Panics
    ///
    /// Panics if the individual has not reached `EVALUATED`.
    pub(crate) fn evaluated_objectives(&self) -> &Objectives {
        match self.objectives.get() {
            Some(objectives) => objectives,
            None => panic!(
                "individual {} used as evaluated, current state: {}",
                self.id,
                self.state()
            ),
        }
    }

    /// Assigns the genotype. Legal only while `EMPTY`.
    pub fn set_genotype(&self, genotype: G) -> Result<()> {
        {
            let mut state = self.lock_state();
            if *state != State::Empty || self.genotype.set(genotype).is_err() {
                return Err(Error::IllegalState {
                    action: "set genotype",
                    state: *state,
                });
            }
            *state = State::Genotyped;
        }
        self.fire(State::Genotyped);
        Ok(())
    }

    /// Runs `decoder` on the genotype. Legal only while `GENOTYPED`.
    pub fn decode<D>(&self, decoder: &D) -> Result<()>
    where
        D: Decoder<G, Phenotype = P> + ?Sized,
    {
        self.advance(State::Genotyped, State::Decoding, "decode")?;
        let genotype = self
            .genotype
            .get()
            .ok_or(Error::IllegalState {
                action: "decode",
                state: State::Decoding,
            })?;
        let phenotype = decoder.decode(genotype);
        if self.phenotype.set(phenotype).is_err() {
            return Err(Error::IllegalState {
                action: "set phenotype",
                state: self.state(),
            });
        }
        self.advance(State::Decoding, State::Phenotyped, "set phenotype")
    }

    /// Runs `evaluator` on the phenotype. Legal only while `PHENOTYPED`.
    pub fn evaluate<E>(&self, evaluator: &E) -> Result<()>
    where
        E: Evaluator<P> + ?Sized,
    {
        self.advance(State::Phenotyped, State::Evaluating, "evaluate")?;
        let phenotype = self
            .phenotype
            .get()
            .ok_or(Error::IllegalState {
                action: "evaluate",
                state: State::Evaluating,
            })?;
        let objectives = evaluator.evaluate(phenotype);
        if self.objectives.set(objectives).is_err() {
            return Err(Error::IllegalState {
                action: "set objectives",
                state: self.state(),
            });
        }
        self.advance(State::Evaluating, State::Evaluated, "set objectives")
    }

    fn advance(&self, from: State, to: State, action: &'static str) -> Result<()> {
        {
            let mut state = self.lock_state();
            if *state != from {
                return Err(Error::IllegalState {
                    action,
                    state: *state,
                });
            }
            *state = to;
        }
        self.fire(to);
        Ok(())
    }

    fn fire(&self, state: State) {
        log::trace!("individual {} -> {}", self.id, state);
        self.listeners.notify(self, state);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G, P> Default for Individual<G, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, P> PartialEq for Individual<G, P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<G, P> Eq for Individual<G, P> {}

impl<G, P> Hash for Individual<G, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<G, P> fmt::Debug for Individual<G, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Individual")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("objectives", &self.objectives.get())
            .finish()
    }
}

/// Creates individuals from a [`Creator`] and attaches the shared listener list.
///
/// Genotype creation is driven by a seeded [`Pcg64`], so a factory built with
/// the same seed hands out the same genotypes in the same order.
pub struct IndividualFactory<C: Creator, P> {
    creator: C,
    listeners: Arc<StateListeners<C::Genotype, P>>,
    rng: Mutex<Pcg64>,
}

impl<C: Creator, P> IndividualFactory<C, P> {
    pub fn new(creator: C, seed: u64) -> Self {
        Self {
            creator,
            listeners: Arc::new(StateListeners::new()),
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
        }
    }

    pub fn creator(&self) -> &C {
        &self.creator
    }

    pub fn add_listener(&self, listener: Arc<dyn IndividualStateListener<C::Genotype, P>>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(
        &self,
        listener: &Arc<dyn IndividualStateListener<C::Genotype, P>>,
    ) -> bool {
        self.listeners.remove(listener)
    }

    /// A new `EMPTY` individual wired to this factory's listeners.
    pub fn create_empty(&self) -> IndividualRef<C::Genotype, P> {
        Arc::new(Individual::with_listeners(Arc::clone(&self.listeners)))
    }

    /// A new `GENOTYPED` individual.
    pub fn create(&self) -> IndividualRef<C::Genotype, P> {
        let seed = self.next_seed();
        self.create_seeded(seed)
    }

    /// Creates `n` `GENOTYPED` individuals.
    ///
    /// Per-individual seeds are drawn serially, so the resulting genotypes
    /// do not depend on how the parallel creation is scheduled.
    pub fn create_batch(&self, n: usize) -> Vec<IndividualRef<C::Genotype, P>> {
        let seeds: Vec<u64> = (0..n).map(|_| self.next_seed()).collect();

        #[cfg(feature = "parallel")]
        let genotypes: Vec<C::Genotype> = seeds
            .into_par_iter()
            .map(|seed| self.creator.create(&mut Pcg64::seed_from_u64(seed)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let genotypes: Vec<C::Genotype> = seeds
            .into_iter()
            .map(|seed| self.creator.create(&mut Pcg64::seed_from_u64(seed)))
            .collect();

        genotypes
            .into_iter()
            .map(|genotype| self.wrap(genotype))
            .collect()
    }

    fn create_seeded(&self, seed: u64) -> IndividualRef<C::Genotype, P> {
        let genotype = self.creator.create(&mut Pcg64::seed_from_u64(seed));
        self.wrap(genotype)
    }

    fn wrap(&self, genotype: C::Genotype) -> IndividualRef<C::Genotype, P> {
        let individual = Arc::new(Individual::genotyped(
            Arc::clone(&self.listeners),
            genotype,
        ));
        individual.fire(State::Genotyped);
        individual
    }

    fn next_seed(&self) -> u64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random::<u64>()
    }
}
