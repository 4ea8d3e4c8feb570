use super::base::{CheckedEvaluator, IndividualCompleter, ObjectiveKeys, complete_one};
use crate::control::{Control, OptimizerStateListener};
use crate::error::{Error, Result};
use crate::individual::IndividualRef;
use crate::{Decoder, Evaluator};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, PoisonError};

/// Completes individuals concurrently on a private, bounded rayon pool.
///
/// Each pending individual is one task; its own transitions stay ordered,
/// but no order holds between different individuals. The pool is released
/// on [`IndividualCompleter::shutdown`], on `optimization_stopped` and after
/// a termination signal; further `complete` calls then fail with
/// [`Error::ShutDown`].
pub struct ParallelCompleter<D, E> {
    decoder: D,
    evaluator: E,
    control: Arc<Control>,
    keys: ObjectiveKeys,
    threads: usize,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl<D, E> ParallelCompleter<D, E> {
    /// # Errors
    ///
    /// [`Error::IllegalArgument`] if `threads` is 0 or the pool cannot be built.
    pub fn new(decoder: D, evaluator: E, control: Arc<Control>, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::IllegalArgument(
                "completer thread count must be at least 1".into(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("completer-{i}"))
            .build()
            .map_err(|e| Error::IllegalArgument(format!("cannot build completer pool: {e}")))?;
        log::info!("completer pool started with {} threads", threads);
        Ok(Self {
            decoder,
            evaluator,
            control,
            keys: ObjectiveKeys::new(),
            threads,
            pool: Mutex::new(Some(Arc::new(pool))),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock_pool().is_none()
    }

    pub fn objective_keys(&self) -> &ObjectiveKeys {
        &self.keys
    }

    fn release(&self) {
        // In-flight tasks keep their clone of the pool; it is dropped with the last one.
        if self.lock_pool().take().is_some() {
            log::info!("completer pool shut down");
        }
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, Option<Arc<ThreadPool>>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Folds per-task results into one: a single `Termination` wins over
    /// everything, any other failure is reported as `Unexpected`.
    fn collapse(&self, results: Vec<Result<()>>) -> Result<()> {
        let mut terminated = false;
        let mut failure = None;
        for result in results {
            match result {
                Ok(()) => {}
                Err(Error::Termination) => terminated = true,
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if terminated {
            if let Some(e) = failure {
                log::warn!("discarding worker failure after termination: {}", e);
            }
            self.release();
            return Err(Error::Termination);
        }
        match failure {
            Some(e) => Err(Error::Unexpected(e.to_string())),
            None => Ok(()),
        }
    }
}

impl<G, D, E> IndividualCompleter<G, D::Phenotype> for ParallelCompleter<D, E>
where
    G: Send + Sync,
    D: Decoder<G>,
    E: Evaluator<D::Phenotype>,
{
    fn complete(&self, individuals: &[IndividualRef<G, D::Phenotype>]) -> Result<()> {
        let pending: Vec<&IndividualRef<G, D::Phenotype>> =
            individuals.iter().filter(|i| !i.is_evaluated()).collect();
        if pending.is_empty() {
            return Ok(());
        }
        let pool = self.lock_pool().clone().ok_or(Error::ShutDown)?;
        log::debug!("completing {} individuals in parallel", pending.len());

        let evaluator = CheckedEvaluator::new(&self.evaluator, &self.keys);
        let results: Vec<Result<()>> = pool.install(|| {
            pending
                .par_iter()
                .map(|individual| complete_one(individual, &self.decoder, &evaluator, &self.control))
                .collect()
        });
        self.collapse(results)
    }

    fn shutdown(&self) {
        self.release();
    }
}

impl<D, E> OptimizerStateListener for ParallelCompleter<D, E>
where
    D: Send + Sync,
    E: Send + Sync,
{
    fn optimization_stopped(&self) {
        self.release();
    }
}
