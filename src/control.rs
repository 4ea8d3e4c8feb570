//! Cooperative run control shared between an optimizer loop and its completers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlState {
    Running,
    Paused,
    Stopped,
    Terminated,
}

/// Pause/stop/terminate switch polled at checkpoints.
///
/// [`Control::checkpoint`] blocks while paused and fails with
/// [`Error::Termination`] once terminated. A stop request is only observed
/// by [`Control::checkpoint_stop`], letting the current iteration finish.
#[derive(Debug)]
pub struct Control {
    state: Mutex<ControlState>,
    resumed: Condvar,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            state: Mutex::new(ControlState::Running),
            resumed: Condvar::new(),
        }
    }
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ControlState {
        *self.lock()
    }

    pub fn pause(&self) {
        self.transition(ControlState::Paused);
    }

    pub fn resume(&self) {
        self.transition(ControlState::Running);
    }

    pub fn stop(&self) {
        self.transition(ControlState::Stopped);
    }

    pub fn terminate(&self) {
        self.transition(ControlState::Terminated);
    }

    /// Blocks while paused; fails once terminated.
    pub fn checkpoint(&self) -> Result<()> {
        match self.wait_while_paused() {
            ControlState::Terminated => Err(Error::Termination),
            _ => Ok(()),
        }
    }

    /// Like [`Control::checkpoint`], but also fails with [`Error::Stop`] after a stop request.
    pub fn checkpoint_stop(&self) -> Result<()> {
        match self.wait_while_paused() {
            ControlState::Terminated => Err(Error::Termination),
            ControlState::Stopped => Err(Error::Stop),
            _ => Ok(()),
        }
    }

    fn wait_while_paused(&self) -> ControlState {
        let guard = self.lock();
        let guard = self
            .resumed
            .wait_while(guard, |state| *state == ControlState::Paused)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    fn transition(&self, next: ControlState) {
        let mut state = self.lock();
        // Termination is final.
        if *state == ControlState::Terminated || *state == next {
            return;
        }
        log::info!("control {:?} -> {:?}", *state, next);
        *state = next;
        self.resumed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Observer of optimization run boundaries.
pub trait OptimizerStateListener: Send + Sync {
    fn optimization_started(&self) {}
    fn optimization_stopped(&self);
}

/// Fans run start/stop notifications out to registered listeners.
#[derive(Default)]
pub struct Lifecycle {
    listeners: Mutex<Vec<Arc<dyn OptimizerStateListener>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn OptimizerStateListener>) {
        self.lock().push(listener);
    }

    pub fn started(&self) {
        let listeners = self.lock().clone();
        for listener in listeners {
            listener.optimization_started();
        }
    }

    pub fn stopped(&self) {
        let listeners = self.lock().clone();
        for listener in listeners {
            listener.optimization_stopped();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn OptimizerStateListener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
