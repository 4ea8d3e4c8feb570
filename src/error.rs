use crate::individual::State;

/// Errors raised by the individual lifecycle, completers and archives.
///
/// `Termination` and `Stop` are cooperative control signals rather than
/// failures; see [`Error::is_control_signal`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("cannot {action}, current state: {state}")]
    IllegalState { action: &'static str, state: State },
    #[error("completer has been shut down")]
    ShutDown,
    #[error("invalid argument: {0}")]
    IllegalArgument(String),
    #[error("archive capacity of {capacity} exceeded")]
    OutOfBounds { capacity: usize },
    #[error("objective {0} not found")]
    NotFound(String),
    #[error("incompatible genotype: expected {expected}, found {found}")]
    Incompatible {
        expected: &'static str,
        found: &'static str,
    },
    #[error("optimization terminated")]
    Termination,
    #[error("optimization stopped")]
    Stop,
    #[error("unexpected error in worker: {0}")]
    Unexpected(String),
}

impl Error {
    /// Returns true for the cooperative `Termination`/`Stop` signals.
    pub fn is_control_signal(&self) -> bool {
        matches!(self, Error::Termination | Error::Stop)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
