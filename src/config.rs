//! Plain-data configuration for archives and completers.

use crate::archive::adaptive_grid::{AdaptiveGridArchive, DEFAULT_DIVISIONS};
use crate::archive::crowding::CrowdingArchive;
use crate::archive::population::PopulationArchive;
use crate::archive::unbounded::UnboundedArchive;
use crate::archive::Archive;
use crate::completer::IndividualCompleter;
use crate::completer::sequential::SequentialCompleter;
use crate::control::Control;
use crate::error::{Error, Result};
use crate::{Decoder, Evaluator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_divisions() -> usize {
    DEFAULT_DIVISIONS
}

/// Which archive to keep and how large it may grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveConfig {
    Unbounded,
    Population,
    Crowding {
        capacity: usize,
    },
    AdaptiveGrid {
        capacity: usize,
        #[serde(default = "default_divisions")]
        divisions: usize,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig::Crowding { capacity: 100 }
    }
}

impl ArchiveConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ArchiveConfig::Crowding { capacity } | ArchiveConfig::AdaptiveGrid { capacity, .. }
                if capacity == 0 =>
            {
                Err(Error::IllegalArgument(
                    "archive capacity must be at least 1".into(),
                ))
            }
            ArchiveConfig::AdaptiveGrid { divisions: 0, .. } => Err(Error::IllegalArgument(
                "grid divisions must be at least 1".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn build<G, P>(&self) -> Result<Box<dyn Archive<G, P>>>
    where
        G: 'static,
        P: 'static,
    {
        self.validate()?;
        let archive: Box<dyn Archive<G, P>> = match *self {
            ArchiveConfig::Unbounded => Box::new(UnboundedArchive::new()),
            ArchiveConfig::Population => Box::new(PopulationArchive::new()),
            ArchiveConfig::Crowding { capacity } => Box::new(CrowdingArchive::new(capacity)?),
            ArchiveConfig::AdaptiveGrid {
                capacity,
                divisions,
                seed,
            } => Box::new(AdaptiveGridArchive::with_divisions(
                capacity, divisions, seed,
            )?),
        };
        Ok(archive)
    }
}

/// Worker count for individual completion. One thread means sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleterConfig {
    pub threads: usize,
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl CompleterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::IllegalArgument(
                "completer thread count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn build<G, D, E>(
        &self,
        decoder: D,
        evaluator: E,
        control: Arc<Control>,
    ) -> Result<Box<dyn IndividualCompleter<G, D::Phenotype>>>
    where
        G: Send + Sync + 'static,
        D: Decoder<G> + 'static,
        E: Evaluator<D::Phenotype> + 'static,
    {
        self.validate()?;
        if self.threads == 1 {
            return Ok(Box::new(SequentialCompleter::new(decoder, evaluator, control)));
        }
        #[cfg(feature = "parallel")]
        {
            Ok(Box::new(crate::completer::parallel::ParallelCompleter::new(
                decoder,
                evaluator,
                control,
                self.threads,
            )?))
        }
        #[cfg(not(feature = "parallel"))]
        {
            log::warn!(
                "{} completer threads requested without the parallel feature; completing sequentially",
                self.threads
            );
            Ok(Box::new(SequentialCompleter::new(decoder, evaluator, control)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(ArchiveConfig::default().validate().is_ok());
        assert!(ArchiveConfig::Crowding { capacity: 0 }.validate().is_err());
        assert!(
            ArchiveConfig::AdaptiveGrid {
                capacity: 10,
                divisions: 0,
                seed: 0
            }
            .validate()
            .is_err()
        );
        assert!(CompleterConfig { threads: 0 }.validate().is_err());
    }

    #[test]
    fn test_build_reports_capacity() {
        let archive = ArchiveConfig::AdaptiveGrid {
            capacity: 8,
            divisions: 7,
            seed: 1,
        }
        .build::<u8, u8>()
        .unwrap();
        assert_eq!(archive.capacity(), Some(8));
        let archive = ArchiveConfig::Unbounded.build::<u8, u8>().unwrap();
        assert_eq!(archive.capacity(), None);
    }

    #[test]
    fn test_bincode_roundtrip() {
        let config = ArchiveConfig::AdaptiveGrid {
            capacity: 50,
            divisions: 5,
            seed: 3,
        };
        let bytes = bincode::serialize(&config).unwrap();
        let back: ArchiveConfig = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, config);
    }
}
