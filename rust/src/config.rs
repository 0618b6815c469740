//! Configuration for schedule resolution.

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::logging::{VERBOSITY_DEBUG, VERBOSITY_SILENT};

/// Settings that affect how a resolution reports, not what it computes.
///
/// Scheduling parameters (daily caps, rest days, hour windows) are typed
/// values in [`crate::adjust`] rather than configuration.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Logging verbosity: 0 silent, 1 placements, 2 adjustments, 3 graph internals
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub verbosity: u8,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            verbosity: VERBOSITY_SILENT,
        }
    }
}

impl ResolveConfig {
    /// Same configuration with another verbosity, capped at the debug level.
    pub fn with_verbosity(self, verbosity: u8) -> Self {
        Self {
            verbosity: verbosity.min(VERBOSITY_DEBUG),
        }
    }
}
