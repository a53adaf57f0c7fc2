//! Page-load milestone results consumed by window resolution

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the trace was gathered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatherMode {
    /// A full page load; milestones apply
    Navigation,
    /// A user-defined span of time
    Timespan,
    /// A point-in-time capture
    Snapshot,
}

impl fmt::Display for GatherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatherMode::Navigation => "navigation",
            GatherMode::Timespan => "timespan",
            GatherMode::Snapshot => "snapshot",
        };
        f.write_str(name)
    }
}

/// A single estimate from the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub time_in_ms: f64,
}

/// Timing of a milestone such as first contentful paint or interactive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MilestoneTiming {
    /// Measured directly from the trace
    Observed { timing: f64 },
    /// Predicted by simulation, with optimistic and pessimistic bounds
    #[serde(rename_all = "camelCase")]
    Simulated {
        timing: f64,
        optimistic_estimate: Estimate,
        pessimistic_estimate: Estimate,
    },
}

impl MilestoneTiming {
    pub fn observed(timing: f64) -> Self {
        MilestoneTiming::Observed { timing }
    }

    pub fn simulated(timing: f64, optimistic: f64, pessimistic: f64) -> Self {
        MilestoneTiming::Simulated {
            timing,
            optimistic_estimate: Estimate {
                time_in_ms: optimistic,
            },
            pessimistic_estimate: Estimate {
                time_in_ms: pessimistic,
            },
        }
    }

    pub fn timing(&self) -> f64 {
        match self {
            MilestoneTiming::Observed { timing } | MilestoneTiming::Simulated { timing, .. } => {
                *timing
            }
        }
    }

    /// Earliest plausible time; the observed timing when not simulated
    pub fn optimistic_ms(&self) -> f64 {
        match self {
            MilestoneTiming::Observed { timing } => *timing,
            MilestoneTiming::Simulated {
                optimistic_estimate,
                ..
            } => optimistic_estimate.time_in_ms,
        }
    }

    /// Latest plausible time; the observed timing when not simulated
    pub fn pessimistic_ms(&self) -> f64 {
        match self {
            MilestoneTiming::Observed { timing } => *timing,
            MilestoneTiming::Simulated {
                pessimistic_estimate,
                ..
            } => pessimistic_estimate.time_in_ms,
        }
    }
}
