//! Time intervals used by blocking-time attribution (milliseconds)

use crate::blocking_time::NodeTiming;
use crate::task_tree::TaskNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interval over which blocking time is measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingWindow {
    pub start_time_ms: f64,
    pub end_time_ms: f64,
}

impl TimingWindow {
    /// Create a window, or `None` if `start_time_ms > end_time_ms`
    pub fn new(start_time_ms: f64, end_time_ms: f64) -> Option<Self> {
        if start_time_ms <= end_time_ms {
            Some(Self {
                start_time_ms,
                end_time_ms,
            })
        } else {
            None
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.end_time_ms - self.start_time_ms
    }

    /// Whether `[start, end]` shares any instant with the window
    pub fn intersects(&self, start: f64, end: f64) -> bool {
        end >= self.start_time_ms && start <= self.end_time_ms
    }
}

impl fmt::Display for TimingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}ms, {:.1}ms]", self.start_time_ms, self.end_time_ms)
    }
}

/// `{start, end, duration}` triple fed to the impact primitive
///
/// Built from an observed task, from a simulated node timing, or by
/// interpolating a descendant into its top-level task's simulated span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// Predicted timing for a task
pub type SimulatedEvent = ImpactEvent;

impl ImpactEvent {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            duration: end - start,
        }
    }

    pub fn from_task(task: &TaskNode) -> Self {
        Self {
            start: task.start_time,
            end: task.end_time,
            duration: task.duration,
        }
    }

    pub fn from_node_timing(timing: &NodeTiming) -> Self {
        Self {
            start: timing.start_time,
            end: timing.end_time,
            duration: timing.duration,
        }
    }
}
