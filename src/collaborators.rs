//! External collaborators of the attribution core
//!
//! Trace processing, milestone metrics and the blocking-time metric are
//! computed elsewhere. The core reaches them through these traits and passes
//! the [`MetricComputationInput`] through unchanged.

use crate::blocking_time::BlockingTimeResult;
use crate::milestones::{GatherMode, MilestoneTiming};
use crate::task_tree::TaskTree;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Identity and extent of the recorded trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceHandle {
    pub id: String,
    pub end_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherContext {
    pub gather_mode: GatherMode,
}

/// How CPU and network throttling was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottlingMethod {
    /// Predict throttled timings with the simulator
    #[default]
    Simulate,
    /// Throttling applied by the browser during the recording
    Devtools,
    /// No throttling
    Provided,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSettings {
    #[serde(default)]
    pub throttling_method: ThrottlingMethod,
}

/// Simulator tuning passed through to the metric collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorOptions {
    pub rtt_ms: f64,
    pub throughput_kbps: f64,
    pub cpu_slowdown_multiplier: f64,
}

/// Everything a metric computation is keyed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComputationInput {
    pub trace: TraceHandle,
    #[serde(default)]
    pub devtools_log: Option<String>,
    pub url: String,
    pub gather_context: GatherContext,
    #[serde(default)]
    pub settings: MetricSettings,
    #[serde(default)]
    pub simulator: Option<SimulatorOptions>,
}

/// Supplies the main-thread task tree of a trace
pub trait TaskTreeProvider: Sync {
    fn main_thread_tasks(&self, trace: &TraceHandle) -> Result<TaskTree>;
}

/// Supplies first-contentful-paint and interactive milestones
pub trait MilestoneProvider: Sync {
    fn first_contentful_paint(&self, input: &MetricComputationInput) -> Result<MilestoneTiming>;

    fn interactive(&self, input: &MetricComputationInput) -> Result<MilestoneTiming>;
}

/// Supplies the total-blocking-time metric
pub trait BlockingTimeProvider: Sync {
    fn total_blocking_time(&self, input: &MetricComputationInput) -> Result<BlockingTimeResult>;
}
