//! Blocking-time impact attribution
//!
//! Explains total blocking time by attributing it to the individual tasks of
//! the main-thread task tree. Each task gets a total impact (including its
//! descendants) and a self impact (its own execution only).
//!
//! Two regimes are supported:
//!
//! - **Observed**: the blocking-time result came straight from the trace, so
//!   every task is measured on its recorded timing.
//! - **Simulated**: the blocking-time result came from a network/CPU
//!   simulation. Simulated top-level CPU nodes are measured directly and
//!   their descendants are projected into the simulated spans by linear
//!   interpolation.
//!
//! # Example
//!
//! ```
//! use tbt_impact::snapshot::TraceSnapshot;
//! use tbt_impact::attribution::TbtImpactTasks;
//!
//! # fn main() -> anyhow::Result<()> {
//! let snapshot = TraceSnapshot::from_json(r#"{
//!     "trace": {"id": "doc", "endTimeMs": 3000},
//!     "url": "https://example.com/",
//!     "gatherMode": "timespan",
//!     "totalBlockingTime": {"kind": "observed", "timing": 150},
//!     "tasks": [
//!         {"event": 1, "name": "RunTask", "startTime": 1000, "endTime": 1200}
//!     ]
//! }"#)?;
//!
//! let report = TbtImpactTasks::with_default_primitive(&snapshot, &snapshot, &snapshot)
//!     .compute(&snapshot.input())?;
//!
//! assert_eq!(report.tasks[0].tbt_impact, 150.0);
//! assert_eq!(report.tasks[0].self_tbt_impact, 150.0);
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod observed;
mod simulated;
mod window;

pub use aggregate::{
    aggregate, AttributionStrategy, TbtImpactReport, TbtImpactTask, UrlImpact, UNATTRIBUTED,
};
pub use observed::observed_impacts;
pub use simulated::{interpolate_simulated_event, simulated_impacts};
pub use window::{milestone_window, resolve_window, whole_trace_window};

use crate::blocking_time::BlockingTimeResult;
use crate::collaborators::{
    BlockingTimeProvider, MetricComputationInput, MilestoneProvider, TaskTreeProvider,
};
use crate::config::AttributionConfig;
use crate::impact::{BlockingTimeImpact, ImpactPrimitive};
use crate::parallel;
use crate::task_tree::TaskId;
use fnv::FnvHashMap;
use thiserror::Error;

/// Blocking-time impact per task, keyed by arena index
pub type ImpactMap = FnvHashMap<TaskId, f64>;

/// Errors for impact attribution
#[derive(Error, Debug)]
pub enum ImpactError {
    #[error("{collaborator} computation failed")]
    Collaborator {
        collaborator: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("analysis window starts after it ends ({start_time_ms}ms > {end_time_ms}ms)")]
    InvertedWindow {
        start_time_ms: f64,
        end_time_ms: f64,
    },
}

pub type Result<T> = std::result::Result<T, ImpactError>;

pub(crate) fn collaborator_error(
    collaborator: &'static str,
) -> impl FnOnce(anyhow::Error) -> ImpactError {
    move |source| ImpactError::Collaborator {
        collaborator,
        source,
    }
}

/// Attributes blocking time to main-thread tasks
///
/// Holds the collaborators and the impact primitive; [`compute`] runs one
/// attribution for a metric computation input.
///
/// Built with [`with_default_primitive`], impacts come from a
/// [`BlockingTimeImpact`] using the config's `blocking_threshold_ms`. A
/// primitive passed to [`new`] is used as-is and the threshold is ignored.
///
/// [`compute`]: TbtImpactTasks::compute
/// [`new`]: TbtImpactTasks::new
/// [`with_default_primitive`]: TbtImpactTasks::with_default_primitive
pub struct TbtImpactTasks<'a> {
    tasks: &'a dyn TaskTreeProvider,
    milestones: &'a dyn MilestoneProvider,
    blocking_time: &'a dyn BlockingTimeProvider,
    primitive: Option<&'a dyn ImpactPrimitive>,
    config: AttributionConfig,
}

impl<'a> TbtImpactTasks<'a> {
    pub fn new(
        tasks: &'a dyn TaskTreeProvider,
        milestones: &'a dyn MilestoneProvider,
        blocking_time: &'a dyn BlockingTimeProvider,
        primitive: &'a dyn ImpactPrimitive,
    ) -> Self {
        Self {
            tasks,
            milestones,
            blocking_time,
            primitive: Some(primitive),
            config: AttributionConfig::default(),
        }
    }

    /// Attribute with the long-task primitive at the configured threshold
    pub fn with_default_primitive(
        tasks: &'a dyn TaskTreeProvider,
        milestones: &'a dyn MilestoneProvider,
        blocking_time: &'a dyn BlockingTimeProvider,
    ) -> Self {
        Self {
            tasks,
            milestones,
            blocking_time,
            primitive: None,
            config: AttributionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AttributionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Attribute blocking time for one metric computation
    ///
    /// The blocking-time result, the task tree and the analysis window are
    /// fetched concurrently. Collaborator failures propagate unchanged.
    pub fn compute(&self, input: &MetricComputationInput) -> Result<TbtImpactReport> {
        let span = tracing::info_span!("tbt_impact", trace = %input.trace.id);
        let _guard = span.enter();

        let default_primitive = BlockingTimeImpact::new(self.config.blocking_threshold_ms);
        let primitive: &dyn ImpactPrimitive = match self.primitive {
            Some(primitive) => primitive,
            None => &default_primitive,
        };

        let ((blocking_time, tree), window) = parallel::join(
            || {
                parallel::join(
                    || {
                        self.blocking_time
                            .total_blocking_time(input)
                            .map_err(collaborator_error("total-blocking-time"))
                    },
                    || {
                        self.tasks
                            .main_thread_tasks(&input.trace)
                            .map_err(collaborator_error("main-thread-tasks"))
                    },
                )
            },
            || resolve_window(input, self.milestones),
        );
        let blocking_time = blocking_time?;
        let tree = tree?;
        let window = window?;

        let (strategy, impacts) = match &blocking_time {
            BlockingTimeResult::Simulated { node_timings, .. } => {
                tracing::debug!(
                    nodes = node_timings.len(),
                    tasks = tree.len(),
                    "attributing against simulated timeline"
                );
                let impacts =
                    simulated_impacts(&tree, node_timings, &window, primitive, &self.config);
                (AttributionStrategy::Simulated, impacts)
            }
            BlockingTimeResult::Observed { .. } => {
                tracing::debug!(tasks = tree.len(), "attributing against observed timeline");
                let impacts = observed_impacts(&tree, &window, primitive, &self.config);
                (AttributionStrategy::Observed, impacts)
            }
        };

        let (tasks, anomalies) = aggregate(&tree, &impacts, self.config.anomaly_tolerance_ms);
        let report = TbtImpactReport {
            strategy,
            window,
            tasks,
            anomalies,
        };

        tracing::info!(
            strategy = %report.strategy,
            window = %report.window,
            tasks = report.tasks.len(),
            total_tbt_impact = report.total_tbt_impact(),
            blocking_time = blocking_time.timing(),
            "attributed blocking time"
        );

        Ok(report)
    }
}
