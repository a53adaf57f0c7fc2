//! Offline trace snapshots
//!
//! A snapshot is a JSON document holding everything the attribution core
//! asks its collaborators for: the flat task list, both milestones and the
//! blocking-time result. [`TraceSnapshot`] implements every collaborator
//! trait, so a snapshot can be attributed without the rest of the pipeline.
//!
//! ```json
//! {
//!   "trace": {"id": "run-1", "endTimeMs": 6000},
//!   "url": "https://example.com/",
//!   "gatherMode": "navigation",
//!   "firstContentfulPaint": {"kind": "observed", "timing": 900},
//!   "interactive": {"kind": "observed", "timing": 4200},
//!   "totalBlockingTime": {"kind": "observed", "timing": 310},
//!   "tasks": [
//!     {"event": 1, "name": "RunTask", "startTime": 1000, "endTime": 1400},
//!     {"event": 2, "name": "EvaluateScript", "startTime": 1010, "endTime": 1300,
//!      "parent": 0, "url": "https://example.com/app.js"}
//!   ]
//! }
//! ```

use crate::blocking_time::BlockingTimeResult;
use crate::collaborators::{
    BlockingTimeProvider, GatherContext, MetricComputationInput, MetricSettings,
    MilestoneProvider, SimulatorOptions, TaskTreeProvider, TraceHandle,
};
use crate::milestones::{GatherMode, MilestoneTiming};
use crate::task_tree::{TaskRecord, TaskTree, TaskTreeError};
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid task tree: {0}")]
    TaskTree(#[from] TaskTreeError),
}

/// Serialized form of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub trace: TraceHandle,
    pub url: String,
    pub gather_mode: GatherMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools_log: Option<String>,
    #[serde(default)]
    pub settings: MetricSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator: Option<SimulatorOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint: Option<MilestoneTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<MilestoneTiming>,
    pub total_blocking_time: BlockingTimeResult,
    pub tasks: Vec<TaskRecord>,
}

/// A parsed snapshot with its task tree built
#[derive(Debug, Clone)]
pub struct TraceSnapshot {
    document: SnapshotDocument,
    tree: TaskTree,
}

impl TraceSnapshot {
    pub fn new(document: SnapshotDocument) -> Result<Self, SnapshotError> {
        let tree = TaskTree::from_records(document.tasks.clone())?;
        Ok(Self { document, tree })
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Self::new(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    /// Metric computation input described by this snapshot
    pub fn input(&self) -> MetricComputationInput {
        let doc = &self.document;
        MetricComputationInput {
            trace: doc.trace.clone(),
            devtools_log: doc.devtools_log.clone(),
            url: doc.url.clone(),
            gather_context: GatherContext {
                gather_mode: doc.gather_mode,
            },
            settings: doc.settings.clone(),
            simulator: doc.simulator.clone(),
        }
    }

    fn check_trace(&self, trace: &TraceHandle) -> anyhow::Result<()> {
        if trace.id != self.document.trace.id {
            bail!(
                "snapshot holds trace {:?}, asked for {:?}",
                self.document.trace.id,
                trace.id
            );
        }
        Ok(())
    }
}

impl TaskTreeProvider for TraceSnapshot {
    fn main_thread_tasks(&self, trace: &TraceHandle) -> anyhow::Result<TaskTree> {
        self.check_trace(trace)?;
        Ok(self.tree.clone())
    }
}

impl MilestoneProvider for TraceSnapshot {
    fn first_contentful_paint(
        &self,
        input: &MetricComputationInput,
    ) -> anyhow::Result<MilestoneTiming> {
        self.check_trace(&input.trace)?;
        self.document
            .first_contentful_paint
            .ok_or_else(|| anyhow!("snapshot has no firstContentfulPaint milestone"))
    }

    fn interactive(&self, input: &MetricComputationInput) -> anyhow::Result<MilestoneTiming> {
        self.check_trace(&input.trace)?;
        self.document
            .interactive
            .ok_or_else(|| anyhow!("snapshot has no interactive milestone"))
    }
}

impl BlockingTimeProvider for TraceSnapshot {
    fn total_blocking_time(
        &self,
        input: &MetricComputationInput,
    ) -> anyhow::Result<BlockingTimeResult> {
        self.check_trace(&input.trace)?;
        Ok(self.document.total_blocking_time.clone())
    }
}
