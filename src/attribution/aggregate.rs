// Aggregation of per-task impacts into total and self impact
//
// Whichever strategy filled the impact map, the decomposition is the same:
// a task's total impact is its own entry (0 when absent) and its self impact
// is the total minus the totals of its direct children.

use super::ImpactMap;
use crate::task_tree::{TaskId, TaskNode, TaskTree};
use crate::timing::TimingWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Label for self impact with no attributable URL
pub const UNATTRIBUTED: &str = "Other";

/// Which timeline the impacts were measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributionStrategy {
    Observed,
    Simulated,
}

impl fmt::Display for AttributionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributionStrategy::Observed => f.write_str("observed"),
            AttributionStrategy::Simulated => f.write_str("simulated"),
        }
    }
}

/// A task with its blocking-time attribution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TbtImpactTask {
    #[serde(flatten)]
    pub task: TaskNode,
    /// Blocking time of this task including descendants
    pub tbt_impact: f64,
    /// Blocking time of this task alone
    pub self_tbt_impact: f64,
}

/// Self impact summed over the tasks attributable to one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlImpact {
    pub url: String,
    pub self_tbt_impact: f64,
    pub task_count: usize,
}

/// Result of one attribution run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TbtImpactReport {
    pub strategy: AttributionStrategy,
    pub window: TimingWindow,
    /// One entry per task, in task-tree order
    pub tasks: Vec<TbtImpactTask>,
    /// Tasks whose self impact came out negative
    pub anomalies: Vec<TaskId>,
}

impl TbtImpactReport {
    pub fn get(&self, id: TaskId) -> Option<&TbtImpactTask> {
        self.tasks.get(id.0)
    }

    /// Blocking time summed over top-level tasks
    pub fn total_tbt_impact(&self) -> f64 {
        self.tasks
            .iter()
            .filter(|t| t.task.is_top_level())
            .map(|t| t.tbt_impact)
            .sum()
    }

    /// The `n` tasks with the largest self impact, largest first
    pub fn top_tasks_by_self_impact(&self, n: usize) -> Vec<&TbtImpactTask> {
        let mut ranked: Vec<&TbtImpactTask> = self
            .tasks
            .iter()
            .filter(|t| t.self_tbt_impact > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.self_tbt_impact.total_cmp(&a.self_tbt_impact));
        ranked.truncate(n);
        ranked
    }

    /// Self impact grouped by attributable URL, largest first
    ///
    /// Tasks without a URL are grouped under [`UNATTRIBUTED`]. Tasks with no
    /// impact are not counted.
    pub fn impact_by_url(&self) -> Vec<UrlImpact> {
        let mut by_url: HashMap<&str, (f64, usize)> = HashMap::new();
        for task in &self.tasks {
            if task.self_tbt_impact == 0.0 {
                continue;
            }
            let url = task.task.url.as_deref().unwrap_or(UNATTRIBUTED);
            let entry = by_url.entry(url).or_default();
            entry.0 += task.self_tbt_impact;
            entry.1 += 1;
        }

        let mut impacts: Vec<UrlImpact> = by_url
            .into_iter()
            .map(|(url, (self_tbt_impact, task_count))| UrlImpact {
                url: url.to_string(),
                self_tbt_impact,
                task_count,
            })
            .collect();
        impacts.sort_by(|a, b| {
            b.self_tbt_impact
                .total_cmp(&a.self_tbt_impact)
                .then_with(|| a.url.cmp(&b.url))
        });
        impacts
    }
}

/// Decompose the impact map into total and self impact for every task
///
/// Returns the tasks in tree order together with the ids of tasks whose self
/// impact fell below `-anomaly_tolerance_ms`.
pub fn aggregate(
    tree: &TaskTree,
    impacts: &ImpactMap,
    anomaly_tolerance_ms: f64,
) -> (Vec<TbtImpactTask>, Vec<TaskId>) {
    let impact_of = |id: TaskId| impacts.get(&id).copied().unwrap_or(0.0);

    let mut anomalies = Vec::new();
    let tasks = tree
        .tasks()
        .iter()
        .map(|task| {
            let tbt_impact = impact_of(task.id);
            let children_impact: f64 = task.children.iter().map(|&c| impact_of(c)).sum();
            let self_tbt_impact = tbt_impact - children_impact;

            if self_tbt_impact < -anomaly_tolerance_ms {
                tracing::warn!(
                    task = %task.id,
                    name = %task.name,
                    tbt_impact,
                    children_impact,
                    "children account for more blocking time than their parent"
                );
                anomalies.push(task.id);
            }

            TbtImpactTask {
                task: task.clone(),
                tbt_impact,
                self_tbt_impact,
            }
        })
        .collect();

    (tasks, anomalies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_tree::{EventRef, TaskRecord};

    fn tree() -> TaskTree {
        TaskTree::from_records(vec![
            TaskRecord::new(EventRef(1), "RunTask", 0.0, 1000.0, None),
            TaskRecord::new(EventRef(2), "EvaluateScript", 100.0, 500.0, Some(0))
                .with_url("https://a.test/app.js"),
            TaskRecord::new(EventRef(3), "FunctionCall", 600.0, 900.0, Some(0))
                .with_url("https://b.test/ads.js"),
            TaskRecord::new(EventRef(4), "FunctionCall", 150.0, 300.0, Some(1))
                .with_url("https://a.test/app.js"),
        ])
        .unwrap()
    }

    fn impacts(values: &[(usize, f64)]) -> ImpactMap {
        values.iter().map(|&(id, v)| (TaskId(id), v)).collect()
    }

    #[test]
    fn test_self_impact_subtracts_direct_children() {
        let tree = tree();
        let map = impacts(&[(0, 900.0), (1, 350.0), (2, 250.0), (3, 100.0)]);
        let (tasks, anomalies) = aggregate(&tree, &map, 1e-6);

        assert!(anomalies.is_empty());
        assert_eq!(tasks[0].tbt_impact, 900.0);
        assert_eq!(tasks[0].self_tbt_impact, 300.0);
        assert_eq!(tasks[1].self_tbt_impact, 250.0);
        assert_eq!(tasks[2].self_tbt_impact, 250.0);
        assert_eq!(tasks[3].self_tbt_impact, 100.0);
    }

    #[test]
    fn test_missing_entries_default_to_zero() {
        let tree = tree();
        let map = impacts(&[(0, 900.0)]);
        let (tasks, _) = aggregate(&tree, &map, 1e-6);

        assert_eq!(tasks[0].self_tbt_impact, 900.0);
        assert_eq!(tasks[1].tbt_impact, 0.0);
        assert_eq!(tasks[1].self_tbt_impact, 0.0);
    }

    #[test]
    fn test_negative_self_impact_flagged() {
        let tree = tree();
        let map = impacts(&[(0, 100.0), (1, 350.0)]);
        let (tasks, anomalies) = aggregate(&tree, &map, 1e-6);

        assert_eq!(tasks[0].self_tbt_impact, -250.0);
        assert_eq!(anomalies, vec![TaskId(0)]);
    }

    #[test]
    fn test_report_helpers() {
        let tree = tree();
        let map = impacts(&[(0, 900.0), (1, 350.0), (2, 250.0), (3, 100.0)]);
        let (tasks, anomalies) = aggregate(&tree, &map, 1e-6);
        let report = TbtImpactReport {
            strategy: AttributionStrategy::Observed,
            window: TimingWindow::new(0.0, 1000.0).unwrap(),
            tasks,
            anomalies,
        };

        assert_eq!(report.total_tbt_impact(), 900.0);

        let top = report.top_tasks_by_self_impact(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].task.id, TaskId(0));
        assert_eq!(top[0].self_tbt_impact, 300.0);
        assert_eq!(top[1].self_tbt_impact, 250.0);

        let by_url = report.impact_by_url();
        assert_eq!(by_url.len(), 3);
        assert_eq!(by_url[0].url, "https://a.test/app.js");
        assert_eq!(by_url[0].self_tbt_impact, 350.0);
        assert_eq!(by_url[0].task_count, 2);
        assert_eq!(by_url[1].url, UNATTRIBUTED);
        assert_eq!(by_url[2].url, "https://b.test/ads.js");
    }
}
