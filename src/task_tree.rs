//! Main-thread task tree
//!
//! Tasks arrive as a flat, start-ordered list where each record names its
//! parent by index. The tree is stored as an arena: children are owned index
//! lists and the parent link is an optional index, so there is no cyclic
//! ownership and every task has a stable [`TaskId`].
//!
//! # Example
//!
//! ```
//! use tbt_impact::task_tree::{EventRef, TaskRecord, TaskTree};
//!
//! # fn main() -> Result<(), tbt_impact::task_tree::TaskTreeError> {
//! let tree = TaskTree::from_records(vec![
//!     TaskRecord::new(EventRef(1), "RunTask", 0.0, 1000.0, None),
//!     TaskRecord::new(EventRef(2), "EvaluateScript", 200.0, 400.0, Some(0)),
//! ])?;
//!
//! let child = tree.find_by_event(EventRef(2)).unwrap();
//! assert_eq!(tree.top_level(child), tree.roots()[0]);
//! # Ok(())
//! # }
//! ```

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable identity of a task: its index in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque identity of the raw trace event a task (or simulation node) came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRef(pub u64);

/// Errors raised while assembling a task tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskTreeError {
    #[error("task {index} names parent {parent}, but only {len} tasks exist")]
    ParentOutOfRange {
        index: usize,
        parent: usize,
        len: usize,
    },

    #[error("task {index} names parent {parent}, which does not precede it")]
    ParentNotPreceding { index: usize, parent: usize },

    #[error("task {index} ends before it starts ({start_time}ms > {end_time}ms)")]
    NegativeDuration {
        index: usize,
        start_time: f64,
        end_time: f64,
    },

    #[error("raw event {event:?} is claimed by tasks {first} and {second}")]
    DuplicateEvent {
        event: EventRef,
        first: usize,
        second: usize,
    },
}

/// Flat input form of a task, as produced by trace processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub event: EventRef,
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
    /// Index of the parent record in the same list
    #[serde(default)]
    pub parent: Option<usize>,
    /// Script URL the work is attributable to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TaskRecord {
    pub fn new(
        event: EventRef,
        name: impl Into<String>,
        start_time: f64,
        end_time: f64,
        parent: Option<usize>,
    ) -> Self {
        Self {
            event,
            name: name.into(),
            start_time,
            end_time,
            parent,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A unit of main-thread CPU work (times in milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub id: TaskId,
    pub event: EventRef,
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub parent: Option<TaskId>,
    pub children: Vec<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TaskNode {
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena of task nodes with parent/child links
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    nodes: Vec<TaskNode>,
    roots: Vec<TaskId>,
    /// Top-level ancestor of each node, indexed like `nodes`
    top_levels: Vec<TaskId>,
    by_event: FnvHashMap<EventRef, TaskId>,
}

impl TaskTree {
    /// Build the arena from start-ordered records
    ///
    /// A parent must precede its children in the list, which rules out
    /// cycles. A child whose span escapes its parent is kept, with a warning.
    pub fn from_records(records: Vec<TaskRecord>) -> Result<Self, TaskTreeError> {
        let len = records.len();
        let mut nodes: Vec<TaskNode> = Vec::with_capacity(len);
        let mut roots = Vec::new();
        let mut top_levels = Vec::with_capacity(len);
        let mut by_event = FnvHashMap::default();

        for (index, record) in records.into_iter().enumerate() {
            if record.end_time < record.start_time {
                return Err(TaskTreeError::NegativeDuration {
                    index,
                    start_time: record.start_time,
                    end_time: record.end_time,
                });
            }

            let id = TaskId(index);
            if let Some(first) = by_event.insert(record.event, id) {
                return Err(TaskTreeError::DuplicateEvent {
                    event: record.event,
                    first: first.0,
                    second: index,
                });
            }

            let parent = match record.parent {
                None => {
                    roots.push(id);
                    top_levels.push(id);
                    None
                }
                Some(parent) if parent >= len => {
                    return Err(TaskTreeError::ParentOutOfRange { index, parent, len });
                }
                Some(parent) if parent >= index => {
                    return Err(TaskTreeError::ParentNotPreceding { index, parent });
                }
                Some(parent) => {
                    let parent_node = &mut nodes[parent];
                    if record.start_time < parent_node.start_time
                        || record.end_time > parent_node.end_time
                    {
                        tracing::warn!(
                            task = index,
                            parent,
                            "task [{}, {}] escapes parent span [{}, {}]",
                            record.start_time,
                            record.end_time,
                            parent_node.start_time,
                            parent_node.end_time
                        );
                    }
                    parent_node.children.push(id);
                    top_levels.push(top_levels[parent]);
                    Some(TaskId(parent))
                }
            };

            nodes.push(TaskNode {
                id,
                event: record.event,
                name: record.name,
                start_time: record.start_time,
                end_time: record.end_time,
                duration: record.end_time - record.start_time,
                parent,
                children: Vec::new(),
                url: record.url,
            });
        }

        Ok(Self {
            nodes,
            roots,
            top_levels,
            by_event,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All tasks in arena order
    pub fn tasks(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskNode> {
        self.nodes.get(id.0)
    }

    /// Task for an id handed out by this tree
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    pub fn task(&self, id: TaskId) -> &TaskNode {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn children(&self, id: TaskId) -> &[TaskId] {
        &self.task(id).children
    }

    /// Task created from the given raw event, if any
    pub fn find_by_event(&self, event: EventRef) -> Option<TaskId> {
        self.by_event.get(&event).copied()
    }

    /// Enclosing top-level task (the task itself for a root)
    ///
    /// Resolved while building the tree, so this is constant time at any
    /// depth.
    pub fn top_level(&self, id: TaskId) -> TaskId {
        self.top_levels[id.0]
    }
}
