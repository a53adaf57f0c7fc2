//! tbt-impact - Attribute total blocking time to main-thread tasks
//!
//! This library explains a page load's total-blocking-time score by
//! attributing it to the individual tasks of the main-thread task tree, on
//! either the recorded timeline or a simulated one, with total and self
//! impact for every task.

pub mod attribution;
pub mod blocking_time;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod impact;
pub mod milestones;
pub mod parallel;
pub mod report;
pub mod snapshot;
pub mod task_tree;
pub mod timing;
