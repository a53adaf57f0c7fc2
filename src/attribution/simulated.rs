// Attribution against a simulated timeline
//
// The simulation only predicts top-level CPU work. Those nodes are mapped
// back to their observed tasks and measured directly. Descendants are then
// placed inside their ancestor's simulated span by linear rescaling: a child
// keeps the same relative position within its top-level task that it had in
// the recording. Sub-work is not re-simulated.

use super::ImpactMap;
use crate::blocking_time::NodeTiming;
use crate::config::AttributionConfig;
use crate::impact::ImpactPrimitive;
use crate::parallel;
use crate::task_tree::{TaskId, TaskNode, TaskTree};
use crate::timing::{ImpactEvent, SimulatedEvent, TimingWindow};
use fnv::FnvHashMap;

/// Project `task` into the simulated span of its top-level ancestor
///
/// The task's offsets from both ends of the observed top-level span are
/// taken as fractions of the observed duration and applied to the simulated
/// duration. A zero-duration top-level task yields zero fractions, so the
/// result spans the whole simulated event.
///
/// # Example
/// ```
/// use tbt_impact::attribution::interpolate_simulated_event;
/// use tbt_impact::task_tree::{EventRef, TaskId, TaskRecord, TaskTree};
/// use tbt_impact::timing::ImpactEvent;
///
/// let tree = TaskTree::from_records(vec![
///     TaskRecord::new(EventRef(1), "RunTask", 0.0, 1000.0, None),
///     TaskRecord::new(EventRef(2), "FunctionCall", 200.0, 400.0, Some(0)),
/// ])
/// .unwrap();
///
/// let simulated = ImpactEvent::new(0.0, 2000.0);
/// let child = interpolate_simulated_event(tree.task(TaskId(1)), tree.task(TaskId(0)), &simulated);
/// assert_eq!((child.start, child.end), (400.0, 800.0));
/// ```
pub fn interpolate_simulated_event(
    task: &TaskNode,
    top_level: &TaskNode,
    top_level_simulated: &SimulatedEvent,
) -> SimulatedEvent {
    let (start_fraction, end_fraction) = if top_level.duration > 0.0 {
        (
            (task.start_time - top_level.start_time) / top_level.duration,
            (top_level.end_time - task.end_time) / top_level.duration,
        )
    } else {
        (0.0, 0.0)
    };

    let start = start_fraction * top_level_simulated.duration + top_level_simulated.start;
    let end = top_level_simulated.end - end_fraction * top_level_simulated.duration;

    ImpactEvent::new(start, end)
}

/// Impact of every task reachable from the simulated CPU nodes
///
/// Tasks whose top-level ancestor has no simulated node stay out of the
/// returned map.
pub fn simulated_impacts(
    tree: &TaskTree,
    node_timings: &[NodeTiming],
    window: &TimingWindow,
    primitive: &dyn ImpactPrimitive,
    config: &AttributionConfig,
) -> ImpactMap {
    let mut impacts = ImpactMap::default();
    let mut simulated_events: FnvHashMap<TaskId, SimulatedEvent> = FnvHashMap::default();

    // Phase 1: top-level CPU nodes, measured directly.
    for timing in node_timings {
        let Some(event_ref) = timing.node.cpu_event() else {
            continue;
        };

        let event = ImpactEvent::from_node_timing(timing);
        let impact = primitive.impact(&event, window.start_time_ms, window.end_time_ms, None);

        let Some(task) = tree.find_by_event(event_ref) else {
            tracing::debug!(
                node = timing.node.id,
                event = event_ref.0,
                "simulated cpu node has no matching task, skipping"
            );
            continue;
        };

        impacts.insert(task, impact);
        simulated_events.insert(task, event);
    }

    // Phase 2: descendants, interpolated into their ancestor's simulated span.
    let pending: Vec<&TaskNode> = tree
        .tasks()
        .iter()
        .filter(|task| !impacts.contains_key(&task.id))
        .collect();

    let workers = if config.runs_parallel(pending.len()) {
        config.worker_threads
    } else {
        1
    };

    let interpolated = parallel::map_chunked(&pending, workers, |task| {
        let top_level_id = tree.top_level(task.id);
        let top_level_simulated = simulated_events.get(&top_level_id)?;
        let event =
            interpolate_simulated_event(task, tree.task(top_level_id), top_level_simulated);
        let impact = primitive.impact(
            &event,
            window.start_time_ms,
            window.end_time_ms,
            Some(top_level_simulated),
        );
        Some((task.id, impact))
    });

    let mut unmapped = 0usize;
    for entry in interpolated {
        match entry {
            Some((id, impact)) => {
                impacts.insert(id, impact);
            }
            None => unmapped += 1,
        }
    }
    if unmapped > 0 {
        tracing::debug!(
            unmapped,
            "tasks without a simulated top-level ancestor left unattributed"
        );
    }

    impacts
}
