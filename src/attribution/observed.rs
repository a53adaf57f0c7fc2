// Attribution against the recorded timeline
//
// Every task is measured with its own observed timing, weighted by its
// top-level ancestor's observed timing. Tasks are independent of each other,
// so the pass can fan out across workers.

use super::ImpactMap;
use crate::config::AttributionConfig;
use crate::impact::ImpactPrimitive;
use crate::parallel;
use crate::task_tree::TaskTree;
use crate::timing::{ImpactEvent, TimingWindow};

/// Impact of every task in `tree` on the observed timeline
pub fn observed_impacts(
    tree: &TaskTree,
    window: &TimingWindow,
    primitive: &dyn ImpactPrimitive,
    config: &AttributionConfig,
) -> ImpactMap {
    let workers = if config.runs_parallel(tree.len()) {
        config.worker_threads
    } else {
        1
    };

    let impacts = parallel::map_chunked(tree.tasks(), workers, |task| {
        let event = ImpactEvent::from_task(task);
        let top_level = ImpactEvent::from_task(tree.task(tree.top_level(task.id)));
        primitive.impact(
            &event,
            window.start_time_ms,
            window.end_time_ms,
            Some(&top_level),
        )
    });

    tree.tasks()
        .iter()
        .map(|task| task.id)
        .zip(impacts)
        .collect()
}
