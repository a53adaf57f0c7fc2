// Analysis window resolution
//
// Navigation traces are measured between first contentful paint and
// interactive. When the milestones come from simulation the window takes the
// widest plausible interval: optimistic paint to pessimistic interactive, so
// attribution against a pessimistic simulated timeline never under-counts.

use super::{collaborator_error, ImpactError};
use crate::collaborators::{MetricComputationInput, MilestoneProvider};
use crate::milestones::{GatherMode, MilestoneTiming};
use crate::parallel;
use crate::timing::TimingWindow;

/// Window spanning the whole recording
pub fn whole_trace_window(trace_end_ms: f64) -> Result<TimingWindow, ImpactError> {
    make_window(0.0, trace_end_ms)
}

/// Window between the paint and interactive milestones
///
/// Uses the optimistic paint estimate and the pessimistic interactive
/// estimate when available; observed timings are used as-is.
pub fn milestone_window(
    first_contentful_paint: &MilestoneTiming,
    interactive: &MilestoneTiming,
) -> Result<TimingWindow, ImpactError> {
    make_window(
        first_contentful_paint.optimistic_ms(),
        interactive.pessimistic_ms(),
    )
}

/// Resolve the analysis window for a metric computation
///
/// Milestones are only fetched for navigations; the two fetches run
/// concurrently.
pub fn resolve_window(
    input: &MetricComputationInput,
    milestones: &dyn MilestoneProvider,
) -> Result<TimingWindow, ImpactError> {
    if input.gather_context.gather_mode != GatherMode::Navigation {
        tracing::debug!(
            mode = %input.gather_context.gather_mode,
            "non-navigation trace, using whole recording"
        );
        return whole_trace_window(input.trace.end_time_ms);
    }

    let (first_contentful_paint, interactive) = parallel::join(
        || {
            milestones
                .first_contentful_paint(input)
                .map_err(collaborator_error("first-contentful-paint"))
        },
        || {
            milestones
                .interactive(input)
                .map_err(collaborator_error("interactive"))
        },
    );

    milestone_window(&first_contentful_paint?, &interactive?)
}

fn make_window(start_time_ms: f64, end_time_ms: f64) -> Result<TimingWindow, ImpactError> {
    TimingWindow::new(start_time_ms, end_time_ms).ok_or(ImpactError::InvertedWindow {
        start_time_ms,
        end_time_ms,
    })
}
