//! Blocking-time contribution of a single event
//!
//! The attribution core treats the primitive as a black box: it only relies
//! on the signature `(event, window_start, window_end, top_level) -> f64`.
//! [`BlockingTimeImpact`] is the standard long-task formula; any closure with
//! the same shape is accepted too, which keeps the core testable against
//! arbitrary primitives.

use crate::timing::ImpactEvent;

/// Default long-task threshold (milliseconds)
pub const BLOCKING_TIME_THRESHOLD_MS: f64 = 50.0;

/// Computes one event's blocking-time contribution within a window
pub trait ImpactPrimitive: Sync {
    /// Portion of `event` inside `[window_start, window_end]` that counts
    /// toward blocking time
    ///
    /// `top_level` is the enclosing top-level task's event, given when
    /// `event` is a descendant whose threshold should be weighted by its
    /// share of the top-level duration.
    fn impact(
        &self,
        event: &ImpactEvent,
        window_start: f64,
        window_end: f64,
        top_level: Option<&ImpactEvent>,
    ) -> f64;
}

impl<F> ImpactPrimitive for F
where
    F: Fn(&ImpactEvent, f64, f64, Option<&ImpactEvent>) -> f64 + Sync,
{
    fn impact(
        &self,
        event: &ImpactEvent,
        window_start: f64,
        window_end: f64,
        top_level: Option<&ImpactEvent>,
    ) -> f64 {
        self(event, window_start, window_end, top_level)
    }
}

/// Long-task blocking time: the clipped duration beyond a threshold
///
/// For a descendant event the threshold shrinks in proportion to the event's
/// share of its top-level task, so the children of a long task split its
/// blocking time instead of each being measured against the full threshold.
/// A zero-duration top-level event scales the threshold to infinity, so its
/// descendants contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingTimeImpact {
    pub threshold_ms: f64,
}

impl Default for BlockingTimeImpact {
    fn default() -> Self {
        Self {
            threshold_ms: BLOCKING_TIME_THRESHOLD_MS,
        }
    }
}

impl BlockingTimeImpact {
    pub fn new(threshold_ms: f64) -> Self {
        Self { threshold_ms }
    }
}

impl ImpactPrimitive for BlockingTimeImpact {
    fn impact(
        &self,
        event: &ImpactEvent,
        window_start: f64,
        window_end: f64,
        top_level: Option<&ImpactEvent>,
    ) -> f64 {
        let mut threshold = self.threshold_ms;
        if let Some(top_level) = top_level {
            if top_level.duration <= 0.0 {
                return 0.0;
            }
            threshold *= event.duration / top_level.duration;
        }

        if event.duration < threshold {
            return 0.0;
        }
        if event.end < window_start || event.start > window_end {
            return 0.0;
        }

        let clipped_start = event.start.max(window_start);
        let clipped_end = event.end.min(window_end);
        let clipped_duration = clipped_end - clipped_start;
        if clipped_duration < threshold {
            return 0.0;
        }

        clipped_duration - threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_overlap() {
        let primitive = BlockingTimeImpact::default();
        let event = ImpactEvent::new(1000.0, 1200.0);
        assert_eq!(primitive.impact(&event, 500.0, 1500.0, None), 150.0);
    }

    #[test]
    fn test_short_task_contributes_nothing() {
        let primitive = BlockingTimeImpact::default();
        let event = ImpactEvent::new(1000.0, 1040.0);
        assert_eq!(primitive.impact(&event, 0.0, 5000.0, None), 0.0);
    }

    #[test]
    fn test_outside_window() {
        let primitive = BlockingTimeImpact::default();
        let before = ImpactEvent::new(0.0, 400.0);
        let after = ImpactEvent::new(1600.0, 2000.0);
        assert_eq!(primitive.impact(&before, 500.0, 1500.0, None), 0.0);
        assert_eq!(primitive.impact(&after, 500.0, 1500.0, None), 0.0);
    }

    #[test]
    fn test_clipped_to_window() {
        let primitive = BlockingTimeImpact::default();
        // 300ms task, 120ms of it inside the window
        let event = ImpactEvent::new(380.0, 680.0);
        assert_eq!(primitive.impact(&event, 560.0, 5000.0, None), 70.0);
    }

    #[test]
    fn test_clipped_below_threshold() {
        let primitive = BlockingTimeImpact::default();
        let event = ImpactEvent::new(0.0, 200.0);
        assert_eq!(primitive.impact(&event, 170.0, 5000.0, None), 0.0);
    }

    #[test]
    fn test_threshold_scaled_by_top_level_share() {
        let primitive = BlockingTimeImpact::default();
        let top_level = ImpactEvent::new(0.0, 200.0);
        // Half of the top-level task: threshold becomes 25ms
        let child = ImpactEvent::new(0.0, 100.0);
        assert_eq!(primitive.impact(&child, 0.0, 1000.0, Some(&top_level)), 75.0);
        // Children partition the parent's 150ms of blocking time
        let sibling = ImpactEvent::new(100.0, 200.0);
        let total = primitive.impact(&child, 0.0, 1000.0, Some(&top_level))
            + primitive.impact(&sibling, 0.0, 1000.0, Some(&top_level));
        assert_eq!(total, primitive.impact(&top_level, 0.0, 1000.0, None));
    }

    #[test]
    fn test_zero_duration_top_level_is_guarded() {
        let primitive = BlockingTimeImpact::default();
        let top_level = ImpactEvent::new(100.0, 100.0);
        let event = ImpactEvent::new(0.0, 100.0);
        let impact = primitive.impact(&event, 0.0, 1000.0, Some(&top_level));
        assert_eq!(impact, 0.0);

        let instant = ImpactEvent::new(100.0, 100.0);
        let impact = primitive.impact(&instant, 0.0, 1000.0, Some(&top_level));
        assert_eq!(impact, 0.0);
        assert_eq!(BlockingTimeImpact::new(0.0).impact(&instant, 0.0, 1000.0, Some(&top_level)), 0.0);
    }

    #[test]
    fn test_closure_is_a_primitive() {
        let primitive = |event: &ImpactEvent, _: f64, _: f64, _: Option<&ImpactEvent>| event.duration;
        let event = ImpactEvent::new(0.0, 30.0);
        assert_eq!(ImpactPrimitive::impact(&primitive, &event, 0.0, 1.0, None), 30.0);
    }
}
