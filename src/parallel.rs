//! Scoped fan-out helpers built on crossbeam
//!
//! Borrowed inputs stay on the caller's stack; every spawned worker is
//! joined before the helper returns. A panic in a worker resumes on the
//! calling thread. Workers log through the caller's subscriber, inside the
//! caller's current span.

use std::panic;
use tracing::{dispatcher, Dispatch, Span};

/// Subscriber and span of the calling thread, re-entered on workers
struct TraceContext {
    dispatch: Dispatch,
    span: Span,
}

impl TraceContext {
    fn current() -> Self {
        Self {
            dispatch: dispatcher::get_default(|d| d.clone()),
            span: Span::current(),
        }
    }

    fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        dispatcher::with_default(&self.dispatch, || self.span.in_scope(f))
    }
}

/// Run `a` and `b` concurrently and return both results
pub fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let context = TraceContext::current();
    let joined = crossbeam::thread::scope(|scope| {
        let handle = scope.spawn(|_| context.run(b));
        let ra = a();
        let rb = match handle.join() {
            Ok(rb) => rb,
            Err(payload) => panic::resume_unwind(payload),
        };
        (ra, rb)
    });

    match joined {
        Ok(results) => results,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Map `f` over `items`, splitting them into `workers` contiguous chunks
///
/// Output order matches input order. With one worker (or fewer than two
/// items) this is a plain serial map.
pub fn map_chunked<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if workers <= 1 || items.len() < 2 {
        return items.iter().map(&f).collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    let f = &f;
    let context = &TraceContext::current();
    let mapped = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move |_| context.run(|| chunk.iter().map(f).collect::<Vec<R>>()))
            })
            .collect();

        let mut out = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(part) => out.extend(part),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        out
    });

    match mapped {
        Ok(out) => out,
        Err(payload) => panic::resume_unwind(payload),
    }
}
