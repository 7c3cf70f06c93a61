//! Bounded-parallel remote-call helper shared by the stages that POST/GET
//! against the ADR service (spec §4.3 phase 2 "Remote call").

use futures::stream::{self, StreamExt};

/// Runs `f` over `items` with at most `max_parallel` calls in flight at
/// once. Starts are issued in input order; completions are not
/// order-constrained internally, but the returned `Vec` preserves input
/// order for the sequential apply phase that follows.
pub async fn bounded_map<T, R, F, Fut>(items: Vec<T>, max_parallel: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffered(max_parallel.max(1))
        .collect()
        .await
}
