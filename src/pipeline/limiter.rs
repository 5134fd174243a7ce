// file: src/pipeline/limiter.rs
// description: bounded concurrent execution of deferred work items
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffer_unordered

use futures::stream::{self, StreamExt};
use std::future::Future;

#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimiter {
    limit: usize,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Starts each item lazily, keeps at most `limit` in flight and resolves
    /// once all of them have. Results arrive in completion order.
    pub async fn run<I, F, Fut>(&self, work: I) -> Vec<Fut::Output>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        stream::iter(work)
            .map(|item| item())
            .buffer_unordered(self.limit)
            .collect()
            .await
    }
}
