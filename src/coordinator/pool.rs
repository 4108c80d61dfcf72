//! Bounded fan-out over an explicit task queue.
//!
//! Every item is pushed into a channel up front; a fixed number of worker
//! tasks drain it. Each job runs in its own task so a panic is reported as a
//! `JoinError` against its item instead of killing the worker.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};

/// Run `job` over `items` with at most `workers` in flight.
///
/// Returns one `(item, result)` pair per input item, in completion order.
pub async fn fan_out<T, R, F, Fut>(items: Vec<T>, workers: usize, job: F) -> Vec<(T, Result<R, JoinError>)>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);

    let (queue_tx, queue_rx) = mpsc::channel::<T>(total);
    for item in items {
        // Capacity equals item count: never blocks, and the receiver is alive.
        if queue_tx.send(item).await.is_err() {
            break;
        }
    }
    drop(queue_tx);

    let queue_rx = Arc::new(Mutex::new(queue_rx));
    let (done_tx, mut done_rx) = mpsc::channel::<(T, Result<R, JoinError>)>(total);
    let job = Arc::new(job);

    let mut set = JoinSet::new();
    for _ in 0..workers {
        let queue_rx = Arc::clone(&queue_rx);
        let done_tx = done_tx.clone();
        let job = Arc::clone(&job);
        set.spawn(async move {
            loop {
                let next = queue_rx.lock().await.recv().await;
                let Some(item) = next else { break };
                let result = tokio::spawn((*job)(item.clone())).await;
                if done_tx.send((item, result)).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(done_tx);

    let mut results = Vec::with_capacity(total);
    while let Some(done) = done_rx.recv().await {
        results.push(done);
    }
    while set.join_next().await.is_some() {}
    results
}
