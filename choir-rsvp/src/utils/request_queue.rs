//! Bounded-concurrency request queue
//!
//! Protects the rate-limited Sheets API from bursts of client demand. A fixed
//! pool of worker tasks pulls requests from one unbounded FIFO channel, so at
//! most `max_concurrent` requests are in flight at any instant. Each worker
//! waits `delay_between_requests` after taking a request and before running
//! it; workers wait independently, so dispatches are spaced per worker and not
//! serialized behind each other.
//!
//! **Back-pressure:** queueing only. The channel is unbounded and nothing is
//! dropped, so sustained overload grows memory rather than failing fast.
//!
//! **Ordering:** requests are admitted in submission order. Completion order
//! depends on each request's latency once more than one worker is busy.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};

use choir_common::config::CompiledDefaults;
use choir_common::{Error, Result};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Queue sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Worker count; `0` is treated as `1`
    pub max_concurrent: usize,
    pub delay_between_requests: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: CompiledDefaults::MAX_CONCURRENT,
            delay_between_requests: Duration::from_millis(
                CompiledDefaults::DELAY_BETWEEN_REQUESTS_MS,
            ),
        }
    }
}

#[derive(Default)]
struct QueueStats {
    pending: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicU64,
}

/// Shared scheduler for spreadsheet requests.
///
/// Construct once per process and share behind an `Arc`.
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<Job>,
    stats: Arc<QueueStats>,
    config: QueueConfig,
}

impl RequestQueue {
    /// Start the worker pool.
    ///
    /// Must be called from within a Tokio runtime. Workers stop once the
    /// queue is dropped and the remaining requests have run.
    pub fn new(config: QueueConfig) -> Self {
        let config = QueueConfig {
            max_concurrent: config.max_concurrent.max(1),
            ..config
        };
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(QueueStats::default());

        for worker_id in 0..config.max_concurrent {
            tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&receiver),
                Arc::clone(&stats),
                config.delay_between_requests,
            ));
        }

        tracing::debug!(
            max_concurrent = config.max_concurrent,
            delay_ms = config.delay_between_requests.as_millis() as u64,
            "Request queue started"
        );

        Self {
            sender,
            stats,
            config,
        }
    }

    /// Enqueue `request` and wait for its result.
    ///
    /// The request always runs eventually, even if the returned future is
    /// dropped. The only errors added by the queue itself are
    /// [`Error::Internal`] for a shut-down queue or a request that panicked.
    pub async fn add<F, Fut, T>(&self, request: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || -> BoxFuture<'static, ()> {
            Box::pin(async move {
                // Receiver may be gone if the caller stopped waiting
                let _ = result_tx.send(request().await);
            })
        });

        self.stats.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(job).is_err() {
            self.stats.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Internal("Request queue is shut down".to_string()));
        }

        result_rx.await.map_err(|_| {
            Error::Internal("Queued request ended without producing a result".to_string())
        })?
    }

    /// Requests waiting for a worker
    pub fn pending(&self) -> usize {
        self.stats.pending.load(Ordering::SeqCst)
    }

    /// Requests taken by a worker (delaying or executing)
    pub fn in_flight(&self) -> usize {
        self.stats.in_flight.load(Ordering::SeqCst)
    }

    /// Requests finished since startup
    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    stats: Arc<QueueStats>,
    delay: Duration,
) {
    loop {
        let job = {
            let mut receiver = receiver.lock().await;
            receiver.recv().await
        };
        let Some(job) = job else {
            break;
        };

        stats.pending.fetch_sub(1, Ordering::SeqCst);
        stats.in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(delay).await;

        // Run in its own task so a panicking request cannot take the worker down
        if let Err(e) = tokio::spawn(job()).await {
            tracing::error!(worker_id, error = %e, "Queued request panicked");
        }

        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        stats.completed.fetch_add(1, Ordering::SeqCst);
    }

    tracing::trace!(worker_id, "Request queue worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn queue(max_concurrent: usize, delay_ms: u64) -> Arc<RequestQueue> {
        Arc::new(RequestQueue::new(QueueConfig {
            max_concurrent,
            delay_between_requests: Duration::from_millis(delay_ms),
        }))
    }

    #[tokio::test]
    async fn test_add_returns_request_result() {
        let queue = queue(2, 1);
        let value = queue.add(|| async { Ok::<_, Error>(42) }).await.unwrap();
        assert_eq!(value, 42);

        let err = queue
            .add(|| async { Err::<i32, _>(Error::InvalidInput("nope".to_string())) })
            .await;
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let queue = queue(3, 1);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..10usize {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                queue
                    .add(move || async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok(i)
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        results.sort();

        assert_eq!(results, (0..10).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2, "requests should overlap");
        assert_eq!(queue.pending(), 0);

        // Workers count a request as completed just after handing back its result
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.completed(), 10);
        assert_eq!(queue.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_single_worker_preserves_submission_order() {
        let queue = queue(1, 1);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let order = Arc::clone(&order);
            let fut = {
                let queue = Arc::clone(&queue);
                async move {
                    queue
                        .add(move || async move {
                            order.lock().unwrap().push(i);
                            Ok(())
                        })
                        .await
                }
            };
            handles.push(tokio::spawn(fut));
            // Let the spawned task enqueue before the next submission
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_each_dispatch_is_delayed() {
        let queue = queue(1, 30);
        let start = Instant::now();
        for _ in 0..3 {
            queue.add(|| async { Ok(()) }).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_panicking_request_does_not_kill_worker() {
        let queue = queue(1, 1);
        let result = queue
            .add(|| async {
                if true {
                    panic!("boom");
                }
                Ok(1)
            })
            .await;
        assert!(matches!(result, Err(Error::Internal(_))));

        let value = queue.add(|| async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_zero_concurrency_clamped() {
        let queue = queue(0, 1);
        assert_eq!(queue.config().max_concurrent, 1);
        assert_eq!(queue.add(|| async { Ok(1) }).await.unwrap(), 1);
    }
}
