//! Tracking for message handlers still running

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;

/// Handler tasks spawned per inbound message, kept so shutdown can wait on them
#[derive(Default)]
pub struct InFlight {
    tasks: JoinSet<()>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a handler, first reaping any that already finished
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        self.tasks.spawn(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                tracing::error!("Message handler failed: {}", e);
            }
        }
    }

    /// Wait up to `limit` for running handlers, then abort the rest.
    ///
    /// Returns how many handlers had to be aborted.
    pub async fn drain(&mut self, limit: Duration) -> usize {
        if self.tasks.is_empty() {
            return 0;
        }
        tracing::info!("Waiting for {} message handler(s)", self.tasks.len());

        let finished = tokio::time::timeout(limit, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    tracing::error!("Message handler failed: {}", e);
                }
            }
        })
        .await;

        if finished.is_ok() {
            return 0;
        }

        let aborted = self.tasks.len();
        tracing::warn!("Aborting {} message handler(s) still running", aborted);
        self.tasks.shutdown().await;
        aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_drain_waits_for_running_handlers() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut in_flight = InFlight::new();

        for _ in 0..3 {
            let done = Arc::clone(&done);
            in_flight.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(in_flight.drain(Duration::from_secs(5)).await, 0);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(in_flight.len(), 0);
    }

    #[tokio::test]
    async fn test_drain_aborts_after_limit() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut in_flight = InFlight::new();

        let quick = Arc::clone(&done);
        in_flight.spawn(async move {
            quick.fetch_add(1, Ordering::SeqCst);
        });
        let slow = Arc::clone(&done);
        in_flight.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            slow.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(in_flight.drain(Duration::from_millis(50)).await, 1);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(in_flight.len(), 0);
    }

    #[tokio::test]
    async fn test_finished_handlers_are_reaped() {
        let mut in_flight = InFlight::new();
        in_flight.spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;

        in_flight.spawn(std::future::pending());
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight.drain(Duration::from_millis(10)).await, 1);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_running() {
        let mut in_flight = InFlight::new();
        assert_eq!(in_flight.drain(Duration::from_millis(10)).await, 0);
    }
}
