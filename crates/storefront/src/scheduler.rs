// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

/// Background task with an explicit stop signal.
///
/// The task receives the cancellation receiver and is expected to return
/// soon after it resolves. Dropping the handle without calling
/// [ScheduledTask::cancel] aborts the task.
pub struct ScheduledTask {
    tx_cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx_cancel, rx_cancel) = oneshot::channel();
        Self {
            tx_cancel: Some(tx_cancel),
            handle: Some(tokio::spawn(task(rx_cancel))),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the task and wait for it to return.
    pub async fn cancel(mut self) {
        if let Some(tx_cancel) = self.tx_cancel.take() {
            // The task may already have returned on its own.
            let _ = tx_cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Scheduled task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn ticking(counter: Arc<AtomicUsize>) -> ScheduledTask {
        ScheduledTask::spawn(move |mut rx_cancel| async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = &mut rx_cancel => break,
                    _ = interval.tick() => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = ticking(counter.clone());
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        task.cancel().await;

        let seen = counter.load(Ordering::SeqCst);
        assert!(seen >= 3);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_the_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = ticking(counter.clone());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(task);
        tokio::task::yield_now().await;

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }
}
