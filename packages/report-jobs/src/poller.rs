//! Owned handle for a running poll task.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned poll loop tied to a cancellation token.
///
/// Dropping the handle cancels the task, so whoever owns it (the controller)
/// stops polling on every exit path: explicit cancel, a new submission,
/// reset, or being dropped itself.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Spawn `poll_loop` on the current runtime. The loop must watch `token`.
    pub fn spawn<F>(token: CancellationToken, poll_loop: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(poll_loop);
        Self { token, task }
    }

    /// Request the loop to stop. Safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The loop has neither been cancelled nor finished on its own.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_loop() {
        let token = CancellationToken::new();
        let observer = token.clone();
        let loop_token = token.clone();
        let handle = PollHandle::spawn(token, async move {
            loop_token.cancelled().await;
        });

        assert!(handle.is_active());
        drop(handle);
        assert!(observer.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_loop_is_inactive() {
        let handle = PollHandle::spawn(CancellationToken::new(), async {});
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(!handle.is_active());
        handle.cancel();
        handle.cancel();
    }
}
