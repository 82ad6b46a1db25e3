//! Size and time flush triggers

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Inline check run right after every enqueue
#[derive(Debug, Clone, Copy)]
pub(crate) struct SizeTrigger {
    threshold: Option<usize>,
}

impl SizeTrigger {
    /// `None` disables size triggering entirely
    pub(crate) fn new(threshold: Option<usize>) -> Self {
        Self { threshold }
    }

    pub(crate) fn should_flush(&self, pending: usize) -> bool {
        self.threshold.is_some_and(|limit| pending >= limit)
    }
}

/// Recurring background task with fixed-delay semantics
///
/// The delay is measured from the end of one tick to the start of the next,
/// so a slow tick pushes every later firing back.
pub(crate) struct TimeTrigger {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TimeTrigger {
    /// Spawn the timer task; the first tick fires one `interval` from now
    pub(crate) fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = sleep(interval) => tick().await,
                }
            }
            debug!("Time trigger stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the timer, wait up to `grace` for an in-flight tick, then abort it
    pub(crate) async fn stop(&mut self, grace: Duration) {
        self.cancel.cancel();

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        match timeout(grace, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Time trigger task ended abnormally: {e}"),
            Err(_) => {
                warn!(
                    "Time trigger did not stop within {:?}, aborting it",
                    grace
                );
                handle.abort();
            }
        }
        info!("Time trigger shut down");
    }
}

impl Drop for TimeTrigger {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_size_trigger_threshold() {
        let trigger = SizeTrigger::new(Some(3));
        assert!(!trigger.should_flush(0));
        assert!(!trigger.should_flush(2));
        assert!(trigger.should_flush(3));
        assert!(trigger.should_flush(10));
    }

    #[test]
    fn test_size_trigger_disabled() {
        let trigger = SizeTrigger::new(None);
        assert!(!trigger.should_flush(usize::MAX));
    }

    fn counting_trigger(interval: Duration, tick_cost: Duration) -> (TimeTrigger, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let trigger = TimeTrigger::start(interval, move || {
            let counter = Arc::clone(&counter);
            async move {
                sleep(tick_cost).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (trigger, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_trigger_fires_periodically() {
        let (mut trigger, ticks) = counting_trigger(Duration::from_millis(100), Duration::ZERO);

        sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        trigger.stop(Duration::from_secs(1)).await;
        sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_trigger_uses_fixed_delay() {
        // Each tick takes 50ms, so firings land at 100, 250, 400, ...
        let (mut trigger, ticks) =
            counting_trigger(Duration::from_millis(100), Duration::from_millis(50));

        sleep(Duration::from_millis(420)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        trigger.stop(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_slow_tick() {
        let (mut trigger, ticks) =
            counting_trigger(Duration::from_millis(10), Duration::from_secs(3600));

        sleep(Duration::from_millis(20)).await;
        trigger.stop(Duration::from_millis(100)).await;

        sleep(Duration::from_secs(7200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
