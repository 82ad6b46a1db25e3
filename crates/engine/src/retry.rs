//! Bounded retry of a drained batch

use crate::listener::BulkListener;
use crate::operation::BulkOperation;
use std::sync::Arc;
use tracing::{error, warn};

/// Result of running one batch through the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The operation succeeded on attempt number `attempts`
    Succeeded { attempts: u32 },
    /// Every one of the `attempts` invocations failed
    Exhausted { attempts: u32 },
}

impl FlushOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Wraps the caller's operation with listener hooks and bounded re-invocation
pub(crate) struct RetryLoop<T: Send + Sync> {
    operation: Arc<dyn BulkOperation<T>>,
    listener: Arc<dyn BulkListener<T>>,
    max_retry: u32,
}

impl<T: Send + Sync> RetryLoop<T> {
    pub(crate) fn new(
        operation: Arc<dyn BulkOperation<T>>,
        listener: Arc<dyn BulkListener<T>>,
        max_retry: u32,
    ) -> Self {
        Self {
            operation,
            listener,
            max_retry,
        }
    }

    /// Run the operation on `batch` until it succeeds or `max_retry + 1` attempts fail
    ///
    /// Operation errors stop here: they reach the failure hook and the log, never the caller.
    pub(crate) async fn run(&self, batch: &[T]) -> FlushOutcome {
        let mut attempt: u32 = 0;

        loop {
            self.listener.before_bulk(batch);

            match self.operation.execute(batch).await {
                Ok(()) => {
                    self.listener.after_bulk(batch);
                    return FlushOutcome::Succeeded {
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    warn!(
                        "Bulk of {} items failed (attempt {}/{}): {e:#}",
                        batch.len(),
                        attempt + 1,
                        self.max_retry + 1
                    );
                    self.listener.after_bulk_failure(batch, &e);

                    if attempt >= self.max_retry {
                        error!(
                            "Giving up on bulk of {} items after {} attempts",
                            batch.len(),
                            attempt + 1
                        );
                        return FlushOutcome::Exhausted {
                            attempts: attempt + 1,
                        };
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingListener {
        events: Mutex<Vec<&'static str>>,
    }

    impl CountingListener {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().expect("listener lock poisoned").clone()
        }
    }

    impl BulkListener<u32> for CountingListener {
        fn before_bulk(&self, _batch: &[u32]) {
            self.events.lock().expect("listener lock poisoned").push("before");
        }

        fn after_bulk(&self, _batch: &[u32]) {
            self.events.lock().expect("listener lock poisoned").push("success");
        }

        fn after_bulk_failure(&self, _batch: &[u32], _failure: &anyhow::Error) {
            self.events.lock().expect("listener lock poisoned").push("failure");
        }
    }

    /// Fails the first `failures` invocations, then succeeds
    struct FlakyOperation {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl BulkOperation<u32> for FlakyOperation {
        async fn execute(&self, _batch: &[u32]) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                anyhow::bail!("transient failure {call}");
            }
            Ok(())
        }
    }

    fn retry_loop(
        failures: usize,
        max_retry: u32,
    ) -> (RetryLoop<u32>, Arc<FlakyOperation>, Arc<CountingListener>) {
        let op = Arc::new(FlakyOperation {
            failures,
            calls: AtomicUsize::new(0),
        });
        let listener = Arc::new(CountingListener::default());
        let retry = RetryLoop::new(
            Arc::clone(&op) as Arc<dyn BulkOperation<u32>>,
            Arc::clone(&listener) as Arc<dyn BulkListener<u32>>,
            max_retry,
        );
        (retry, op, listener)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let (retry, op, listener) = retry_loop(0, 3);

        let outcome = retry.run(&[1, 2]).await;

        assert_eq!(outcome, FlushOutcome::Succeeded { attempts: 1 });
        assert_eq!(op.calls.load(Ordering::SeqCst), 1);
        assert_eq!(listener.events(), vec!["before", "success"]);
    }

    #[tokio::test]
    async fn test_recovers_within_retry_budget() {
        let (retry, op, listener) = retry_loop(2, 3);

        let outcome = retry.run(&[1]).await;

        assert_eq!(outcome, FlushOutcome::Succeeded { attempts: 3 });
        assert_eq!(op.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            listener.events(),
            vec!["before", "failure", "before", "failure", "before", "success"]
        );
    }

    #[tokio::test]
    async fn test_exhausts_retry_budget() {
        let (retry, op, listener) = retry_loop(usize::MAX, 3);

        let outcome = retry.run(&[1]).await;

        assert_eq!(outcome, FlushOutcome::Exhausted { attempts: 4 });
        assert!(!outcome.is_success());
        assert_eq!(op.calls.load(Ordering::SeqCst), 4);
        let events = listener.events();
        assert_eq!(events.iter().filter(|e| **e == "before").count(), 4);
        assert_eq!(events.iter().filter(|e| **e == "failure").count(), 4);
        assert!(!events.contains(&"success"));
    }

    #[tokio::test]
    async fn test_zero_retry_means_single_attempt() {
        let (retry, op, _listener) = retry_loop(usize::MAX, 0);

        let outcome = retry.run(&[1]).await;

        assert_eq!(outcome.attempts(), 1);
        assert_eq!(op.calls.load(Ordering::SeqCst), 1);
    }
}
