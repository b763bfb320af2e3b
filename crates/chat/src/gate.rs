//! Admission gate for the generation backend.
//!
//! The backend is a heavyweight, stateful resource that is not safe for
//! uncoordinated concurrent invocation: at most one generation call may
//! execute per backend instance. Additional callers queue on the gate's
//! single permit; queuing is bounded by a timeout, after which the caller
//! is rejected as resource-exhausted. A caller that times out while queued
//! has caused no side effects; once a call is in flight it is never
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use supportdesk_core::error::BackendError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    queue_timeout: Duration,
}

impl AdmissionGate {
    /// A gate admitting one call at a time, with the given queue timeout.
    pub fn new(queue_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            queue_timeout,
        }
    }

    /// Wait for the backend to become free. The returned permit holds the
    /// gate until dropped.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, BackendError> {
        match tokio::time::timeout(self.queue_timeout, self.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            // The semaphore is never closed; this arm is unreachable in
            // practice but kept explicit.
            Ok(Err(_)) => Err(BackendError::Fault("admission gate closed".into())),
            Err(_) => {
                warn!(
                    timeout_secs = self.queue_timeout.as_secs(),
                    "Admission gate queue timeout"
                );
                Err(BackendError::ResourceExhausted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_caller_is_admitted() {
        let gate = AdmissionGate::new(Duration::from_millis(50));
        let permit = gate.admit().await;
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn second_caller_times_out_while_first_holds() {
        let gate = AdmissionGate::new(Duration::from_millis(20));
        let _held = gate.admit().await.unwrap();
        let err = gate.admit().await.unwrap_err();
        assert!(matches!(err, BackendError::ResourceExhausted));
    }

    #[tokio::test]
    async fn permit_release_admits_the_next_caller() {
        let gate = AdmissionGate::new(Duration::from_millis(100));
        let held = gate.admit().await.unwrap();
        drop(held);
        assert!(gate.admit().await.is_ok());
    }
}
