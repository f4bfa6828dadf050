//! One-shot readiness gate for session initialization.
//!
//! Any number of callers can wait on the gate, each with its own timeout.
//! The handshake settles it exactly once, either with credentials or with
//! a terminal error, and every waiter observes the same outcome. A settled
//! gate is never re-armed.

use std::sync::Arc;
use std::time::Duration;

use protocol::{ProtocolError, Result, SessionCredentials};
use tokio::sync::watch;

/// Lifecycle of a session's handshake.
#[derive(Debug, Clone)]
pub enum SessionPhase {
    /// Handshake in flight.
    Initializing,
    /// Handshake succeeded; credentials are available.
    Ready(Arc<SessionCredentials>),
    /// Handshake failed permanently.
    Failed(ProtocolError),
}

impl SessionPhase {
    /// Whether the handshake has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        !matches!(self, SessionPhase::Initializing)
    }
}

/// Broadcast gate that releases all waiters once the handshake settles.
#[derive(Debug)]
pub struct InitGate {
    phase_tx: watch::Sender<SessionPhase>,
}

impl InitGate {
    /// Creates a gate waiting for a handshake.
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Initializing);
        Self { phase_tx }
    }

    /// Creates a gate that has already failed.
    pub fn failed(error: ProtocolError) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Failed(error));
        Self { phase_tx }
    }

    /// Snapshot of the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase_tx.borrow().clone()
    }

    /// Credentials, if the handshake succeeded.
    pub fn credentials(&self) -> Option<Arc<SessionCredentials>> {
        match &*self.phase_tx.borrow() {
            SessionPhase::Ready(credentials) => Some(Arc::clone(credentials)),
            _ => None,
        }
    }

    /// Releases every waiter with success.
    ///
    /// Returns `false` if the gate had already settled.
    pub fn open(&self, credentials: SessionCredentials) -> bool {
        self.settle(SessionPhase::Ready(Arc::new(credentials)))
    }

    /// Releases every waiter with `error`.
    ///
    /// Returns `false` if the gate had already settled.
    pub fn fail(&self, error: ProtocolError) -> bool {
        self.settle(SessionPhase::Failed(error))
    }

    fn settle(&self, outcome: SessionPhase) -> bool {
        self.phase_tx.send_if_modified(|phase| {
            if phase.is_settled() {
                return false;
            }
            *phase = outcome;
            true
        })
    }

    /// Waits until the handshake settles or `timeout` elapses.
    ///
    /// Returns immediately when the gate is already settled. A timeout
    /// affects only this caller; the handshake and other waiters carry on.
    pub async fn wait(&self, timeout: Duration) -> Result<Arc<SessionCredentials>> {
        let mut phase_rx = self.phase_tx.subscribe();
        let settled = tokio::time::timeout(timeout, async {
            phase_rx
                .wait_for(SessionPhase::is_settled)
                .await
                .map(|phase| phase.clone())
        })
        .await;

        match settled {
            Err(_) => Err(ProtocolError::Timeout(format!(
                "session was not initialized within {:?}",
                timeout
            ))),
            Ok(Err(_)) => Err(ProtocolError::NotInitialized),
            Ok(Ok(SessionPhase::Ready(credentials))) => Ok(credentials),
            Ok(Ok(SessionPhase::Failed(error))) => Err(error),
            Ok(Ok(SessionPhase::Initializing)) => Err(ProtocolError::NotInitialized),
        }
    }
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> SessionCredentials {
        SessionCredentials::from_handshake(&json!({
            "apiversion": "1",
            "apiaccesstoken": "tok",
            "sessionhash": "sh",
            "apiclientid": "cid",
            "secret": "sec"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_wait_after_ready_is_immediate() {
        let gate = InitGate::new();
        assert!(gate.open(credentials()));

        let creds = gate.wait(Duration::ZERO).await.unwrap();
        assert_eq!(creds.client_id, "cid");
    }

    #[tokio::test]
    async fn test_wait_after_failure_is_immediate() {
        let gate = InitGate::failed(ProtocolError::Configuration("missing".to_string()));

        let err = gate.wait(Duration::ZERO).await.unwrap_err();
        assert_eq!(err, ProtocolError::Configuration("missing".to_string()));
    }

    #[tokio::test]
    async fn test_wait_times_out_while_initializing() {
        let gate = InitGate::new();

        let err = gate.wait(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout(_)));
        assert!(!gate.phase().is_settled());
    }

    #[tokio::test]
    async fn test_all_waiters_released_on_open() {
        let gate = Arc::new(InitGate::new());

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait(Duration::from_secs(5)).await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.open(credentials());

        for waiter in waiters {
            let creds = waiter.await.unwrap().unwrap();
            assert_eq!(creds.access_token, "tok");
        }
    }

    #[tokio::test]
    async fn test_all_waiters_receive_same_failure() {
        let gate = Arc::new(InitGate::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait(Duration::from_secs(5)).await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.fail(ProtocolError::Handshake("invalid_apikey".to_string()));

        for waiter in waiters {
            let err = waiter.await.unwrap().unwrap_err();
            assert_eq!(err, ProtocolError::Handshake("invalid_apikey".to_string()));
        }
    }

    #[tokio::test]
    async fn test_timeout_does_not_affect_other_waiters() {
        let gate = Arc::new(InitGate::new());

        let patient = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait(Duration::from_secs(5)).await })
        };

        let impatient = gate.wait(Duration::from_millis(10)).await;
        assert!(matches!(impatient, Err(ProtocolError::Timeout(_))));

        gate.open(credentials());
        assert!(patient.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_gate_settles_once() {
        let gate = InitGate::new();
        assert!(gate.fail(ProtocolError::Handshake("first".to_string())));
        assert!(!gate.open(credentials()));
        assert!(!gate.fail(ProtocolError::Handshake("second".to_string())));

        assert!(gate.credentials().is_none());
        let err = gate.wait(Duration::ZERO).await.unwrap_err();
        assert_eq!(err, ProtocolError::Handshake("first".to_string()));
    }

    #[test]
    fn test_credentials_snapshot() {
        let gate = InitGate::new();
        assert!(gate.credentials().is_none());
        gate.open(credentials());
        assert_eq!(gate.credentials().unwrap().secret, "sec");
    }
}
