//! Connection registry: connection id -> live session.
//!
//! The registry is a lifecycle factory plus a lookup table. `connect` builds a
//! [`SessionController`] with a fresh history, activates it and spawns its
//! worker; `disconnect` cancels the worker and forgets the mapping. Each
//! worker owns its controller outright, so sessions share nothing.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use chatly_types::error::SessionError;
use chatly_types::identity::AuthenticatedIdentity;
use chatly_types::session::{ConnectionId, SessionState};

use super::invoker::CompletionInvoker;
use super::session::SessionController;

/// Cheap, cloneable sender side of a registered session.
#[derive(Clone)]
pub struct SessionHandle {
    id: ConnectionId,
    inbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an inbound message for the session worker.
    pub fn submit(&self, text: String) -> Result<(), SessionError> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Closed(self.id));
        }
        self.inbound
            .send(text)
            .map_err(|_| SessionError::Closed(self.id))
    }

    pub fn state(&self) -> SessionState {
        if self.cancel.is_cancelled() || self.inbound.is_closed() {
            SessionState::Closed
        } else {
            SessionState::Active
        }
    }
}

struct RegistryEntry {
    handle: SessionHandle,
    task: JoinHandle<SessionController>,
}

/// Live sessions keyed by connection id.
pub struct ConnectionRegistry {
    invoker: Arc<CompletionInvoker>,
    history_limit: usize,
    sessions: DashMap<ConnectionId, RegistryEntry>,
}

impl ConnectionRegistry {
    pub fn new(invoker: Arc<CompletionInvoker>, history_limit: usize) -> Self {
        Self {
            invoker,
            history_limit,
            sessions: DashMap::new(),
        }
    }

    /// Open a session for a new connection owned by `identity`.
    ///
    /// Replies for this session are delivered to `outbound` only.
    pub fn connect(
        &self,
        identity: &AuthenticatedIdentity,
        outbound: mpsc::UnboundedSender<String>,
    ) -> SessionHandle {
        let id = ConnectionId::new();
        let mut controller =
            SessionController::new(id, self.invoker.clone(), self.history_limit, outbound);
        controller.activate();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(controller.run(inbound_rx, cancel.clone()));

        let handle = SessionHandle {
            id,
            inbound: inbound_tx,
            cancel,
        };
        self.sessions.insert(
            id,
            RegistryEntry {
                handle: handle.clone(),
                task,
            },
        );

        tracing::info!(
            connection_id = %id,
            username = %identity.username,
            active_sessions = self.sessions.len(),
            "chat session opened"
        );
        handle
    }

    pub fn get(&self, id: ConnectionId) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.handle.clone())
    }

    /// Close the session for `id` and drop the mapping.
    ///
    /// Returns the worker task, which resolves to the closed controller once
    /// any in-flight completion has finished. `None` if `id` is unknown.
    pub fn disconnect(&self, id: ConnectionId) -> Option<JoinHandle<SessionController>> {
        let (_, entry) = self.sessions.remove(&id)?;
        entry.handle.cancel.cancel();
        tracing::info!(
            connection_id = %id,
            active_sessions = self.sessions.len(),
            "chat session closed"
        );
        Some(entry.task)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chatly_types::llm::LlmError;
    use chatly_types::turn::{Turn, TurnRole};
    use uuid::Uuid;

    use crate::chat::testing::{scripted_invoker, Step, FALLBACK};

    fn identity(name: &str) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            id: Uuid::now_v7(),
            username: name.to_string(),
            email: format!("{name}@example.com"),
        }
    }

    #[tokio::test]
    async fn test_connect_registers_active_session() {
        let (invoker, _) = scripted_invoker(vec![Step::Reply("hello")]);
        let registry = ConnectionRegistry::new(invoker, 30);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = registry.connect(&identity("asha"), tx);
        assert_eq!(registry.len(), 1);
        assert_eq!(handle.state(), SessionState::Active);
        assert!(registry.get(handle.id()).is_some());

        handle.submit("hi".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
        // Exactly one event per message
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());

        let closed = registry.disconnect(handle.id()).unwrap().await.unwrap();
        assert_eq!(closed.state(), SessionState::Closed);
        assert!(registry.is_empty());
        assert!(registry.get(handle.id()).is_none());
    }

    #[tokio::test]
    async fn test_disconnected_handle_rejects_messages() {
        let (invoker, _) = scripted_invoker(vec![]);
        let registry = ConnectionRegistry::new(invoker, 30);
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = registry.connect(&identity("asha"), tx);

        registry.disconnect(handle.id()).unwrap().await.unwrap();

        assert_eq!(handle.state(), SessionState::Closed);
        assert_eq!(
            handle.submit("late".to_string()),
            Err(SessionError::Closed(handle.id()))
        );
        assert!(registry.disconnect(handle.id()).is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (invoker, calls) = scripted_invoker(vec![]);
        let registry = ConnectionRegistry::new(invoker, 30);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.connect(&identity("asha"), tx_a);
        let b = registry.connect(&identity("bilal"), tx_b);
        assert_ne!(a.id(), b.id());

        a.submit("from a".to_string()).unwrap();
        assert_eq!(rx_a.recv().await.unwrap(), "echo: from a");

        b.submit("from b".to_string()).unwrap();
        assert_eq!(rx_b.recv().await.unwrap(), "echo: from b");

        // B's first completion saw only its own turn
        let calls = calls.lock().unwrap();
        assert_eq!(calls[1], vec![Turn::new(TurnRole::User, "from b")]);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_in_one_session_does_not_affect_another() {
        let (invoker, _) = scripted_invoker(vec![
            Step::Fail(LlmError::Provider {
                message: "HTTP 500".to_string(),
            }),
            Step::Reply("fine"),
        ]);
        let registry = ConnectionRegistry::new(invoker, 30);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.connect(&identity("asha"), tx_a);
        let b = registry.connect(&identity("bilal"), tx_b);

        a.submit("boom".to_string()).unwrap();
        assert_eq!(rx_a.recv().await.unwrap(), FALLBACK);

        b.submit("hi".to_string()).unwrap();
        assert_eq!(rx_b.recv().await.unwrap(), "fine");

        assert_eq!(a.state(), SessionState::Active);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_reconnect_starts_with_empty_history() {
        let (invoker, calls) = scripted_invoker(vec![]);
        let registry = ConnectionRegistry::new(invoker, 30);
        let user = identity("asha");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = registry.connect(&user, tx);
        first.submit("remember me".to_string()).unwrap();
        rx.recv().await.unwrap();
        registry.disconnect(first.id()).unwrap().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let second = registry.connect(&user, tx);
        second.submit("hello again".to_string()).unwrap();
        rx.recv().await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[1], vec![Turn::new(TurnRole::User, "hello again")]);
    }
}
