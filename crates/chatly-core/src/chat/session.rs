//! Session controller for one chat connection.
//!
//! A `SessionController` exclusively owns its [`ExchangeHistory`]. Inbound
//! messages reach it through a FIFO channel and are processed one at a time
//! by [`SessionController::run`], so two completions for the same session
//! never overlap and turns are never interleaved.
//!
//! Lifecycle: `Connecting -> Active -> Closed`. Closing releases the history.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use chatly_types::error::SessionError;
use chatly_types::session::{ConnectionId, SessionState};

use super::codec::TurnCodec;
use super::history::ExchangeHistory;
use super::invoker::CompletionInvoker;

/// Drives the exchange for a single connection.
pub struct SessionController {
    id: ConnectionId,
    state: SessionState,
    history: ExchangeHistory,
    invoker: Arc<CompletionInvoker>,
    outbound: mpsc::UnboundedSender<String>,
}

impl SessionController {
    /// Create a controller in the `Connecting` state with an empty history.
    ///
    /// Replies are pushed to `outbound`, which belongs to the originating
    /// connection only.
    pub fn new(
        id: ConnectionId,
        invoker: Arc<CompletionInvoker>,
        history_limit: usize,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            history: ExchangeHistory::with_limit(history_limit),
            invoker,
            outbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &ExchangeHistory {
        &self.history
    }

    /// `Connecting -> Active`. No-op in any other state.
    pub fn activate(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Active;
            tracing::debug!(connection_id = %self.id, "session active");
        }
    }

    /// Move to the terminal `Closed` state and release the history.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            self.history.clear();
            tracing::debug!(connection_id = %self.id, "session closed");
        }
    }

    /// Run one exchange: user turn, completion, model turn.
    ///
    /// Returns the text to emit (the reply or the fallback message). Only an
    /// `Active` session accepts messages.
    pub async fn handle_message(&mut self, text: String) -> Result<String, SessionError> {
        match self.state {
            SessionState::Active => {}
            SessionState::Closed => return Err(SessionError::Closed(self.id)),
            SessionState::Connecting => return Err(SessionError::NotActive(self.id)),
        }

        self.history.append(TurnCodec::to_user_turn(text));
        let snapshot = self.history.snapshot();

        let outcome = self.invoker.complete(&snapshot).await;
        let reply = outcome.into_text();

        self.history.append(TurnCodec::to_model_turn(reply.clone()));
        Ok(reply)
    }

    /// Send a reply to the originating connection.
    ///
    /// A gone connection is not an error: the reply is dropped.
    fn emit(&self, reply: String) {
        if self.outbound.send(reply).is_err() {
            tracing::debug!(connection_id = %self.id, "connection gone, reply discarded");
        }
    }

    /// Process inbound messages in arrival order until the connection goes away.
    ///
    /// The loop ends when `cancel` fires (disconnect) or every inbound sender
    /// is dropped. A completion already in flight when `cancel` fires runs to
    /// the end but its reply is discarded; queued messages are dropped.
    /// Returns the controller in the `Closed` state.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<String>,
        cancel: CancellationToken,
    ) -> Self {
        let span = tracing::info_span!("session", chatly.connection.id = %self.id);

        async {
            loop {
                let text = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    msg = inbound.recv() => match msg {
                        Some(text) => text,
                        None => break,
                    },
                };

                match self.handle_message(text).await {
                    Ok(reply) => {
                        if cancel.is_cancelled() {
                            tracing::debug!("disconnected during completion, reply discarded");
                            break;
                        }
                        self.emit(reply);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "message rejected");
                        break;
                    }
                }
            }

            inbound.close();
            self.close();
        }
        .instrument(span)
        .await;

        self
    }
}
