//! The control channel session: one WebSocket connection at a time, with
//! its lifecycle surfaced to the widget as events.
//!
//! The socket lives in a spawned task owned through [`SessionHandle`]; the
//! widget never touches the stream directly. Connect failures surface as
//! [`SessionEvent::Errored`], never as a returned error.

pub mod socket;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::protocol::Inbound;

/// Lifecycle of the channel connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection has been requested yet
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl SessionState {
    /// Text for the status indicator. The Open/Closed/Error wording is what
    /// the server operators watch for; pinned by tests.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Not connected",
            SessionState::Connecting => "Connecting...",
            SessionState::Open => "Open",
            SessionState::Closed => "Closed",
            SessionState::Errored => "Error - see console log",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }

    /// A fresh connect is only allowed when no connection is live; there is
    /// at most one active connection per session
    pub fn can_connect(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::Closed | SessionState::Errored
        )
    }
}

/// What happened on the socket, delivered on the widget's event channel
#[derive(Debug)]
pub enum SessionEvent {
    Opened,
    Closed,
    Errored(String),
    /// A parsed inbound text frame
    Message(Inbound),
    /// An inbound text frame that was not valid JSON; recorded, not fatal
    Malformed { raw: String, error: String },
    /// An inbound binary frame; accepted but unused
    Binary { len: usize },
}

/// Result of a send attempted against a session that may not be ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The connection is not open; the frame was not sent
    NotReady,
}

/// Owned handle to the socket task for one connection. Whoever runs the
/// widget owns the handle; letting it go ends the session.
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Queue a text frame for the socket. Fire-and-forget: no ack, no
    /// backpressure, matching the channel's semantics.
    pub fn send_text(&self, frame: String) -> SendOutcome {
        if self.outbound.send(frame).is_ok() {
            SendOutcome::Sent
        } else {
            SendOutcome::NotReady
        }
    }

    /// Close the connection and wait for the socket task to drain queued
    /// frames and finish. Used by the one-shot CLI paths.
    pub async fn close(self) {
        drop(self.outbound);
        let _ = self.task.await;
    }
}

/// Open a connection to `url`. Lifecycle transitions and inbound traffic
/// arrive on `events`; the returned handle is the only way to send.
pub fn connect(url: String, events: mpsc::UnboundedSender<SessionEvent>) -> SessionHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(socket::run(url, outbound_rx, events));
    SessionHandle {
        outbound: outbound_tx,
        task,
    }
}
