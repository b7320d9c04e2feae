//! Remote playback session management.
//!
//! Wraps discovery of a cast-capable receiver, session negotiation, and the
//! "load and play" handoff, behind a vendor-neutral transport seam:
//!
//! - [`transport`]: the [`CastTransport`] capability set and its option and
//!   media-load types
//! - [`session`]: the [`CastSessionManager`] lifecycle
//!   (`Uninitialized → Initializing → {Ready | Unavailable}`) with the
//!   nested connection state
//!
//! The manager assumes nothing about the transport vendor beyond the
//! capability set; tests drive it with a scripted transport.

mod session;
mod transport;

pub use session::CastSessionManager;
pub use transport::{
    AutoJoinPolicy, CastOptions, CastTransport, MediaLoadRequest, SessionOutcome, StreamType,
    TransportCapability, TransportEvent,
};

use serde::Serialize;
use thiserror::Error;

/// Summarized cast connection state, as reported to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// No receivers discoverable on the network. Disables the connect
    /// affordance entirely.
    NoReceiversFound,
    /// Receivers exist but no session is active.
    Idle,
    /// A session request is in flight.
    Connecting,
    /// A session is established.
    Connected,
}

impl ConnectionState {
    /// Human-readable description for notifications and logs.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoReceiversFound => "no receivers found",
            Self::Idle => "not connected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Lifecycle phase of the cast session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastPhase {
    /// `initialize` has not been called.
    Uninitialized,
    /// Waiting for the cast runtime to announce readiness.
    Initializing,
    /// Runtime ready and configured; discovery state is live.
    Ready,
    /// Cast cannot be used in this context (insecure origin, missing
    /// runtime, readiness timeout). Carries the reason.
    Unavailable(String),
}

/// An established session with a specific receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    /// Transport-assigned session identifier.
    pub session_id: String,
    /// Friendly name of the receiver device.
    pub receiver_name: String,
    /// Receiver application the session was established against.
    pub application_id: String,
}

/// Errors from the remote playback session.
#[derive(Debug, Error)]
pub enum CastError {
    /// Cast cannot be used in this context.
    #[error("Cast unavailable: {0}")]
    Unavailable(String),

    /// An operation that needs a session was called without one.
    #[error("No active cast session")]
    NotConnected,

    /// The media URL is not absolute; receivers cannot resolve relative URLs.
    #[error("Invalid media URL (must be absolute): {0}")]
    InvalidMediaUrl(String),

    /// The transport reported a failure other than user cancellation.
    #[error("Cast transport error: {0}")]
    Transport(String),
}

/// Convenient Result alias for cast operations.
pub type CastResult<T> = Result<T, CastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_serializes_to_camel_case() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::NoReceiversFound).unwrap(),
            "\"noReceiversFound\""
        );
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connected).unwrap(),
            "\"connected\""
        );
    }

    #[test]
    fn descriptions_cover_every_state() {
        for (state, text) in [
            (ConnectionState::NoReceiversFound, "no receivers found"),
            (ConnectionState::Idle, "not connected"),
            (ConnectionState::Connecting, "connecting"),
            (ConnectionState::Connected, "connected"),
        ] {
            assert_eq!(state.description(), text);
        }
    }
}
