//! Vendor-neutral cast transport seam.
//!
//! The session manager drives the platform cast runtime through
//! [`CastTransport`]; the capability set is deliberately small: readiness,
//! configuration, session negotiation, media load, and a state event feed.
//! Anything vendor-specific stays behind the implementation.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use super::{CastResult, ConnectionState, RemoteSession};
use crate::config::CastConfig;

/// Whether the platform can cast at all.
///
/// Evaluated once at initialization and cached for the life of the process;
/// a runtime that appears later is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCapability {
    /// The cast runtime is present and loadable.
    Capable,
    /// Casting is impossible in this environment. Carries the reason.
    Incapable(String),
}

/// Outcome of a session request.
///
/// User cancellation is a first-class outcome, not an error: backing out of
/// the device picker is normal behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A session was established with a receiver.
    Established(RemoteSession),
    /// The user dismissed the device picker.
    Cancelled,
    /// The transport failed to establish a session.
    Failed(String),
}

/// How an existing session on the same receiver application is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoJoinPolicy {
    /// Join sessions started by any page on the same origin.
    OriginScoped,
    /// Join only sessions started by this page.
    PageScoped,
}

/// Delivery mode announced to the receiver when loading media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamType {
    /// Fixed-length media; the receiver may buffer freely.
    Buffered,
    /// Live stream without a fixed duration.
    Live,
}

/// Options the transport is configured with after readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastOptions {
    /// Receiver application to launch (default media receiver).
    pub receiver_application_id: String,
    /// Locale hint for the device picker and receiver UI.
    pub language: String,
    /// Session auto-join scope.
    pub auto_join_policy: AutoJoinPolicy,
    /// Whether a saved session from a previous page load is resumed.
    pub resume_saved_session: bool,
    /// Compatibility mode for Android TV receivers.
    pub android_receiver_compatible: bool,
}

impl CastOptions {
    /// Builds the transport options from the cast configuration.
    #[must_use]
    pub fn from_config(config: &CastConfig) -> Self {
        Self {
            receiver_application_id: config.receiver_application_id.clone(),
            language: config.language.clone(),
            auto_join_policy: AutoJoinPolicy::OriginScoped,
            resume_saved_session: false,
            android_receiver_compatible: true,
        }
    }
}

/// A "load and play" instruction for the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLoadRequest {
    /// Absolute URL of the media. Receivers resolve nothing relative.
    pub content_url: String,
    /// MIME type of the media.
    pub content_type: String,
    /// Delivery mode.
    pub stream_type: StreamType,
    /// Whether playback starts as soon as the receiver has buffered.
    pub autoplay: bool,
    /// Title shown on the receiver.
    pub title: String,
    /// Subtitle shown on the receiver.
    pub subtitle: String,
    /// Optional artwork URL.
    pub image_url: Option<String>,
}

impl MediaLoadRequest {
    /// A buffered, autoplaying MP3 clip with the given display title.
    #[must_use]
    pub fn buffered_audio(content_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content_url: content_url.into(),
            content_type: "audio/mpeg".to_string(),
            stream_type: StreamType::Buffered,
            autoplay: true,
            title: title.into(),
            subtitle: "Soundboard".to_string(),
            image_url: None,
        }
    }
}

/// Transport-level state notifications consumed by the session manager.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The discovery / connection state changed.
    CastStateChanged(ConnectionState),
    /// The active session changed (established, resumed, or ended).
    SessionChanged,
}

/// The platform cast runtime, reduced to the operations the manager needs.
#[async_trait]
pub trait CastTransport: Send + Sync {
    /// Whether this environment can cast at all. Must be cheap; called once.
    fn detect_capability(&self) -> TransportCapability;

    /// Waits for the runtime to announce readiness. Returns `false` when
    /// the runtime reports itself unavailable. The caller bounds this with
    /// a timeout.
    async fn wait_ready(&self) -> bool;

    /// Applies session options. Called once, after readiness.
    fn configure(&self, options: &CastOptions) -> CastResult<()>;

    /// Whether any receiver is currently discoverable.
    fn receiver_availability(&self) -> bool;

    /// Opens the device picker and negotiates a session.
    async fn request_session(&self) -> SessionOutcome;

    /// The currently established session, if any.
    fn current_session(&self) -> Option<RemoteSession>;

    /// Ends the current session. `stop_receiver_playback` also stops
    /// whatever the receiver is playing instead of letting it run out.
    async fn end_session(&self, stop_receiver_playback: bool);

    /// Loads media into an established session.
    async fn load_media(
        &self,
        session: &RemoteSession,
        request: &MediaLoadRequest,
    ) -> CastResult<()>;

    /// Subscribes to transport state notifications.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_config_use_origin_scoped_auto_join() {
        let options = CastOptions::from_config(&CastConfig::default());
        assert_eq!(options.receiver_application_id, "CC1AD845");
        assert_eq!(options.language, "es-ES");
        assert_eq!(options.auto_join_policy, AutoJoinPolicy::OriginScoped);
        assert!(!options.resume_saved_session);
        assert!(options.android_receiver_compatible);
    }

    #[test]
    fn buffered_audio_request_defaults() {
        let request = MediaLoadRequest::buffered_audio("https://host/sound/Cris.mp3", "Cris");
        assert_eq!(request.content_type, "audio/mpeg");
        assert_eq!(request.stream_type, StreamType::Buffered);
        assert!(request.autoplay);
        assert_eq!(request.title, "Cris");
    }
}
