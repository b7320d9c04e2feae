//! Event system for notifying the UI collaborator.
//!
//! This module provides:
//! - [`EventEmitter`] trait for domain services to emit events
//! - [`BroadcastEventBridge`] for channel-based delivery to any number of observers
//! - Event types for the playback, cast, cache, and board domains
//!
//! The original design notified a single registered callback (last
//! registration wins); the bridge replaces that with a broadcast channel
//! while behaving identically for the single-observer case.

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::cast::ConnectionState;

/// Events broadcast to observers.
///
/// This enum categorizes all notifications that can reach the UI
/// collaborator. Each category has its own inner event type with specific
/// variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Events from local or remote playback.
    Playback(PlaybackEvent),

    /// Events from the remote playback session.
    Cast(CastEvent),

    /// Events from the offline cache worker.
    Cache(CacheEvent),

    /// Summarized board state for rendering.
    Board(BoardEvent),
}

/// Where a playback request was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackTarget {
    /// Played through the local playback engine.
    Local,
    /// Handed off to the connected cast receiver.
    Remote,
}

/// Events related to playback of a single asset.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Playback of an asset began.
    Started {
        /// The asset that started playing.
        #[serde(rename = "assetId")]
        asset_id: String,
        /// Local engine or remote receiver.
        target: PlaybackTarget,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback completed naturally.
    Ended {
        /// The asset that finished.
        #[serde(rename = "assetId")]
        asset_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback was stopped before completion.
    Stopped {
        /// The asset that was stopped.
        #[serde(rename = "assetId")]
        asset_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback failed to start or aborted.
    Error {
        /// The asset the failure relates to.
        #[serde(rename = "assetId")]
        asset_id: String,
        /// Human-readable cause.
        message: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the remote playback session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CastEvent {
    /// Receiver availability on the network changed.
    AvailabilityChanged {
        /// Whether any receiver is currently discoverable.
        available: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The summarized connection state changed.
    ConnectionChanged {
        /// New connection state.
        state: ConnectionState,
        /// Friendly name of the connected receiver, if any.
        #[serde(rename = "receiverName", skip_serializing_if = "Option::is_none")]
        receiver_name: Option<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A session request or media load failed (not a user cancellation).
    Error {
        /// Human-readable cause.
        message: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the offline cache worker lifecycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CacheEvent {
    /// The shell cache for a new worker version was populated.
    ShellInstalled {
        /// Name of the shell generation that was written.
        generation: String,
        /// Number of essential files stored.
        #[serde(rename = "fileCount")]
        file_count: usize,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Stale cache generations were purged during activation.
    GenerationsPurged {
        /// Names of the deleted generations.
        removed: Vec<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// An audio file was stored after its first successful fetch.
    AudioCached {
        /// Request URL that was cached.
        url: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Summarized board state for the UI collaborator.
///
/// Carries exactly what the UI needs to render: the occupied playback slot,
/// the cast connection state, and the receiver name when connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    /// Asset id currently occupying the playback slot, if any.
    pub now_playing: Option<String>,
    /// Current cast connection state.
    pub connection: ConnectionState,
    /// Friendly name of the connected receiver, if any.
    pub receiver_name: Option<String>,
}

/// Board-level state notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoardEvent {
    /// The board state changed.
    StateChanged {
        /// The new state snapshot.
        snapshot: BoardSnapshot,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

// From implementations for converting inner events to BroadcastEvent
impl From<PlaybackEvent> for BroadcastEvent {
    fn from(event: PlaybackEvent) -> Self {
        BroadcastEvent::Playback(event)
    }
}

impl From<CastEvent> for BroadcastEvent {
    fn from(event: CastEvent) -> Self {
        BroadcastEvent::Cast(event)
    }
}

impl From<CacheEvent> for BroadcastEvent {
    fn from(event: CacheEvent) -> Self {
        BroadcastEvent::Cache(event)
    }
}

impl From<BoardEvent> for BroadcastEvent {
    fn from(event: BoardEvent) -> Self {
        BroadcastEvent::Board(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_event_serializes_to_camel_case() {
        let event = PlaybackEvent::Started {
            asset_id: "Cris".to_string(),
            target: PlaybackTarget::Local,
            timestamp: 42,
        };
        let json = serde_json::to_value(BroadcastEvent::from(event)).unwrap();
        assert_eq!(json["category"], "playback");
        assert_eq!(json["type"], "started");
        assert_eq!(json["assetId"], "Cris");
        assert_eq!(json["target"], "local");
    }

    #[test]
    fn board_snapshot_omits_absent_receiver() {
        let snapshot = BoardSnapshot {
            now_playing: None,
            connection: ConnectionState::Idle,
            receiver_name: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["connection"], "idle");
        assert!(json["nowPlaying"].is_null());
    }
}
