//! Centralized error types for the soundboard core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to machine-readable codes for the UI collaborator
//! - Converts module-level errors into the application-wide type

use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;
use crate::cast::CastError;
use crate::playback::PlaybackError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for notifications.
    fn code(&self) -> &'static str;
}

impl ErrorCode for CacheError {
    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "cache_write_failed",
            Self::Install { .. } => "install_failed",
            Self::NetworkFetch(_) => "network_fetch_failed",
        }
    }
}

impl ErrorCode for CastError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "receiver_unavailable",
            Self::NotConnected => "no_active_session",
            Self::InvalidMediaUrl(_) => "invalid_media_url",
            Self::Transport(_) => "session_transport_failed",
        }
    }
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> &'static str {
        match self {
            Self::StartFailed { .. } => "asset_unavailable",
            Self::Backend(_) => "audio_backend_failed",
        }
    }
}

/// Application-wide error type for the soundboard core.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SoundboardError {
    /// The requested asset id is not in the catalog.
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Local playback failed to start (decode/permission/gesture policy).
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// No remote receivers discoverable.
    #[error("No cast receivers available")]
    ReceiverUnavailable,

    /// Session request or media load failed for a reason other than cancellation.
    #[error("Cast session failed: {0}")]
    SessionTransport(String),

    /// Storing a fetched resource into a cache partition failed.
    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    /// A network fetch failed with no cached fallback.
    #[error("Network fetch failed: {0}")]
    NetworkFetch(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid or missing settings).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SoundboardError {
    /// Returns a machine-readable error code for notifications.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAsset(_) => "unknown_asset",
            Self::AssetUnavailable(_) => "asset_unavailable",
            Self::ReceiverUnavailable => "receiver_unavailable",
            Self::SessionTransport(_) => "session_transport_failed",
            Self::CacheWrite(_) => "cache_write_failed",
            Self::NetworkFetch(_) => "network_fetch_failed",
            Self::Internal(_) => "internal_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type SoundboardResult<T> = Result<T, SoundboardError>;

impl From<CacheError> for SoundboardError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Storage(msg) => Self::CacheWrite(msg),
            CacheError::NetworkFetch(msg) => Self::NetworkFetch(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CastError> for SoundboardError {
    fn from(err: CastError) -> Self {
        match err {
            CastError::Unavailable(_) => Self::ReceiverUnavailable,
            other => Self::SessionTransport(other.to_string()),
        }
    }
}

impl From<PlaybackError> for SoundboardError {
    fn from(err: PlaybackError) -> Self {
        Self::AssetUnavailable(err.to_string())
    }
}
