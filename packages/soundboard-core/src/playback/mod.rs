//! Local playback engine.
//!
//! Plays at most one asset at a time from local storage, lazily
//! materializing one playback handle per asset id. The platform audio
//! implementation sits behind the [`AudioBackend`] / [`AudioHandle`] seam.

mod backend;
mod engine;

pub use backend::{AudioBackend, AudioHandle};
pub use engine::LocalPlaybackEngine;

use thiserror::Error;

/// Errors from local playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Playback failed to start (decode error, user-gesture requirement,
    /// missing asset).
    #[error("Playback of {asset_id} failed to start: {reason}")]
    StartFailed {
        /// The asset that failed.
        asset_id: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The audio backend itself failed.
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Convenient Result alias for playback operations.
pub type PlaybackResult<T> = Result<T, PlaybackError>;
