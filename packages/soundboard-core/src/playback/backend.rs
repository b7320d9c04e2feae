//! Platform audio seam.
//!
//! The engine never touches a platform audio API directly; it asks an
//! [`AudioBackend`] for handles and drives them through [`AudioHandle`].
//! Natural end-of-track is reported the other way around: the platform
//! adapter calls [`LocalPlaybackEngine::mark_ended`] when its "ended"
//! signal fires.
//!
//! [`LocalPlaybackEngine::mark_ended`]: super::LocalPlaybackEngine::mark_ended

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::AssetDescriptor;

use super::PlaybackResult;

/// Factory for playback handles.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Creates a playback handle bound to the asset's resource path.
    ///
    /// Called at most once per asset id for the lifetime of the engine;
    /// the engine caches and reuses the returned handle.
    async fn create_handle(&self, asset: &AssetDescriptor) -> PlaybackResult<Arc<dyn AudioHandle>>;
}

/// One loaded, playable asset.
#[async_trait]
pub trait AudioHandle: Send + Sync {
    /// Resets the position to the start and begins playback.
    ///
    /// Resolves once the platform confirms playback began.
    async fn play_from_start(&self) -> PlaybackResult<()>;

    /// Pauses playback, keeping the current position.
    fn pause(&self);

    /// Resets the position to the start.
    fn reset(&self);

    /// Whether the handle is currently playing.
    fn is_playing(&self) -> bool;
}
