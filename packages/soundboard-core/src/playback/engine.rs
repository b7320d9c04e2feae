//! The local playback engine.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::catalog::AssetCatalog;
use crate::events::{EventEmitter, PlaybackEvent, PlaybackTarget};
use crate::utils::now_millis;

use super::{AudioBackend, AudioHandle, PlaybackError, PlaybackResult};

/// Plays at most one asset at a time, creating handles lazily.
///
/// [`play`](Self::play) is the only place handles are created, which keeps
/// the at-most-one-handle-per-asset invariant in a single spot. A failed
/// start is retried once, then surfaced as an error event; the engine never
/// panics the caller.
pub struct LocalPlaybackEngine {
    catalog: Arc<AssetCatalog>,
    backend: Arc<dyn AudioBackend>,
    emitter: Arc<dyn EventEmitter>,
    /// asset id -> its one handle, created on first play.
    handles: DashMap<String, Arc<dyn AudioHandle>>,
    /// Asset currently playing locally, if any.
    current: Mutex<Option<String>>,
}

impl LocalPlaybackEngine {
    /// Creates an engine over the given backend.
    pub fn new(
        catalog: Arc<AssetCatalog>,
        backend: Arc<dyn AudioBackend>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            catalog,
            backend,
            emitter,
            handles: DashMap::new(),
            current: Mutex::new(None),
        }
    }

    /// Starts playback of an asset from the beginning.
    ///
    /// Creates the handle on first use and reuses it afterwards. Emits a
    /// start event on success; on failure retries once, then emits an error
    /// event and returns the failure.
    pub async fn play(&self, asset_id: &str) -> PlaybackResult<()> {
        let handle = self.handle_for(asset_id).await?;

        let result = match handle.play_from_start().await {
            Ok(()) => Ok(()),
            Err(first) => {
                log::warn!("[Playback] {asset_id} failed to start, retrying once: {first}");
                handle.play_from_start().await
            }
        };

        match result {
            Ok(()) => {
                *self.current.lock() = Some(asset_id.to_string());
                self.emitter.emit_playback(PlaybackEvent::Started {
                    asset_id: asset_id.to_string(),
                    target: PlaybackTarget::Local,
                    timestamp: now_millis(),
                });
                Ok(())
            }
            Err(err) => {
                log::error!("[Playback] {asset_id} failed to start: {err}");
                self.emitter.emit_playback(PlaybackEvent::Error {
                    asset_id: asset_id.to_string(),
                    message: err.to_string(),
                    timestamp: now_millis(),
                });
                Err(err)
            }
        }
    }

    /// Stops one asset: pause and reset to the beginning.
    ///
    /// Returns whether the asset was actually playing. Emits a stop event
    /// only in that case (no redundant events for idle handles).
    pub fn stop(&self, asset_id: &str) -> bool {
        if let Some(handle) = self.handles.get(asset_id) {
            handle.pause();
            handle.reset();
        }

        let mut current = self.current.lock();
        if current.as_deref() == Some(asset_id) {
            *current = None;
            drop(current);
            self.emitter.emit_playback(PlaybackEvent::Stopped {
                asset_id: asset_id.to_string(),
                timestamp: now_millis(),
            });
            true
        } else {
            false
        }
    }

    /// Stops every handle, emitting a stop event for the one that was playing.
    pub fn stop_all(&self) {
        for entry in self.handles.iter() {
            if entry.value().is_playing() {
                entry.value().pause();
            }
            entry.value().reset();
        }
        if let Some(asset_id) = self.current.lock().take() {
            self.emitter.emit_playback(PlaybackEvent::Stopped {
                asset_id,
                timestamp: now_millis(),
            });
        }
    }

    /// Records a natural end-of-track reported by the platform adapter.
    ///
    /// Returns whether the asset was the one playing; a late or duplicate
    /// signal is ignored.
    pub fn mark_ended(&self, asset_id: &str) -> bool {
        let mut current = self.current.lock();
        if current.as_deref() == Some(asset_id) {
            *current = None;
            drop(current);
            self.emitter.emit_playback(PlaybackEvent::Ended {
                asset_id: asset_id.to_string(),
                timestamp: now_millis(),
            });
            true
        } else {
            false
        }
    }

    /// Returns the asset currently playing locally, if any.
    #[must_use]
    pub fn now_playing(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Returns the existing handle for an asset, creating it lazily.
    async fn handle_for(&self, asset_id: &str) -> PlaybackResult<Arc<dyn AudioHandle>> {
        if let Some(handle) = self.handles.get(asset_id) {
            return Ok(handle.value().clone());
        }

        let asset = self
            .catalog
            .get(asset_id)
            .ok_or_else(|| PlaybackError::StartFailed {
                asset_id: asset_id.to_string(),
                reason: "not in the asset catalog".to_string(),
            })?;
        log::debug!("[Playback] Creating handle for {asset_id} on demand");
        let handle = self.backend.create_handle(asset).await?;

        // A concurrent creation keeps the first inserted handle.
        Ok(self
            .handles
            .entry(asset_id.to_string())
            .or_insert(handle)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetCatalog;
    use crate::events::NoopEventEmitter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeHandle {
        playing: AtomicBool,
        /// Number of times play must fail before succeeding.
        failures_left: AtomicUsize,
        play_calls: AtomicUsize,
    }

    impl FakeHandle {
        fn new(failures: usize) -> Self {
            Self {
                playing: AtomicBool::new(false),
                failures_left: AtomicUsize::new(failures),
                play_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AudioHandle for FakeHandle {
        async fn play_from_start(&self) -> PlaybackResult<()> {
            self.play_calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(PlaybackError::Backend("decode error".to_string()));
            }
            self.playing.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn pause(&self) {
            self.playing.store(false, Ordering::SeqCst);
        }

        fn reset(&self) {}

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }
    }

    struct FakeBackend {
        create_calls: AtomicUsize,
        failures_per_handle: usize,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
                failures_per_handle: 0,
            }
        }

        fn failing(failures: usize) -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
                failures_per_handle: failures,
            }
        }
    }

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn create_handle(
            &self,
            _asset: &crate::catalog::AssetDescriptor,
        ) -> PlaybackResult<Arc<dyn AudioHandle>> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakeHandle::new(self.failures_per_handle)))
        }
    }

    fn engine_with(backend: Arc<FakeBackend>) -> LocalPlaybackEngine {
        let catalog =
            Arc::new(AssetCatalog::from_filenames(["Cris.mp3", "Ivan.mp3"]).unwrap());
        LocalPlaybackEngine::new(catalog, backend, Arc::new(NoopEventEmitter))
    }

    #[tokio::test]
    async fn play_creates_handle_lazily_and_reuses_it() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend.clone());

        engine.play("Cris").await.unwrap();
        engine.stop("Cris");
        engine.play("Cris").await.unwrap();

        // Same underlying handle both times.
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_assets_get_distinct_handles() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend.clone());

        engine.play("Cris").await.unwrap();
        engine.play("Ivan").await.unwrap();

        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_asset_fails_without_creating_a_handle() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend.clone());

        let err = engine.play("Josefina").await.unwrap_err();
        assert!(matches!(err, PlaybackError::StartFailed { .. }));
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn start_failure_is_retried_exactly_once() {
        // First attempt fails, retry succeeds.
        let backend = Arc::new(FakeBackend::failing(1));
        let engine = engine_with(backend);

        engine.play("Cris").await.unwrap();
        assert_eq!(engine.now_playing().as_deref(), Some("Cris"));
    }

    #[tokio::test]
    async fn persistent_start_failure_is_surfaced_after_one_retry() {
        let backend = Arc::new(FakeBackend::failing(2));
        let engine = engine_with(backend);

        assert!(engine.play("Cris").await.is_err());
        assert_eq!(engine.now_playing(), None);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend);

        engine.play("Cris").await.unwrap();
        assert!(engine.stop("Cris"));
        // Second stop reports nothing was playing.
        assert!(!engine.stop("Cris"));
        // Stopping an asset that never played is a no-op.
        assert!(!engine.stop("Ivan"));
    }

    #[tokio::test]
    async fn mark_ended_clears_current_once() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend);

        engine.play("Cris").await.unwrap();
        assert!(engine.mark_ended("Cris"));
        assert!(!engine.mark_ended("Cris"));
        assert_eq!(engine.now_playing(), None);
    }

    #[tokio::test]
    async fn mark_ended_ignores_non_current_asset() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend);

        engine.play("Cris").await.unwrap();
        assert!(!engine.mark_ended("Ivan"));
        assert_eq!(engine.now_playing().as_deref(), Some("Cris"));
    }

    #[tokio::test]
    async fn stop_all_stops_the_playing_handle() {
        let backend = Arc::new(FakeBackend::new());
        let engine = engine_with(backend);

        engine.play("Cris").await.unwrap();
        engine.stop_all();
        assert_eq!(engine.now_playing(), None);
    }
}
