//! Playback coordination across the local engine and the cast session.
//!
//! The coordinator owns the single playback slot: at most one asset is
//! considered playing at a time, locally or remotely. Requests toggle
//! (pressing the playing asset stops it) and preempt (pressing another asset
//! stops the current one first). Routing is automatic: remote when a cast
//! session is connected, local otherwise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cast::{CastSessionManager, SessionOutcome};
use crate::catalog::AssetCatalog;
use crate::config::CastConfig;
use crate::context::AppContext;
use crate::error::{SoundboardError, SoundboardResult};
use crate::events::{BoardEvent, BoardSnapshot, EventEmitter, PlaybackEvent, PlaybackTarget};
use crate::playback::LocalPlaybackEngine;
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::utils::now_millis;

/// The occupied playback slot.
///
/// The ticket makes slot clearance exact: the estimated-duration timer for a
/// remote clip only clears the slot if its ticket still matches, so a timer
/// from a superseded playback can never clobber a newer one.
#[derive(Debug, Clone)]
struct SlotEntry {
    asset_id: String,
    target: PlaybackTarget,
    ticket: Uuid,
}

/// Routes playback requests and maintains the board state.
///
/// All slot transitions go through the async mutex, which serializes
/// concurrent requests; the board event stream therefore never shows two
/// assets playing at once.
pub struct PlaybackCoordinator {
    catalog: Arc<AssetCatalog>,
    engine: Arc<LocalPlaybackEngine>,
    cast: Arc<CastSessionManager>,
    ctx: AppContext,
    config: CastConfig,
    emitter: Arc<dyn EventEmitter>,
    spawner: TokioSpawner,
    slot: Mutex<Option<SlotEntry>>,
    /// Guards against a second device-picker while one is already open.
    connect_in_flight: AtomicBool,
}

impl PlaybackCoordinator {
    /// Creates a coordinator over the given engine and cast session.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<AssetCatalog>,
        engine: Arc<LocalPlaybackEngine>,
        cast: Arc<CastSessionManager>,
        ctx: AppContext,
        config: CastConfig,
        emitter: Arc<dyn EventEmitter>,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            catalog,
            engine,
            cast,
            ctx,
            config,
            emitter,
            spawner,
            slot: Mutex::new(None),
            connect_in_flight: AtomicBool::new(false),
        }
    }

    /// Handles a press on an asset button.
    ///
    /// Pressing the asset that occupies the slot stops it. Pressing another
    /// asset stops the current one, then starts the new one, routed to the
    /// receiver when a session is connected and to the local engine
    /// otherwise.
    pub async fn request_play(self: &Arc<Self>, asset_id: &str) -> SoundboardResult<()> {
        if !self.catalog.contains(asset_id) {
            return Err(SoundboardError::UnknownAsset(asset_id.to_string()));
        }

        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.clone() {
            // Clearing the slot first invalidates the entry's ticket, so a
            // pending remote timer becomes a no-op.
            *slot = None;
            match entry.target {
                PlaybackTarget::Local => {
                    self.engine.stop(&entry.asset_id);
                }
                PlaybackTarget::Remote => {
                    // The capability set has no media-level stop; the
                    // receiver plays the short clip out on its own.
                    self.emitter.emit_playback(PlaybackEvent::Stopped {
                        asset_id: entry.asset_id.clone(),
                        timestamp: now_millis(),
                    });
                }
            }
            if entry.asset_id == asset_id {
                // Toggle off.
                self.publish_board(&slot);
                return Ok(());
            }
        }

        if self.cast.is_connected() {
            self.play_remote(&mut slot, asset_id).await
        } else {
            self.play_local(&mut slot, asset_id).await
        }
    }

    /// Opens the device picker, unless no receivers exist or a request is
    /// already in flight (both are quiet no-ops, returning `None`).
    pub async fn request_remote_connect(&self) -> Option<SessionOutcome> {
        if !self.cast.devices_available() {
            log::info!("[Coordinator] Connect requested with no receivers available");
            return None;
        }
        if self.connect_in_flight.swap(true, Ordering::SeqCst) {
            log::debug!("[Coordinator] Connect already in flight, ignoring");
            return None;
        }
        let outcome = self.cast.start_casting().await;
        self.connect_in_flight.store(false, Ordering::SeqCst);

        let slot = self.slot.lock().await;
        self.publish_board(&slot);
        Some(outcome)
    }

    /// Ends the cast session. Any remotely playing asset leaves the slot,
    /// since the receiver stops with the session.
    pub async fn request_remote_disconnect(&self) {
        if !self.cast.is_connected() {
            return;
        }
        self.cast.stop_casting().await;

        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.clone() {
            if entry.target == PlaybackTarget::Remote {
                *slot = None;
                self.emitter.emit_playback(PlaybackEvent::Stopped {
                    asset_id: entry.asset_id,
                    timestamp: now_millis(),
                });
            }
        }
        self.publish_board(&slot);
    }

    /// Records a natural local end-of-track reported by the platform
    /// adapter. Frees the slot if that asset occupied it.
    pub async fn notify_local_ended(&self, asset_id: &str) {
        if !self.engine.mark_ended(asset_id) {
            return;
        }
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if entry.target == PlaybackTarget::Local && entry.asset_id == asset_id {
                *slot = None;
            }
        }
        self.publish_board(&slot);
    }

    /// Current board snapshot.
    pub async fn board_state(&self) -> BoardSnapshot {
        let slot = self.slot.lock().await;
        self.snapshot(&slot)
    }

    async fn play_local(
        self: &Arc<Self>,
        slot: &mut Option<SlotEntry>,
        asset_id: &str,
    ) -> SoundboardResult<()> {
        // The engine emits the playback events for the local path.
        match self.engine.play(asset_id).await {
            Ok(()) => {
                *slot = Some(SlotEntry {
                    asset_id: asset_id.to_string(),
                    target: PlaybackTarget::Local,
                    ticket: Uuid::new_v4(),
                });
                self.publish_board(slot);
                Ok(())
            }
            Err(err) => {
                self.publish_board(slot);
                Err(err.into())
            }
        }
    }

    async fn play_remote(
        self: &Arc<Self>,
        slot: &mut Option<SlotEntry>,
        asset_id: &str,
    ) -> SoundboardResult<()> {
        // The catalog hit was checked by the caller.
        let filename = self
            .catalog
            .get(asset_id)
            .map(|asset| asset.resource_path.clone())
            .ok_or_else(|| SoundboardError::UnknownAsset(asset_id.to_string()))?;
        let url = self.ctx.audio_url(&filename);

        if !self.cast.play_on_receiver(&url, asset_id).await {
            self.emitter.emit_playback(PlaybackEvent::Error {
                asset_id: asset_id.to_string(),
                message: "remote playback failed".to_string(),
                timestamp: now_millis(),
            });
            self.publish_board(slot);
            return Err(SoundboardError::SessionTransport(format!(
                "media handoff for {asset_id} failed"
            )));
        }

        let ticket = Uuid::new_v4();
        *slot = Some(SlotEntry {
            asset_id: asset_id.to_string(),
            target: PlaybackTarget::Remote,
            ticket,
        });
        self.emitter.emit_playback(PlaybackEvent::Started {
            asset_id: asset_id.to_string(),
            target: PlaybackTarget::Remote,
            timestamp: now_millis(),
        });
        self.publish_board(slot);
        self.spawn_slot_clearance(asset_id.to_string(), ticket);
        Ok(())
    }

    /// Receivers report nothing back about playback progress, so a fixed
    /// estimate stands in for end-of-track. The ticket check makes a stale
    /// timer harmless.
    fn spawn_slot_clearance(self: &Arc<Self>, asset_id: String, ticket: Uuid) {
        let coordinator = Arc::clone(self);
        let delay = Duration::from_secs(self.config.estimated_clip_duration_secs);
        self.spawner.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = coordinator.slot.lock().await;
            let still_current = slot
                .as_ref()
                .is_some_and(|entry| entry.ticket == ticket);
            if !still_current {
                return;
            }
            *slot = None;
            coordinator.emitter.emit_playback(PlaybackEvent::Ended {
                asset_id,
                timestamp: now_millis(),
            });
            coordinator.publish_board(&slot);
        });
    }

    fn snapshot(&self, slot: &Option<SlotEntry>) -> BoardSnapshot {
        BoardSnapshot {
            now_playing: slot.as_ref().map(|entry| entry.asset_id.clone()),
            connection: self.cast.connection_state(),
            receiver_name: self.cast.receiver_name(),
        }
    }

    fn publish_board(&self, slot: &Option<SlotEntry>) {
        self.emitter.emit_board(BoardEvent::StateChanged {
            snapshot: self.snapshot(slot),
            timestamp: now_millis(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::{
        CastOptions, CastResult, CastTransport, ConnectionState, MediaLoadRequest, RemoteSession,
        TransportCapability, TransportEvent,
    };
    use crate::events::{CacheEvent, CastEvent, NoopEventEmitter};
    use crate::playback::{AudioBackend, AudioHandle, PlaybackResult};
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::broadcast;

    // ─── Fakes ───────────────────────────────────────────────────────────

    struct FakeHandle {
        playing: AtomicBool,
    }

    #[async_trait]
    impl AudioHandle for FakeHandle {
        async fn play_from_start(&self) -> PlaybackResult<()> {
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

    struct FakeBackend;

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn create_handle(
            &self,
            _asset: &crate::catalog::AssetDescriptor,
        ) -> PlaybackResult<Arc<dyn AudioHandle>> {
            Ok(Arc::new(FakeHandle {
                playing: AtomicBool::new(false),
            }))
        }
    }

    struct StubTransport {
        available: bool,
        load_requests: SyncMutex<Vec<MediaLoadRequest>>,
        load_fails: AtomicBool,
        request_calls: AtomicUsize,
        end_calls: AtomicUsize,
        session: SyncMutex<Option<RemoteSession>>,
        tx: broadcast::Sender<TransportEvent>,
    }

    impl StubTransport {
        fn new(available: bool) -> Self {
            Self {
                available,
                load_requests: SyncMutex::new(Vec::new()),
                load_fails: AtomicBool::new(false),
                request_calls: AtomicUsize::new(0),
                end_calls: AtomicUsize::new(0),
                session: SyncMutex::new(None),
                tx: broadcast::channel(16).0,
            }
        }
    }

    #[async_trait]
    impl CastTransport for StubTransport {
        fn detect_capability(&self) -> TransportCapability {
            TransportCapability::Capable
        }

        async fn wait_ready(&self) -> bool {
            true
        }

        fn configure(&self, _options: &CastOptions) -> CastResult<()> {
            Ok(())
        }

        fn receiver_availability(&self) -> bool {
            self.available
        }

        async fn request_session(&self) -> SessionOutcome {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            let session = RemoteSession {
                session_id: "s-1".to_string(),
                receiver_name: "Living room".to_string(),
                application_id: "CC1AD845".to_string(),
            };
            *self.session.lock() = Some(session.clone());
            SessionOutcome::Established(session)
        }

        fn current_session(&self) -> Option<RemoteSession> {
            self.session.lock().clone()
        }

        async fn end_session(&self, _stop_receiver_playback: bool) {
            self.end_calls.fetch_add(1, Ordering::SeqCst);
            *self.session.lock() = None;
        }

        async fn load_media(
            &self,
            _session: &RemoteSession,
            request: &MediaLoadRequest,
        ) -> CastResult<()> {
            if self.load_fails.load(Ordering::SeqCst) {
                return Err(crate::cast::CastError::Transport("rejected".to_string()));
            }
            self.load_requests.lock().push(request.clone());
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
            self.tx.subscribe()
        }
    }

    /// Records playback events in order for assertions.
    struct RecordingEmitter {
        playback: SyncMutex<Vec<PlaybackEvent>>,
    }

    impl RecordingEmitter {
        fn new() -> Self {
            Self {
                playback: SyncMutex::new(Vec::new()),
            }
        }

        fn playback_kinds(&self) -> Vec<&'static str> {
            self.playback
                .lock()
                .iter()
                .map(|event| match event {
                    PlaybackEvent::Started { .. } => "started",
                    PlaybackEvent::Ended { .. } => "ended",
                    PlaybackEvent::Stopped { .. } => "stopped",
                    PlaybackEvent::Error { .. } => "error",
                })
                .collect()
        }
    }

    impl EventEmitter for RecordingEmitter {
        fn emit_playback(&self, event: PlaybackEvent) {
            self.playback.lock().push(event);
        }

        fn emit_cast(&self, _event: CastEvent) {}
        fn emit_cache(&self, _event: CacheEvent) {}
        fn emit_board(&self, _event: BoardEvent) {}
    }

    struct Harness {
        coordinator: Arc<PlaybackCoordinator>,
        transport: Arc<StubTransport>,
        emitter: Arc<RecordingEmitter>,
    }

    async fn harness(connect: bool) -> Harness {
        harness_over(Arc::new(StubTransport::new(true)), connect).await
    }

    async fn harness_over(transport: Arc<StubTransport>, connect: bool) -> Harness {
        let emitter = Arc::new(RecordingEmitter::new());
        let ctx = AppContext::new("https://board.example");
        let catalog = Arc::new(
            AssetCatalog::from_filenames(["Cris.mp3", "Ivan.mp3", "Rita.mp3"]).unwrap(),
        );
        let dyn_emitter: Arc<dyn EventEmitter> = emitter.clone();
        let engine = Arc::new(LocalPlaybackEngine::new(
            catalog.clone(),
            Arc::new(FakeBackend),
            dyn_emitter.clone(),
        ));
        let cast = Arc::new(CastSessionManager::new(
            transport.clone(),
            ctx.clone(),
            CastConfig::default(),
            Arc::new(NoopEventEmitter),
            TokioSpawner::current(),
        ));
        cast.initialize().await;
        if connect {
            cast.start_casting().await;
        }
        let coordinator = Arc::new(PlaybackCoordinator::new(
            catalog,
            engine,
            cast,
            ctx,
            CastConfig::default(),
            dyn_emitter,
            TokioSpawner::current(),
        ));
        Harness {
            coordinator,
            transport,
            emitter,
        }
    }

    // ─── Routing and the single slot ─────────────────────────────────────

    #[tokio::test]
    async fn local_play_occupies_the_slot() {
        let h = harness(false).await;

        h.coordinator.request_play("Cris").await.unwrap();
        let board = h.coordinator.board_state().await;
        assert_eq!(board.now_playing.as_deref(), Some("Cris"));
        assert_eq!(board.connection, ConnectionState::Idle);
    }

    #[tokio::test]
    async fn pressing_the_playing_asset_toggles_it_off() {
        let h = harness(false).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.request_play("Cris").await.unwrap();

        let board = h.coordinator.board_state().await;
        assert_eq!(board.now_playing, None);
        assert_eq!(h.emitter.playback_kinds(), ["started", "stopped"]);
    }

    #[tokio::test]
    async fn pressing_another_asset_preempts_the_current_one() {
        let h = harness(false).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.request_play("Ivan").await.unwrap();

        let board = h.coordinator.board_state().await;
        assert_eq!(board.now_playing.as_deref(), Some("Ivan"));
        assert_eq!(h.emitter.playback_kinds(), ["started", "stopped", "started"]);
    }

    #[tokio::test]
    async fn unknown_asset_is_rejected_before_touching_the_slot() {
        let h = harness(false).await;

        let err = h.coordinator.request_play("Josefina").await.unwrap_err();
        assert!(matches!(err, SoundboardError::UnknownAsset(_)));
        assert_eq!(h.coordinator.board_state().await.now_playing, None);
    }

    #[tokio::test]
    async fn connected_session_routes_playback_to_the_receiver() {
        let h = harness(true).await;

        h.coordinator.request_play("Cris").await.unwrap();

        let requests = h.transport.load_requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].content_url,
            "https://board.example/sound/Cris.mp3"
        );
        drop(requests);
        let board = h.coordinator.board_state().await;
        assert_eq!(board.now_playing.as_deref(), Some("Cris"));
        assert_eq!(board.connection, ConnectionState::Connected);
        assert_eq!(board.receiver_name.as_deref(), Some("Living room"));
    }

    #[tokio::test]
    async fn failed_remote_handoff_leaves_the_slot_empty() {
        let h = harness(true).await;
        h.transport.load_fails.store(true, Ordering::SeqCst);

        assert!(h.coordinator.request_play("Cris").await.is_err());
        assert_eq!(h.coordinator.board_state().await.now_playing, None);
        // One playback error for the attempt, nothing else.
        assert_eq!(h.emitter.playback_kinds(), ["error"]);
    }

    // ─── Estimated-duration slot clearance ───────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn remote_slot_clears_after_the_estimated_duration() {
        let h = harness(true).await;

        h.coordinator.request_play("Cris").await.unwrap();
        assert_eq!(
            h.coordinator.board_state().await.now_playing.as_deref(),
            Some("Cris")
        );

        // Let the spawned clearance task register its timer before the
        // paused clock moves.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(h.coordinator.board_state().await.now_playing, None);
        assert_eq!(h.emitter.playback_kinds(), ["started", "ended"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_clearance_timer_never_clobbers_a_newer_playback() {
        let h = harness(true).await;

        h.coordinator.request_play("Cris").await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        // Replace the remote playback before the first timer fires.
        h.coordinator.request_play("Ivan").await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        // The first timer fired against a retired ticket; Ivan still plays.
        assert_eq!(
            h.coordinator.board_state().await.now_playing.as_deref(),
            Some("Ivan")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn toggled_off_remote_clip_emits_no_late_ended_event() {
        let h = harness(true).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.request_play("Cris").await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(h.emitter.playback_kinds(), ["started", "stopped"]);
    }

    // ─── Local end-of-track ──────────────────────────────────────────────

    #[tokio::test]
    async fn natural_local_end_frees_the_slot() {
        let h = harness(false).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.notify_local_ended("Cris").await;

        assert_eq!(h.coordinator.board_state().await.now_playing, None);
        assert_eq!(h.emitter.playback_kinds(), ["started", "ended"]);
    }

    #[tokio::test]
    async fn stale_local_end_signal_is_ignored() {
        let h = harness(false).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.notify_local_ended("Ivan").await;

        assert_eq!(
            h.coordinator.board_state().await.now_playing.as_deref(),
            Some("Cris")
        );
    }

    // ─── Remote connect / disconnect ─────────────────────────────────────

    #[tokio::test]
    async fn connect_without_receivers_is_a_quiet_no_op() {
        let h = harness_over(Arc::new(StubTransport::new(false)), false).await;

        assert!(h.coordinator.request_remote_connect().await.is_none());
        assert_eq!(h.transport.request_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disconnect_stops_the_session_and_clears_a_remote_slot() {
        let h = harness(true).await;

        h.coordinator.request_play("Cris").await.unwrap();
        h.coordinator.request_remote_disconnect().await;

        assert_eq!(h.transport.end_calls.load(Ordering::SeqCst), 1);
        let board = h.coordinator.board_state().await;
        assert_eq!(board.now_playing, None);
        assert_eq!(board.connection, ConnectionState::Idle);
    }

    #[tokio::test]
    async fn disconnect_without_a_session_is_a_no_op() {
        let h = harness(false).await;

        h.coordinator.request_remote_disconnect().await;
        assert_eq!(h.transport.end_calls.load(Ordering::SeqCst), 0);
    }
}
