//! Bridge implementation that maps domain events to broadcast transport.
//!
//! The [`BroadcastEventBridge`] lives at the boundary between domain services
//! and the UI collaborator, mapping typed domain events onto a broadcast
//! channel that any number of observers can subscribe to.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::emitter::EventEmitter;
use super::{BoardEvent, BroadcastEvent, CacheEvent, CastEvent, PlaybackEvent};

/// Bridges domain events to a broadcast channel.
///
/// This adapter implements [`EventEmitter`] by forwarding events to
/// a `tokio::sync::broadcast` channel that observers subscribe to.
///
/// For platform-specific delivery (e.g., a DOM notification layer), the
/// bridge also forwards to an optional external emitter that can be set
/// after construction.
///
/// # Thread Safety
///
/// The bridge is `Send + Sync` and can be shared across async tasks.
/// The external emitter uses `RwLock` to allow setting it after construction.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<BroadcastEvent>,
    /// Optional external emitter for platform-specific event delivery
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter for platform-specific event delivery.
    ///
    /// Can be called after construction, which is useful when the platform
    /// handle isn't available until later.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    /// Returns the event feed as a stream, for observers that prefer
    /// `futures::Stream` over polling a receiver.
    pub fn subscribe_stream(&self) -> BroadcastStream<BroadcastEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }

    /// Returns a reference to the broadcast sender.
    pub fn sender(&self) -> &broadcast::Sender<BroadcastEvent> {
        &self.tx
    }
}

/// Generates an [`EventEmitter`] method that forwards to the external emitter
/// (if set) and then sends to the broadcast channel.
macro_rules! impl_emit {
    ($method:ident, $event_ty:ty, $variant:ident) => {
        fn $method(&self, event: $event_ty) {
            if let Some(ref emitter) = *self.external_emitter.read() {
                emitter.$method(event.clone());
            }
            if let Err(e) = self.tx.send(BroadcastEvent::$variant(event)) {
                log::trace!("[EventBridge] No broadcast receivers: {}", e);
            }
        }
    };
}

impl EventEmitter for BroadcastEventBridge {
    impl_emit!(emit_playback, PlaybackEvent, Playback);
    impl_emit!(emit_cast, CastEvent, Cast);
    impl_emit!(emit_cache, CacheEvent, Cache);
    impl_emit!(emit_board, BoardEvent, Board);
}
