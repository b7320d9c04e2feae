//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete
//! broadcast channels, enabling testing and alternative delivery mechanisms.

use super::{BoardEvent, CacheEvent, CastEvent, PlaybackEvent};

/// Trait for emitting domain events without knowledge of transport.
///
/// Services use this trait to emit events, decoupling them from the
/// specifics of how notifications reach the UI collaborator.
pub trait EventEmitter: Send + Sync {
    /// Emits a playback lifecycle event.
    fn emit_playback(&self, event: PlaybackEvent);

    /// Emits a cast session event.
    fn emit_cast(&self, event: CastEvent);

    /// Emits a cache worker event.
    fn emit_cache(&self, event: CacheEvent);

    /// Emits a board state event.
    fn emit_board(&self, event: BoardEvent);
}

/// No-op emitter for headless use or testing.
///
/// Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_playback(&self, _event: PlaybackEvent) {
        // No-op
    }

    fn emit_cast(&self, _event: CastEvent) {
        // No-op
    }

    fn emit_cache(&self, _event: CacheEvent) {
        // No-op
    }

    fn emit_board(&self, _event: BoardEvent) {
        // No-op
    }
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level. Useful for debugging event flow
/// or in development environments.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_playback(&self, event: PlaybackEvent) {
        tracing::debug!(?event, "playback_event");
    }

    fn emit_cast(&self, event: CastEvent) {
        tracing::debug!(?event, "cast_event");
    }

    fn emit_cache(&self, event: CacheEvent) {
        tracing::debug!(?event, "cache_event");
    }

    fn emit_board(&self, event: BoardEvent) {
        tracing::debug!(?event, "board_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PlaybackTarget;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        playback_count: AtomicUsize,
        cast_count: AtomicUsize,
    }

    impl CountingEventEmitter {
        fn new() -> Self {
            Self {
                playback_count: AtomicUsize::new(0),
                cast_count: AtomicUsize::new(0),
            }
        }
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_playback(&self, _event: PlaybackEvent) {
            self.playback_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_cast(&self, _event: CastEvent) {
            self.cast_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_cache(&self, _event: CacheEvent) {}
        fn emit_board(&self, _event: BoardEvent) {}
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter::new());

        emitter.emit_playback(PlaybackEvent::Started {
            asset_id: "Cris".to_string(),
            target: PlaybackTarget::Local,
            timestamp: 0,
        });
        emitter.emit_playback(PlaybackEvent::Ended {
            asset_id: "Cris".to_string(),
            timestamp: 0,
        });
        emitter.emit_cast(CastEvent::AvailabilityChanged {
            available: true,
            timestamp: 0,
        });

        assert_eq!(emitter.playback_count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.cast_count.load(Ordering::SeqCst), 1);
    }
}
