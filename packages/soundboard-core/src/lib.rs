//! Soundboard Core - shared library for the offline-first soundboard.
//!
//! This crate provides the core functionality for a one-tap soundboard that
//! works offline and can hand playback off to a cast receiver on the local
//! network. It is designed to be embedded by a platform shell (web worker
//! bridge or desktop app) that supplies the two platform adapters.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`events`]: Event system for notifying the UI collaborator
//! - [`context`]: Origin context, secure-context checks, and URL building
//! - [`config`]: Cache and cast configuration
//! - [`catalog`]: The static asset catalog
//! - [`cache`]: Offline asset caching (install / activate / fetch policies)
//! - [`playback`]: Local playback engine
//! - [`cast`]: Remote playback session management
//! - [`coordinator`]: Playback routing and the single playback slot
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from
//! platform-specific implementations:
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//! - [`CacheStorage`](cache::CacheStorage) / [`NetworkFetcher`](cache::NetworkFetcher):
//!   Cache partitions and the network behind them
//! - [`AudioBackend`](playback::AudioBackend) / [`AudioHandle`](playback::AudioHandle):
//!   Platform audio playback
//! - [`CastTransport`](cast::CastTransport): The vendor cast runtime
//!
//! Default implementations suitable for headless use ship with the crate;
//! the platform shell provides the real audio and cast adapters.

#![warn(clippy::all)]

pub mod bootstrap;
pub mod cache;
pub mod cast;
pub mod catalog;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod playback;
pub mod runtime;
pub mod utils;

// Re-export commonly used types at the crate root
pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use cache::{
    CacheError, CacheResult, CacheStorage, CacheWorker, FetchRequest, HttpFetcher,
    MemoryCacheStorage, NetworkFetcher, RequestDestination, ResponseKind, StoredResponse,
};
pub use cast::{
    CastError, CastPhase, CastResult, CastSessionManager, CastTransport, ConnectionState,
    RemoteSession, SessionOutcome, TransportCapability,
};
pub use catalog::{AssetCatalog, AssetDescriptor, CatalogError};
pub use config::{CacheConfig, CastConfig, Config};
pub use context::AppContext;
pub use coordinator::PlaybackCoordinator;
pub use error::{ErrorCode, SoundboardError, SoundboardResult};
pub use events::{
    BoardEvent, BoardSnapshot, BroadcastEvent, BroadcastEventBridge, CacheEvent, CastEvent,
    EventEmitter, LoggingEventEmitter, NoopEventEmitter, PlaybackEvent, PlaybackTarget,
};
pub use playback::{AudioBackend, AudioHandle, LocalPlaybackEngine, PlaybackError, PlaybackResult};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use utils::now_millis;
