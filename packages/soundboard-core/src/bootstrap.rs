//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together. The platform supplies the
//! two adapters it alone can provide (the cast transport and the audio
//! backend); everything else is assembled here in dependency order.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::broadcast;

use crate::cache::{CacheWorker, HttpFetcher, MemoryCacheStorage};
use crate::cast::{CastPhase, CastSessionManager, CastTransport};
use crate::catalog::AssetCatalog;
use crate::config::Config;
use crate::context::AppContext;
use crate::coordinator::PlaybackCoordinator;
use crate::error::{SoundboardError, SoundboardResult};
use crate::events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
use crate::playback::{AudioBackend, LocalPlaybackEngine};
use crate::runtime::TokioSpawner;

/// Timeout for shell and audio fetches issued by the cache worker.
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Container for all bootstrapped services.
///
/// Holds the wired services created during bootstrap. The platform layer
/// keeps this alive for the lifetime of the app.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// The static asset catalog.
    pub catalog: Arc<AssetCatalog>,
    /// Offline cache worker.
    pub cache_worker: Arc<CacheWorker>,
    /// Local playback engine.
    pub engine: Arc<LocalPlaybackEngine>,
    /// Remote playback session manager.
    pub cast: Arc<CastSessionManager>,
    /// Playback coordinator routing between the two.
    pub coordinator: Arc<PlaybackCoordinator>,
    /// Event bridge for delivering events to observers.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Origin context the app runs under.
    pub ctx: AppContext,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
    /// Shared HTTP client for connection pooling.
    http_client: Client,
}

impl BootstrappedServices {
    /// Returns the shared HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Subscribes to the application event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.event_bridge.subscribe()
    }

    /// Runs the startup sequence: cache install/activate, then cast
    /// initialization.
    ///
    /// Cast unavailability is a degraded mode, not a startup failure; only
    /// a cache lifecycle error aborts startup.
    pub async fn start(&self) -> SoundboardResult<()> {
        let purged = self.cache_worker.run_lifecycle().await?;
        if !purged.is_empty() {
            log::info!("[Bootstrap] Purged stale cache generations: {purged:?}");
        }

        match self.cast.initialize().await {
            CastPhase::Ready => {}
            CastPhase::Unavailable(reason) => {
                log::warn!("[Bootstrap] Continuing without cast: {reason}");
            }
            phase => {
                log::warn!("[Bootstrap] Unexpected cast phase after init: {phase:?}");
            }
        }

        log::info!("[Bootstrap] Startup complete");
        Ok(())
    }
}

/// Creates the shared HTTP client used by the cache worker.
fn create_http_client() -> SoundboardResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| SoundboardError::Internal(format!("Failed to create HTTP client: {e}")))
}

/// Bootstraps all application services with their dependencies.
///
/// The wiring order matters - services are created in dependency order:
///
/// 1. Shared infrastructure (HTTP client, event bridge, task spawner)
/// 2. Cache worker (storage + fetcher + config)
/// 3. Local playback engine (catalog + platform audio backend)
/// 4. Cast session manager (platform transport)
/// 5. Playback coordinator (engine + cast)
///
/// Nothing asynchronous runs yet; call [`BootstrappedServices::start`] to
/// run the startup sequence.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be built.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime context.
pub fn bootstrap_services(
    config: &Config,
    ctx: AppContext,
    catalog: AssetCatalog,
    transport: Arc<dyn CastTransport>,
    backend: Arc<dyn AudioBackend>,
) -> SoundboardResult<BootstrappedServices> {
    config
        .validate()
        .map_err(SoundboardError::Configuration)?;

    let spawner = TokioSpawner::current();
    let http_client = create_http_client()?;
    let event_bridge = Arc::new(BroadcastEventBridge::new(config.event_channel_capacity));
    let catalog = Arc::new(catalog);

    let cache_worker = Arc::new(CacheWorker::new(
        MemoryCacheStorage::arc(),
        Arc::new(HttpFetcher::new(http_client.clone(), ctx.clone())),
        config.cache.clone(),
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
    ));

    let engine = Arc::new(LocalPlaybackEngine::new(
        Arc::clone(&catalog),
        backend,
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
    ));

    let cast = Arc::new(CastSessionManager::new(
        transport,
        ctx.clone(),
        config.cast.clone(),
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
        spawner.clone(),
    ));

    let coordinator = Arc::new(PlaybackCoordinator::new(
        Arc::clone(&catalog),
        Arc::clone(&engine),
        Arc::clone(&cast),
        ctx.clone(),
        config.cast.clone(),
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
        spawner.clone(),
    ));

    Ok(BootstrappedServices {
        catalog,
        cache_worker,
        engine,
        cast,
        coordinator,
        event_bridge,
        ctx,
        spawner,
        http_client,
    })
}
