//! The offline cache worker lifecycle.
//!
//! Models the background worker that intercepts every network fetch:
//!
//! - **Install**: fetch and store every essential shell file, all-or-nothing.
//!   A partially cached shell is worse than none; the entry point must be
//!   guaranteed available offline.
//! - **Activate**: purge every cache generation that is neither the current
//!   shell nor the current audio generation, then take control immediately.
//! - **Fetch** (steady state): cache-first for shell files, a distinct
//!   cache-after-first-play policy for audio files, and an offline fallback
//!   to the cached entry page for document requests.
//!
//! Each lifecycle step is a method over an explicit [`CacheConfig`] rather
//! than ambient worker globals, so the state machine is testable in
//! isolation.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::config::CacheConfig;
use crate::events::{CacheEvent, EventEmitter};
use crate::utils::{now_millis, url_path};

use super::{CacheError, CacheResult, CacheStorage, FetchRequest, NetworkFetcher};
use super::{RequestDestination, ResponseKind, StoredResponse};

/// Returns whether a request URL falls under the audio-assets policy.
///
/// Pure function of the config: path prefix plus an allowed extension.
pub(crate) fn is_audio_request(config: &CacheConfig, url: &str) -> bool {
    let path = url_path(url);
    path.starts_with(&config.audio_path_prefix)
        && config
            .allowed_audio_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
}

/// The offline cache worker.
///
/// Owns the install/activate/fetch lifecycle over a [`CacheStorage`] and a
/// [`NetworkFetcher`]. One worker instance corresponds to one deployed
/// version; a redeploy constructs a new worker with a bumped version token.
pub struct CacheWorker {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn NetworkFetcher>,
    config: CacheConfig,
    emitter: Arc<dyn EventEmitter>,
}

impl CacheWorker {
    /// Creates a worker for the given config.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn NetworkFetcher>,
        config: CacheConfig,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            config,
            emitter,
        }
    }

    /// Returns the worker's cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Runs install then activate, the order guaranteed for a new worker
    /// version. Fetch handling may begin once this returns.
    pub async fn run_lifecycle(&self) -> CacheResult<Vec<String>> {
        self.install().await?;
        Ok(self.activate().await)
    }

    /// Install step: populate the shell cache for this version.
    ///
    /// Fetches every essential file first and writes only when all fetches
    /// succeeded, so a failed install leaves no partial shell cache behind.
    /// On success the new worker takes control without waiting for open
    /// pages to close.
    pub async fn install(&self) -> CacheResult<()> {
        let shell = self.config.shell_generation();
        log::info!("[CacheWorker] Installing, caching essential files into {shell}");

        let fetches = self.config.essential_files.iter().map(|path| {
            let fetcher = Arc::clone(&self.fetcher);
            let url = path.clone();
            async move {
                let response = fetcher
                    .fetch(&FetchRequest::new(&url))
                    .await
                    .map_err(|e| CacheError::Install {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                if !response.ok() {
                    return Err(CacheError::Install {
                        url: url.clone(),
                        reason: format!("http status {}", response.status),
                    });
                }
                Ok::<_, CacheError>((url, response))
            }
        });
        let fetched = try_join_all(fetches).await?;

        self.storage.open(&shell).await?;
        for (url, response) in &fetched {
            if let Err(e) = self.storage.put(&shell, url, response.clone()).await {
                // A half-written shell must not survive a failed install.
                self.storage.delete_generation(&shell).await;
                return Err(CacheError::Install {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        log::info!(
            "[CacheWorker] Install complete ({} files), taking control immediately",
            fetched.len()
        );
        self.emitter.emit_cache(CacheEvent::ShellInstalled {
            generation: shell,
            file_count: fetched.len(),
            timestamp: now_millis(),
        });
        Ok(())
    }

    /// Activate step: purge stale generations, then claim open pages.
    ///
    /// Returns the names of the deleted generations.
    pub async fn activate(&self) -> Vec<String> {
        let keep = [self.config.shell_generation(), self.config.audio_generation()];
        let mut removed = Vec::new();

        for name in self.storage.generation_names().await {
            if !keep.contains(&name) {
                log::info!("[CacheWorker] Deleting stale cache generation: {name}");
                if self.storage.delete_generation(&name).await {
                    removed.push(name);
                }
            }
        }

        if !removed.is_empty() {
            self.emitter.emit_cache(CacheEvent::GenerationsPurged {
                removed: removed.clone(),
                timestamp: now_millis(),
            });
        }
        log::info!("[CacheWorker] Activated, claiming open pages");
        removed
    }

    /// Fetch step: decide a response for one intercepted request.
    ///
    /// Audio requests get their own policy; everything else is cache-first
    /// with a write-through on miss. Document requests that fail offline
    /// fall back to the cached entry page; other network failures propagate.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> CacheResult<StoredResponse> {
        if is_audio_request(&self.config, &request.url) {
            return Ok(self.handle_audio_request(request).await);
        }

        if let Some(hit) = self.storage.match_any(&request.url).await {
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.status == 200 && response.kind == ResponseKind::Basic {
                    let shell = self.config.shell_generation();
                    // Best effort: a full quota never blocks serving the response.
                    if let Err(e) = self.storage.put(&shell, &request.url, response.clone()).await {
                        log::warn!(
                            "[CacheWorker] Failed to cache {} into {shell}: {e}",
                            request.url
                        );
                    }
                }
                Ok(response)
            }
            Err(e) => {
                if request.destination == RequestDestination::Document {
                    if let Some(page) = self.storage.match_any(&self.config.offline_fallback).await
                    {
                        log::info!(
                            "[CacheWorker] Offline, serving cached entry page for {}",
                            request.url
                        );
                        return Ok(page);
                    }
                }
                Err(e)
            }
        }
    }

    /// Audio policy: cache permanently after the first successful fetch.
    ///
    /// Bulk preloading at install time is the rejected alternative; install
    /// stays fast and audio is cached the first time it is played. A network
    /// failure yields a synthetic 404 so the playback layer sees "asset
    /// unavailable" rather than an error.
    async fn handle_audio_request(&self, request: &FetchRequest) -> StoredResponse {
        let audio = self.config.audio_generation();
        if let Some(hit) = self.storage.get(&audio, &request.url).await {
            log::debug!("[CacheWorker] Serving audio from cache: {}", request.url);
            return hit;
        }

        log::info!("[CacheWorker] Fetching and caching audio: {}", request.url);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    if let Err(e) = self.storage.put(&audio, &request.url, response.clone()).await {
                        log::warn!(
                            "[CacheWorker] Failed to cache audio {}: {e}",
                            request.url
                        );
                    } else {
                        self.emitter.emit_cache(CacheEvent::AudioCached {
                            url: request.url.clone(),
                            timestamp: now_millis(),
                        });
                    }
                }
                response
            }
            Err(e) => {
                log::error!("[CacheWorker] Audio fetch failed for {}: {e}", request.url);
                StoredResponse::audio_unavailable()
            }
        }
    }

    /// Explicitly warms the audio cache with the configured audio files.
    ///
    /// Optional and best-effort; never part of install. Returns the number
    /// of files newly cached.
    pub async fn warm_audio_cache(&self) -> usize {
        let audio = self.config.audio_generation();
        let mut cached = 0;
        for url in &self.config.audio_files {
            if self.storage.get(&audio, url).await.is_some() {
                continue;
            }
            let response = self.handle_audio_request(&FetchRequest::audio(url)).await;
            if response.ok() {
                cached += 1;
            }
        }
        log::info!("[CacheWorker] Audio cache warmed, {cached} new files");
        cached
    }
}
