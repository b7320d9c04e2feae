//! Cache partition storage and network fetch abstractions.
//!
//! [`CacheStorage`] models named, versioned cache generations holding
//! request/response pairs. [`NetworkFetcher`] is the worker's view of the
//! network. Both are trait seams so the worker lifecycle can be driven in
//! tests without real storage or a real network.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;

use crate::context::AppContext;

use super::{CacheError, CacheResult, FetchRequest, ResponseKind, StoredResponse};

/// Named-partition cache storage.
///
/// A partition ("generation") is identified by name and maps request URLs to
/// stored responses. Generations are created on first write and deleted as a
/// whole during activation purges.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates an empty generation if it does not exist yet.
    async fn open(&self, generation: &str) -> CacheResult<()>;

    /// Looks up a request URL in a specific generation.
    async fn get(&self, generation: &str, url: &str) -> Option<StoredResponse>;

    /// Looks up a request URL across all generations.
    async fn match_any(&self, url: &str) -> Option<StoredResponse>;

    /// Stores a response under a generation, creating it if needed.
    ///
    /// A request URL lives in at most one generation at a time: storing it
    /// here removes it from any other generation.
    async fn put(&self, generation: &str, url: &str, response: StoredResponse) -> CacheResult<()>;

    /// Deletes a whole generation. Returns whether it existed.
    async fn delete_generation(&self, generation: &str) -> bool;

    /// Lists the names of all existing generations.
    async fn generation_names(&self) -> Vec<String>;
}

/// In-memory [`CacheStorage`] implementation.
///
/// The default for tests and for embedding environments that supply their
/// own persistence underneath the platform cache API.
#[derive(Default)]
pub struct MemoryCacheStorage {
    generations: DashMap<String, DashMap<String, StoredResponse>>,
}

impl MemoryCacheStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage wrapped in an Arc.
    #[must_use]
    pub fn arc() -> Arc<dyn CacheStorage> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, generation: &str) -> CacheResult<()> {
        self.generations
            .entry(generation.to_string())
            .or_default();
        Ok(())
    }

    async fn get(&self, generation: &str, url: &str) -> Option<StoredResponse> {
        self.generations
            .get(generation)?
            .get(url)
            .map(|r| r.value().clone())
    }

    async fn match_any(&self, url: &str) -> Option<StoredResponse> {
        self.generations
            .iter()
            .find_map(|gen| gen.value().get(url).map(|r| r.value().clone()))
    }

    async fn put(&self, generation: &str, url: &str, response: StoredResponse) -> CacheResult<()> {
        // One generation per request key: evict the entry everywhere else first.
        for gen in self.generations.iter() {
            if gen.key() != generation {
                gen.value().remove(url);
            }
        }
        self.generations
            .entry(generation.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }

    async fn delete_generation(&self, generation: &str) -> bool {
        self.generations.remove(generation).is_some()
    }

    async fn generation_names(&self) -> Vec<String> {
        self.generations.iter().map(|g| g.key().clone()).collect()
    }
}

/// The worker's view of the network.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// Performs a network fetch for the given request.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NetworkFetch`] when the request cannot reach
    /// the network (offline, DNS failure, connection refused). HTTP error
    /// statuses are NOT errors; they come back as responses.
    async fn fetch(&self, request: &FetchRequest) -> CacheResult<StoredResponse>;
}

/// reqwest-backed [`NetworkFetcher`].
///
/// Resolves rooted paths against the app origin and classifies responses as
/// same-origin ("basic") or cross-origin before the worker decides whether
/// to cache them.
pub struct HttpFetcher {
    client: Client,
    ctx: AppContext,
}

impl HttpFetcher {
    /// Creates a fetcher for the given app context.
    #[must_use]
    pub fn new(client: Client, ctx: AppContext) -> Self {
        Self { client, ctx }
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.ctx.origin(), url)
        } else {
            url.to_string()
        }
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> CacheResult<StoredResponse> {
        let url = self.absolute_url(&request.url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CacheError::NetworkFetch(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = if self.ctx.is_same_origin(&url) {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::NetworkFetch(e.to_string()))?;

        Ok(StoredResponse {
            status,
            kind,
            content_type,
            body,
        })
    }
}
