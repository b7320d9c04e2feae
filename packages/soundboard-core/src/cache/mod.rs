//! Offline cache manager.
//!
//! This module makes the application shell and the audio assets available
//! without a network round trip after their first successful fetch. It is
//! organized as:
//!
//! - [`storage`]: the [`CacheStorage`] partition abstraction and the
//!   [`NetworkFetcher`] seam, with default in-memory and reqwest-backed
//!   implementations
//! - [`worker`]: the [`CacheWorker`] lifecycle (install, activate, fetch
//!   handling) with its dual-cache policy
//!
//! Cached responses live in exactly two named generations per deployed
//! version, `shell-cache-<version>` and `audio-cache-<version>`. Bumping the
//! version token is the sole shell-invalidation mechanism; stale generations
//! are purged once, during activation.

mod storage;
mod worker;

pub use storage::{CacheStorage, HttpFetcher, MemoryCacheStorage, NetworkFetcher};
pub use worker::CacheWorker;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// What kind of consumer issued a request.
///
/// Only `Document` changes cache behavior (offline fallback to the entry
/// page); the rest exist so intercepted requests can be classified faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestDestination {
    /// Top-level navigation to a page.
    Document,
    /// Audio element source fetch.
    Audio,
    /// Script load.
    Script,
    /// Stylesheet load.
    Style,
    /// Anything else (manifest, images, fetch calls).
    Other,
}

/// An intercepted network request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute URL or rooted path of the request. This is the cache key.
    pub url: String,
    /// Consumer classification of the request.
    pub destination: RequestDestination,
}

impl FetchRequest {
    /// Creates a non-document request.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: RequestDestination::Other,
        }
    }

    /// Creates a top-level document request.
    pub fn document(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: RequestDestination::Document,
        }
    }

    /// Creates an audio request.
    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: RequestDestination::Audio,
        }
    }
}

/// Origin classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseKind {
    /// Same-origin response; eligible for the shell cache.
    Basic,
    /// Cross-origin response with readable body.
    Cors,
    /// Cross-origin response with unreadable body.
    Opaque,
}

/// A response as stored in (or served from) a cache partition.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    /// HTTP status code.
    pub status: u16,
    /// Origin classification.
    pub kind: ResponseKind,
    /// Content type header, if present.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl StoredResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The synthetic response served when an uncached audio file cannot be
    /// fetched. Lets the playback layer treat the asset as unavailable
    /// instead of crashing on a failed fetch.
    #[must_use]
    pub fn audio_unavailable() -> Self {
        Self {
            status: 404,
            kind: ResponseKind::Basic,
            content_type: Some("text/plain".to_string()),
            body: Bytes::from_static(b"Audio unavailable"),
        }
    }
}

/// Errors from the offline cache manager.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache partition read or write failed (e.g., storage quota).
    #[error("Cache storage error: {0}")]
    Storage(String),

    /// Install failed; the shell cache was not activated.
    #[error("Install failed for {url}: {reason}")]
    Install {
        /// The essential file that could not be stored.
        url: String,
        /// Why the fetch or store failed.
        reason: String,
    },

    /// A network fetch failed with no cached fallback.
    #[error("Network fetch failed: {0}")]
    NetworkFetch(String),
}

/// Convenient Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
