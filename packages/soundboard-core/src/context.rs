//! Application origin context and URL building.
//!
//! This module provides [`AppContext`], which bundles the origin the app is
//! served from and builds the fully qualified URLs that the remote playback
//! session requires (receivers fetch media themselves, so relative URLs are
//! meaningless to them). It also answers the secure-context question that
//! gates cast initialization.

use serde::Serialize;

/// Origin and path context for the running application.
///
/// `origin` is scheme + host (+ optional port), e.g. `https://board.example`.
/// `base_path` is the path the app is mounted under, `/` for the root.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContext {
    origin: String,
    base_path: String,
    audio_dir: String,
}

impl AppContext {
    /// Creates a context for an app mounted at the origin root.
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_base_path(origin, "/")
    }

    /// Creates a context for an app mounted under a sub-path.
    pub fn with_base_path(origin: impl Into<String>, base_path: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        let mut base_path = base_path.into();
        if !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self {
            origin,
            base_path,
            audio_dir: "sound".to_string(),
        }
    }

    /// Returns the origin the app is served from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether the context is secure enough for cast initialization.
    ///
    /// True for `https:` origins and for recognized local-development hosts
    /// (`localhost`, `127.0.0.1`) regardless of scheme.
    #[must_use]
    pub fn is_secure_context(&self) -> bool {
        if self.origin.starts_with("https://") {
            return true;
        }
        let host = self
            .origin
            .split("://")
            .nth(1)
            .unwrap_or(&self.origin)
            .split(':')
            .next()
            .unwrap_or("");
        host == "localhost" || host == "127.0.0.1"
    }

    /// Returns the base URL of the app, ending with a slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin, self.base_path)
    }

    /// Returns the fully qualified URL of an audio file.
    ///
    /// This is the form [`crate::cast`] requires for media handoff.
    #[must_use]
    pub fn audio_url(&self, filename: &str) -> String {
        format!("{}{}/{}", self.base_url(), self.audio_dir, filename)
    }

    /// Returns whether the given URL belongs to this origin. Scheme, host,
    /// and port must all match; `http://` and `https://` on the same host
    /// are different origins.
    ///
    /// Used by the cache worker to classify responses as same-origin
    /// ("basic") before storing them in the shell cache.
    #[must_use]
    pub fn is_same_origin(&self, url: &str) -> bool {
        match url.find("://") {
            Some(idx) => {
                let host_end = url[idx + 3..]
                    .find('/')
                    .map_or(url.len(), |slash| idx + 3 + slash);
                url[..host_end] == self.origin
            }
            // Rooted paths are implicitly same-origin.
            None => url.starts_with('/'),
        }
    }
}
