//! General utilities shared across the application.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns the path component of a URL, without query or fragment.
///
/// Accepts both absolute URLs (`https://host/sound/a.mp3`) and rooted paths
/// (`/sound/a.mp3`). Returns `/` for URLs with no path component.
#[must_use]
pub fn url_path(url: &str) -> &str {
    let after_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = after_scheme
        .find(['?', '#'])
        .unwrap_or(after_scheme.len());
    &after_scheme[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_millis_is_nonzero() {
        assert!(now_millis() > 0);
    }

    #[test]
    fn url_path_extracts_from_absolute_url() {
        assert_eq!(url_path("https://app.example/sound/Cris.mp3"), "/sound/Cris.mp3");
        assert_eq!(url_path("http://localhost:8080/index.html"), "/index.html");
    }

    #[test]
    fn url_path_passes_through_rooted_paths() {
        assert_eq!(url_path("/sound/Ivan.mp3"), "/sound/Ivan.mp3");
        assert_eq!(url_path("/"), "/");
    }

    #[test]
    fn url_path_strips_query_and_fragment() {
        assert_eq!(url_path("https://app.example/manifest.json?v=2"), "/manifest.json");
        assert_eq!(url_path("/index.html#top"), "/index.html");
    }

    #[test]
    fn url_path_handles_bare_origin() {
        assert_eq!(url_path("https://app.example"), "/");
    }
}
