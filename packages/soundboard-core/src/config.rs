//! Application configuration types.
//!
//! All fields have sensible defaults matching the deployed web app. The
//! version token in [`CacheConfig`] is the sole shell-invalidation mechanism:
//! bumping it on deploy makes the next activation purge stale generations.

use serde::{Deserialize, Serialize};

/// Configuration for the offline cache worker.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Version token embedded in cache generation names.
    pub version: String,

    /// Files fetched and stored during install. Install is all-or-nothing:
    /// a partially cached shell is worse than none.
    pub essential_files: Vec<String>,

    /// Path prefix that routes requests to the audio cache policy.
    pub audio_path_prefix: String,

    /// Extensions accepted under the audio path prefix.
    pub allowed_audio_extensions: Vec<String>,

    /// Known audio files, used only for explicit cache warming.
    pub audio_files: Vec<String>,

    /// Entry page served to document requests when the network is down.
    pub offline_fallback: String,
}

impl CacheConfig {
    /// Returns the shell cache generation name for the current version.
    #[must_use]
    pub fn shell_generation(&self) -> String {
        format!("shell-cache-{}", self.version)
    }

    /// Returns the audio cache generation name for the current version.
    #[must_use]
    pub fn audio_generation(&self) -> String {
        format!("audio-cache-{}", self.version)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.version.is_empty() {
            return Err("cache version token must not be empty".to_string());
        }
        if self.essential_files.is_empty() {
            return Err("essential_files must contain at least the entry page".to_string());
        }
        if !self.essential_files.contains(&self.offline_fallback) {
            return Err(format!(
                "offline_fallback {} must be one of the essential files",
                self.offline_fallback
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "v2".to_string(),
            essential_files: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
            audio_path_prefix: "/sound/".to_string(),
            allowed_audio_extensions: vec![".mp3".to_string()],
            audio_files: Vec::new(),
            offline_fallback: "/index.html".to_string(),
        }
    }
}

/// Configuration for the remote playback session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CastConfig {
    /// Receiver application id (default media receiver).
    pub receiver_application_id: String,

    /// UI locale passed to the cast runtime.
    pub language: String,

    /// Seconds to wait for the cast runtime to announce readiness.
    pub init_timeout_secs: u64,

    /// Seconds after which a remote playback slot is cleared. Receivers do
    /// not report natural end-of-track back to us, so a fixed estimate
    /// stands in for it.
    pub estimated_clip_duration_secs: u64,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            receiver_application_id: "CC1AD845".to_string(),
            language: "es-ES".to_string(),
            init_timeout_secs: 5,
            estimated_clip_duration_secs: 5,
        }
    }
}

/// Configuration for the soundboard core.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Offline cache worker configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Remote playback session configuration.
    #[serde(default)]
    pub cast: CastConfig,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        if self.cast.init_timeout_secs == 0 {
            return Err("cast init_timeout_secs must be >= 1".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            cast: CastConfig::default(),
            event_channel_capacity: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn cache_generation_names_embed_version() {
        let cache = CacheConfig {
            version: "v7".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(cache.shell_generation(), "shell-cache-v7");
        assert_eq!(cache.audio_generation(), "audio-cache-v7");
    }

    #[test]
    fn cache_config_rejects_empty_version() {
        let cache = CacheConfig {
            version: String::new(),
            ..CacheConfig::default()
        };
        assert!(cache.validate().is_err());
    }

    #[test]
    fn cache_config_requires_fallback_in_essential_files() {
        let cache = CacheConfig {
            offline_fallback: "/offline.html".to_string(),
            ..CacheConfig::default()
        };
        assert!(cache.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_channel_capacity() {
        let config = Config {
            event_channel_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
