//! Client configuration.
//!
//! Everything defaults to the production endpoints; environment variables
//! exist mainly so integration tests and staging builds can point the client
//! at a different host.

use std::time::Duration;

use crate::constants::{
    BROWSER_USER_AGENT, DEFAULT_FORUM_ORIGIN, DEFAULT_SEARCH_ORIGIN, DEFAULT_UPLOAD_ENDPOINT,
};

/// Endpoints and transport settings for a [`crate::ForumClient`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheme+host of the forum, no trailing slash. Relative URLs scraped
    /// out of pages are resolved against this.
    pub forum_origin: String,
    /// Scheme+host of the read-only search mirror, no trailing slash.
    pub search_origin: String,
    /// Full URL of the anonymous file-hosting upload endpoint.
    pub upload_endpoint: String,
    /// User agent attached to every request that does not set its own.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forum_origin: DEFAULT_FORUM_ORIGIN.to_string(),
            search_origin: DEFAULT_SEARCH_ORIGIN.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Build a configuration from environment variables, falling back to the
    /// production defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            forum_origin: origin_env_or(defaults.forum_origin, "FORUM_ORIGIN"),
            search_origin: origin_env_or(defaults.search_origin, "SEARCH_ORIGIN"),
            upload_endpoint: env_or(defaults.upload_endpoint, "UPLOAD_ENDPOINT"),
            user_agent: env_or(defaults.user_agent, "FORUM_USER_AGENT"),
            timeout: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }
}

fn env_or(default: String, name: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

/// Like [`env_or`], but origins must not carry a trailing slash.
fn origin_env_or(default: String, name: &str) -> String {
    let value = env_or(default, name);
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = Config::default();

        assert!(config.forum_origin.starts_with("https://"));
        assert!(!config.forum_origin.ends_with('/'));
        assert!(!config.search_origin.ends_with('/'));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
