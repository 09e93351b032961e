//! Remote service configuration.
//!
//! Loaded from environment variables (a `.env` file in the working directory
//! is honoured):
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | SUPABASE_URL | (required) | Project base URL |
//! | SUPABASE_ANON_KEY | (required) | Public anon key sent as `apikey` |
//! | NOTEKEEP_IMAGE_BUCKET | task-images | Bucket for note images |
//! | NOTEKEEP_TIMEOUT | 30 | Request timeout (seconds) |

use notekeep_core::defaults::{IMAGE_BUCKET, REQUEST_TIMEOUT_SECS};
use notekeep_core::{Error, Result};
use tracing::debug;

/// Default base URL of a locally running stack.
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321";

/// Connection settings for the data API and object storage.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Public anon key.
    pub anon_key: String,
    /// Bucket holding note images.
    pub image_bucket: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            anon_key: String::new(),
            image_bucket: IMAGE_BUCKET.to_string(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"<redacted>")
            .field("image_bucket", &self.image_bucket)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            ..Default::default()
        }
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("SUPABASE_URL")
            .ok_or_else(|| Error::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = lookup("SUPABASE_ANON_KEY")
            .ok_or_else(|| Error::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        let config = Self {
            base_url,
            anon_key,
            image_bucket: lookup("NOTEKEEP_IMAGE_BUCKET")
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| IMAGE_BUCKET.to_string()),
            timeout_seconds: lookup("NOTEKEEP_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        };
        config.validate()?;

        debug!(
            base_url = %config.base_url,
            bucket = %config.image_bucket,
            timeout_seconds = config.timeout_seconds,
            "Loaded remote configuration"
        );
        Ok(config)
    }

    /// Check that the configuration can produce working requests.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(Error::Config("Anon key cannot be empty".to_string()));
        }
        if self.image_bucket.trim().is_empty() {
            return Err(Error::Config("Image bucket cannot be empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config("Timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}
