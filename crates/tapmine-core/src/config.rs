//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::estimate::DEFAULT_SESSION_CAP_SECS;

/// API base used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Base for relative avatar and task image paths.
pub const DEFAULT_IMAGE_URL: &str = "http://localhost:8000/storage/";

/// Settings for an [`crate::app::App`].
///
/// Defaults come from `TAPMINE_API_URL` / `TAPMINE_IMAGE_URL` at build
/// time. Any field may be overridden from a JS object at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Prefix for relative image paths.
    pub image_url: String,
    /// Maximum elapsed seconds counted by the mining display.
    pub session_cap_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: option_env!("TAPMINE_API_URL").unwrap_or(DEFAULT_API_URL).to_string(),
            image_url: option_env!("TAPMINE_IMAGE_URL").unwrap_or(DEFAULT_IMAGE_URL).to_string(),
            session_cap_secs: DEFAULT_SESSION_CAP_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    /// A cap of zero would freeze the display at 0, so it is raised to 1.
    pub fn with_session_cap_secs(mut self, secs: u64) -> Self {
        self.session_cap_secs = secs.max(1);
        self
    }

    /// Absolute URL for an API path such as `/mining/status`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
