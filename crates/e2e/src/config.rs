//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::payload::{ImageStyle, ImageType, RenderOptions, DEFAULT_SCREENSHOT_QUALITY};

/// Configuration for a verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Scheme, host and port of the rendering service
    pub base_url: String,

    /// Path prefix every endpoint is mounted under
    pub root_router: String,

    /// Artifact root; images and request bodies land in subdirectories
    pub output_dir: PathBuf,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Dark-mode flag carried by every render request
    pub dark_mode: bool,

    /// Requested output image type
    pub image_type: ImageType,

    /// Screenshot quality (0-100)
    pub screenshot_quality: u8,

    /// Per-call timeouts
    pub timeouts: TimeoutConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8805".to_string(),
            root_router: "/onebot-info-image".to_string(),
            output_dir: PathBuf::from("result"),
            user_agent: "OneBot-Info-Image-API-Test/1.0".to_string(),
            dark_mode: false,
            image_type: ImageType::default(),
            screenshot_quality: DEFAULT_SCREENSHOT_QUALITY,
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Timeouts in milliseconds. Calls are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connectivity_ms: u64,
    pub request_ms: u64,
    pub render_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connectivity_ms: 5_000,
            request_ms: 10_000,
            render_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn connectivity(&self) -> Duration {
        Duration::from_millis(self.connectivity_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn render(&self) -> Duration {
        Duration::from_millis(self.render_ms)
    }
}

impl HarnessConfig {
    /// Parse a config from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a TOML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> E2eResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(E2eError::InvalidConfig("base_url is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(E2eError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }
        if self.screenshot_quality > 100 {
            return Err(E2eError::InvalidConfig(format!(
                "screenshot_quality must be within 0..=100, got {}",
                self.screenshot_quality
            )));
        }
        Ok(())
    }

    /// Base URL joined with the root router, e.g. `http://localhost:8805/onebot-info-image`
    pub fn api_base(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        let root = self.root_router.trim().trim_matches('/');
        if root.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, root)
        }
    }

    /// Full URL of an endpoint path such as `/health`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base(), path.trim_start_matches('/'))
    }

    /// Render options for one style of a run
    pub fn render_options(&self, style: ImageStyle) -> RenderOptions {
        RenderOptions {
            image_style: style,
            enable_dark_mode: self.dark_mode,
            image_type: self.image_type,
            screenshot_quality: self.screenshot_quality,
        }
    }
}
