//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
///
/// All sub-configs have working defaults; `Config::default()` describes a run
/// that downloads everything with three parallel transfers and no conversion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior (directory, concurrency, limit)
    #[serde(default)]
    pub download: DownloadConfig,

    /// Remote catalog endpoint
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Post-download conversion
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Usage telemetry
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Validate settings that have policy bounds
    ///
    /// The 1-5 range on parallel downloads is enforced here (and by the CLI
    /// parser), not inside the worker pools, which only assume a cap >= 1.
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.download.max_concurrent_downloads) {
            return Err(Error::config(
                "parallel downloads must be between 1 and 5",
                "download.max_concurrent_downloads",
            ));
        }
        if self.download.limit < 1 {
            return Err(Error::config(
                "download limit must be at least 1",
                "download.limit",
            ));
        }
        if self.conversion.max_concurrent < 1 {
            return Err(Error::config(
                "conversion concurrency must be at least 1",
                "conversion.max_concurrent",
            ));
        }
        if self.catalog.page_size < 1 {
            return Err(Error::config(
                "catalog page size must be at least 1",
                "catalog.page_size",
            ));
        }
        if url::Url::parse(&self.catalog.base_url).is_err() {
            return Err(Error::config(
                format!("invalid catalog base URL '{}'", self.catalog.base_url),
                "catalog.base_url",
            ));
        }
        Ok(())
    }
}

/// Download behavior configuration (directory, concurrency, limit)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory the per-profile folder is created under (default: ".")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent downloads, 1-5 (default: 3)
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Maximum number of files to download (default: effectively unlimited)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            limit: default_limit(),
        }
    }
}

/// Remote catalog endpoint configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Posts returned per listing page; also the pagination offset step
    /// (default: 50, the catalog API's fixed page size)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
        }
    }
}

/// Post-download conversion configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Convert downloaded images to AVIF (default: false)
    #[serde(default)]
    pub convert_images: bool,

    /// Convert downloaded videos to AV1 (default: false)
    #[serde(default)]
    pub convert_videos: bool,

    /// Maximum concurrent encoder invocations per class (default: 5)
    #[serde(default = "default_conversion_concurrent")]
    pub max_concurrent: usize,

    /// Path to the ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for ffmpeg if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            convert_images: false,
            convert_videos: false,
            max_concurrent: default_conversion_concurrent(),
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Usage telemetry configuration
///
/// Nothing is ever sent unless an endpoint is configured, even when enabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether run start/end pings are sent (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint the pings are POSTed to (default: None, telemetry inert)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent_downloads() -> usize {
    3
}

fn default_limit() -> usize {
    1_000_000
}

fn default_base_url() -> String {
    "https://coomer.su".to_string()
}

fn default_page_size() -> usize {
    50
}

fn default_conversion_concurrent() -> usize {
    5
}

fn default_true() -> bool {
    true
}
