//! Remote catalog listing
//!
//! The catalog API exposes a creator profile and a paginated post listing;
//! every post carries an optional primary file plus attachments. This module
//! flattens that into the ordered [`MediaItem`] sequence the transfer pool
//! consumes. The core pipeline only depends on the [`MediaCatalog`] trait,
//! so tests can substitute an in-process catalog.

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::types::MediaItem;
use crate::utils::sanitize_file_name;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Catalog collaborator: lists a creator's media for a service/user pair
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Resolve the display name of `user` on `service`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] when the user does not exist on the
    /// service, or a network error when the API is unreachable.
    async fn profile_name(&self, service: &str, user: &str) -> Result<String>;

    /// List up to `limit` media items, with destination paths under `dir`
    ///
    /// The returned order is the catalog's listing order (newest first on
    /// the real API); the pipeline materializes the full list before any
    /// transfer starts.
    async fn list_media(
        &self,
        service: &str,
        user: &str,
        dir: &Path,
        limit: usize,
    ) -> Result<Vec<MediaItem>>;
}

#[derive(Debug, Deserialize)]
struct Profile {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    file: Option<PostFile>,
    #[serde(default)]
    attachments: Vec<PostFile>,
}

#[derive(Debug, Deserialize)]
struct PostFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

/// HTTP catalog client for coomer-style APIs
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl HttpCatalog {
    /// Create a client for the configured catalog endpoint
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        }
    }

    fn media_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}/data{}", self.base_url, path)
        } else {
            format!("{}/data/{}", self.base_url, path)
        }
    }

    fn push_file(&self, file: &PostFile, dir: &Path, items: &mut Vec<MediaItem>) {
        let (Some(name), Some(path)) = (&file.name, &file.path) else {
            return;
        };
        if name.is_empty() || path.is_empty() {
            return;
        }
        items.push(MediaItem {
            url: self.media_url(path),
            file_path: dir.join(sanitize_file_name(name)),
        });
    }
}

#[async_trait]
impl MediaCatalog for HttpCatalog {
    async fn profile_name(&self, service: &str, user: &str) -> Result<String> {
        let url = format!(
            "{}/api/v1/{service}/user/{user}/profile",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Catalog(format!(
                "user '{user}' not found on service '{service}'"
            )));
        }
        let profile: Profile = response.error_for_status()?.json().await?;
        Ok(profile.name)
    }

    async fn list_media(
        &self,
        service: &str,
        user: &str,
        dir: &Path,
        limit: usize,
    ) -> Result<Vec<MediaItem>> {
        let mut items = Vec::new();
        let mut offset = 0usize;

        while items.len() < limit {
            let url = format!(
                "{}/api/v1/{service}/user/{user}?o={offset}",
                self.base_url
            );
            debug!(%url, collected = items.len(), "fetching catalog page");
            let posts: Vec<Post> = self
                .client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if posts.is_empty() {
                break;
            }

            for post in &posts {
                if let Some(file) = &post.file {
                    self.push_file(file, dir, &mut items);
                }
                for attachment in &post.attachments {
                    self.push_file(attachment, dir, &mut items);
                }
            }

            offset += self.page_size;
        }

        items.truncate(limit);
        Ok(items)
    }
}
