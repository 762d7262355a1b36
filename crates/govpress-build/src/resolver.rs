//! Asset resolution: fixed locations pass through, plugin slugs are looked up remotely.
//!
//! # Design
//! - The metadata service sits behind [`MetadataSource`] so tests can substitute a static table.
//! - One request per slug, no retry. Non-success statuses and unparseable bodies are
//!   `MetadataUnavailable`; a parsed body without a link is `NoDownloadLink`.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use govpress_config::MetadataConfig;

use crate::error::{BuildError, BuildResult, MetadataFailure};
use crate::model::{AssetId, DownloadDescriptor};

const ACTION: &str = "plugin_information";

/// Source of plugin download links.
pub trait MetadataSource: Send + Sync {
    /// Download link for `slug`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataUnavailable` or `NoDownloadLink`.
    fn download_link(&self, slug: &str) -> BuildResult<String>;
}

#[derive(Debug, Deserialize)]
struct PluginInformation {
    #[serde(default)]
    download_link: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`MetadataSource`] backed by the plugin information HTTP API.
#[derive(Debug, Clone)]
pub struct PluginApiClient {
    client: Client,
    endpoint: String,
    fields: BTreeMap<String, bool>,
}

impl PluginApiClient {
    /// Client querying `endpoint` with the configured field selection.
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>, metadata: &MetadataConfig) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            fields: metadata.fields.clone(),
        }
    }

    fn query(&self, slug: &str) -> Vec<(String, String)> {
        let mut query = vec![
            ("action".to_string(), ACTION.to_string()),
            ("request[slug]".to_string(), slug.to_string()),
        ];
        for (field, enabled) in &self.fields {
            query.push((
                format!("request[fields][{field}]"),
                if *enabled { "1" } else { "0" }.to_string(),
            ));
        }
        query
    }
}

impl MetadataSource for PluginApiClient {
    fn download_link(&self, slug: &str) -> BuildResult<String> {
        let unavailable = |source| BuildError::MetadataUnavailable {
            slug: slug.to_string(),
            source,
        };

        debug!(slug, endpoint = %self.endpoint, "querying plugin metadata");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(slug))
            .send()
            .map_err(|err| unavailable(MetadataFailure::Transport(err)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(MetadataFailure::Status(status.as_u16())));
        }

        let body = response
            .text()
            .map_err(|err| unavailable(MetadataFailure::Transport(err)))?;
        let info: PluginInformation =
            serde_json::from_str(&body).map_err(|err| unavailable(MetadataFailure::Parse(err)))?;

        match info.download_link.filter(|link| !link.trim().is_empty()) {
            Some(link) if info.error.is_none() => Ok(link),
            _ => Err(BuildError::NoDownloadLink {
                slug: slug.to_string(),
                reason: info.error,
            }),
        }
    }
}

/// Turns asset identifiers into download descriptors.
#[derive(Clone)]
pub struct AssetResolver {
    metadata: Arc<dyn MetadataSource>,
}

impl AssetResolver {
    /// Resolver consulting `metadata` for plugin slugs.
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    /// Resolve `asset` to a concrete location.
    ///
    /// # Errors
    ///
    /// Propagates metadata failures for plugin slugs.
    pub fn resolve(&self, asset: &AssetId) -> BuildResult<DownloadDescriptor> {
        match asset {
            AssetId::Fixed { kind, location } => Ok(DownloadDescriptor {
                url: location.clone(),
                kind: *kind,
            }),
            AssetId::Plugin { slug } => {
                let url = self.metadata.download_link(slug)?;
                Ok(DownloadDescriptor {
                    url,
                    kind: asset.kind(),
                })
            }
        }
    }
}
