//! Upstream structure repository access.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use structure::{normalize_id, sanitize_structure};
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::error::FetchError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can return the raw text of a structure file by identifier.
///
/// Implementations must be `Send + Sync` for use from axum handlers.
pub trait StructureSource: Send + Sync {
    /// `id` is already normalized.
    fn fetch_raw(&self, id: &str) -> BoxFuture<'_, Result<String, FetchError>>;
}

/// Plain-text files served from `<base_url>/<id>.<extension>`.
pub struct RepositorySource {
    http: Client,
    base_url: Url,
    extension: String,
}

impl RepositorySource {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, String> {
        let base_url =
            Url::parse(&cfg.base_url).map_err(|e| format!("invalid upstream url: {e}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("upstream url cannot be a base: {base_url}"));
        }
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| format!("http client init failed: {e}"))?;
        Ok(Self {
            http,
            base_url,
            extension: cfg.extension.clone(),
        })
    }

    /// The identifier is pushed as a single, percent-encoded path segment.
    pub fn url_for(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&format!("{id}.{}", self.extension));
        }
        url
    }
}

impl StructureSource for RepositorySource {
    fn fetch_raw(&self, id: &str) -> BoxFuture<'_, Result<String, FetchError>> {
        let url = self.url_for(id);
        Box::pin(async move {
            info!("fetching structure from {url}");
            let resp = self
                .http
                .get(url)
                .header(ACCEPT, "text/plain")
                .send()
                .await
                .map_err(FetchError::transport)?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Upstream {
                    status: status.as_u16(),
                    reason: status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string(),
                });
            }

            resp.text().await.map_err(FetchError::transport)
        })
    }
}

/// Normalizes `raw_id`, fetches it and strips the file down to its coordinate
/// records.
///
/// A blank identifier fails with [`FetchError::MissingInput`] before `source`
/// is touched.
pub async fn fetch_structure(
    source: &dyn StructureSource,
    raw_id: &str,
) -> Result<String, FetchError> {
    let id = normalize_id(raw_id).ok_or(FetchError::MissingInput)?;
    info!(%id, "fetching protein");

    let body = source.fetch_raw(&id).await?;
    debug!(%id, len = body.len(), head = %body.chars().take(100).collect::<String>(), "received structure");

    let clean = sanitize_structure(&body)?;
    info!(%id, raw_len = body.len(), clean_len = clean.len(), "filtered structure");
    Ok(clean)
}
