//! Imagery API abstraction and the Mapillary Graph API client.

use std::future::Future;
use std::pin::Pin;

use foundation::{GeoBox, ImageFeature};
use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::protocol::{
    DEFAULT_GRAPH_URL, DOWNLOAD_URL_FIELD, GraphErrorResponse, IMAGE_SEARCH_FIELDS,
    ImageSearchResponse, ImageUrlResponse, MAX_SEARCH_LIMIT, is_valid_key,
};

/// Cap on what a `Content-Length` header may pre-allocate.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("graph API error: {0}")]
    Graph(String),
    #[error("invalid key {0:?}")]
    InvalidKey(String),
    #[error("image {0} has no downloadable URL")]
    NoDownloadUrl(String),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote imagery service keyed by image id.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait ImageryApi: Send + Sync {
    /// Looks up a time-limited URL for the full-resolution image.
    fn resolve_download_url<'a>(&'a self, image_id: &'a str)
    -> BoxFuture<'a, Result<String, ApiError>>;

    /// Fetches the bytes behind a URL from [`ImageryApi::resolve_download_url`].
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ApiError>>;
}

#[derive(Clone)]
pub struct MapillaryClient {
    http: Client,
    graph_url: String,
    access_token: String,
}

impl std::fmt::Debug for MapillaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keep the token out of logs.
        f.debug_struct("MapillaryClient")
            .field("graph_url", &self.graph_url)
            .finish_non_exhaustive()
    }
}

impl MapillaryClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn with_graph_url(mut self, graph_url: impl Into<String>) -> Self {
        self.graph_url = graph_url.into();
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn graph_url(&self) -> &str {
        self.graph_url.trim_end_matches('/')
    }

    /// Image metadata inside `bbox`, converted to features.
    ///
    /// `limit` is clamped to the endpoint's per-request maximum.
    pub async fn search_images(
        &self,
        bbox: &GeoBox,
        limit: u32,
    ) -> Result<Vec<ImageFeature>, ApiError> {
        let url = format!("{}/images", self.graph_url());
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let bbox = bbox.to_query_string();
        let query = [
            ("bbox", bbox.as_str()),
            ("fields", IMAGE_SEARCH_FIELDS),
            ("limit", limit.as_str()),
        ];

        let resp: ImageSearchResponse = self.get_json(&url, &query).await?;
        debug!("image search returned {} records", resp.data.len());
        Ok(resp
            .data
            .into_iter()
            .filter_map(|img| img.into_feature())
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("OAuth {}", self.access_token),
            )
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            if let Ok(err) = serde_json::from_slice::<GraphErrorResponse>(&body) {
                return Err(ApiError::Graph(err.error.message));
            }
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ImageryApi for MapillaryClient {
    fn resolve_download_url<'a>(
        &'a self,
        image_id: &'a str,
    ) -> BoxFuture<'a, Result<String, ApiError>> {
        Box::pin(async move {
            if !is_valid_key(image_id) {
                return Err(ApiError::InvalidKey(image_id.to_string()));
            }
            let url = format!("{}/{image_id}", self.graph_url());
            let resp: ImageUrlResponse = self
                .get_json(&url, &[("fields", DOWNLOAD_URL_FIELD)])
                .await?;
            resp.thumb_original_url
                .filter(|u| !u.is_empty())
                .ok_or_else(|| ApiError::NoDownloadUrl(image_id.to_string()))
        })
    }

    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ApiError>> {
        Box::pin(async move {
            let resp = self.http.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                // The signed URL itself is not worth logging in full.
                let shown = url.split('?').next().unwrap_or(url);
                return Err(ApiError::Status {
                    url: shown.to_string(),
                    status: status.as_u16(),
                });
            }

            let mut out = Vec::with_capacity(prealloc_hint(resp.content_length()));
            let mut body = resp.bytes_stream();
            while let Some(chunk) = body.next().await {
                out.extend_from_slice(&chunk?);
            }
            Ok(out)
        })
    }
}

/// Capacity to reserve for a body of the announced length. The header is
/// only a hint; the body is still read to its real end.
fn prealloc_hint(content_length: Option<u64>) -> usize {
    content_length
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
        .min(MAX_PREALLOC)
}
