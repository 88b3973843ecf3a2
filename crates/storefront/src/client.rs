//! HTTP client for the external Casemandu API.
//!
//! One client serves every endpoint the storefront talks to: the phone
//! catalog, promo codes, and order submission. Endpoint-specific methods live
//! with their modules (`catalog`, `promo`, `order`); this module owns the
//! connection pool, the base URL, and the read cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use url::Url;

use crate::catalog::CatalogError;
use crate::catalog::cache::{CacheKey, CacheValue};
use crate::config::StorefrontConfig;

/// Client for the external storefront API.
///
/// Cheap to clone; clones share the connection pool and cache. Catalog reads
/// are cached for 5 minutes.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API configured in `config`.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self::with_base_url(&config.api_base_url)
    }

    /// Create a client for the API at `base_url` (no trailing slash).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL for an API path such as `/api/orders`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Absolute URL for `path` followed by `segments`, each escaped as a
    /// single path segment.
    pub(crate) fn endpoint(&self, path: &str, segments: &[&str]) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.url(path))?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .extend(segments);
        }
        Ok(url)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    /// GET `path` plus `segments` and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a body
    /// that is not JSON.
    pub(crate) async fn get_json(
        &self,
        path: &str,
        segments: &[&str],
    ) -> Result<serde_json::Value, CatalogError> {
        let url = self.endpoint(path, segments)?;
        let response = self.http().get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CatalogError::Status {
                path: url.path().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(
                path,
                error = %e,
                body = %body.chars().take(200).collect::<String>(),
                "Response body is not JSON"
            );
            CatalogError::Shape(format!("{path}: body is not JSON"))
        })
    }
}
