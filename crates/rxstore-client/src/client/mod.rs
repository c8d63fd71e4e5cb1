//! HTTP client for the storefront catalog API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use rxstore_core::{
    classify, AppConfig, ClassifiedResponse, FilterState, FiltersResponse, RequestKey, RoutePath,
};
use serde::de::DeserializeOwned;

use crate::cache::RequestCache;
use crate::error::ClientError;
use crate::retry::retry_with_backoff;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const DEFAULT_CACHE_CAPACITY: usize = 256;
const FILTERS_PATH: &str = "dynamic-filters";

/// HTTP client for the storefront catalog API.
///
/// Route fetches return the payload already classified into a
/// [`ClassifiedResponse`]. Both route and dynamic-filter responses go through
/// a read-through cache, so repeated or concurrent requests for the same key
/// hit the network once. A failure shared by concurrent callers arrives as
/// [`ClientError::Shared`]; [`ClientError::root`] sees through it.
///
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential backoff up to `max_retries` additional attempts.
pub struct StorefrontClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    include_variants: bool,
    include_counts: bool,
    routes: RequestCache<RequestKey, ClassifiedResponse>,
    filters: RequestCache<String, FiltersResponse>,
}

impl StorefrontClient {
    /// Creates a client against `base_url` with configured timeout,
    /// `User-Agent`, and retry policy. The cache starts with a 300 s TTL and
    /// 256 entries; see [`StorefrontClient::with_cache`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`ClientError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
            include_variants: true,
            include_counts: true,
            routes: RequestCache::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY),
            filters: RequestCache::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY),
        })
    }

    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?
        .with_cache(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity,
        )
        .with_filter_options(config.filters_include_variants, config.filters_include_counts))
    }

    /// Replaces both caches. A `capacity` of zero disables caching.
    #[must_use]
    pub fn with_cache(mut self, ttl: Duration, capacity: usize) -> Self {
        self.routes = RequestCache::new(ttl, capacity);
        self.filters = RequestCache::new(ttl, capacity);
        self
    }

    #[must_use]
    pub fn with_filter_options(mut self, include_variants: bool, include_counts: bool) -> Self {
        self.include_variants = include_variants;
        self.include_counts = include_counts;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cached classification for `key`, if any, without touching the network.
    pub async fn cached_route(&self, key: &RequestKey) -> Option<Arc<ClassifiedResponse>> {
        self.routes.peek(key).await
    }

    /// Fetches and classifies `GET {base}/{segments}?{filters}`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotFound`]: HTTP 404 (not retried).
    /// - [`ClientError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ClientError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ClientError::Http`]: network or TLS failure after all retries.
    /// - [`ClientError::Deserialize`] / [`ClientError::Classify`]: the body is
    ///   not JSON or matches no known response shape.
    pub async fn fetch_route(
        &self,
        route: &RoutePath,
        filters: &FilterState,
    ) -> Result<Arc<ClassifiedResponse>, ClientError> {
        let key = RequestKey::new(route, filters);
        let url = self.route_url(route, filters)?;
        self.routes
            .get_or_fetch(&key, || async move {
                let payload: serde_json::Value = self.get_json(&url, "route response").await?;
                classify(payload).map_err(|source| ClientError::Classify {
                    url: url.to_string(),
                    source,
                })
            })
            .await
            .map_err(ClientError::from_shared)
    }

    /// Fetches `GET {base}/dynamic-filters/{slug}` for the sidebar.
    ///
    /// # Errors
    ///
    /// Same transport errors as [`StorefrontClient::fetch_route`]; a body that
    /// does not decode as a filters response yields
    /// [`ClientError::Deserialize`].
    pub async fn fetch_dynamic_filters(
        &self,
        category_slug: &str,
    ) -> Result<Arc<FiltersResponse>, ClientError> {
        let url = self.filters_url(category_slug)?;
        self.filters
            .get_or_fetch(&category_slug.to_owned(), || async move {
                self.get_json(&url, &format!("dynamic filters for {category_slug}"))
                    .await
            })
            .await
            .map_err(ClientError::from_shared)
    }

    /// Issues a GET with retry and decodes the body as `T`.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            tracing::debug!(url = %url, "storefront API request");
            let response = self
                .client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ClientError::RateLimited {
                    url: url.to_string(),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ClientError::NotFound {
                    url: url.to_string(),
                });
            }

            if !status.is_success() {
                return Err(ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|source| ClientError::Deserialize {
                context: format!("{context} from {url}"),
                source,
            })
        })
        .await
    }

    /// `{base}/{segment}/{segment}?{canonical query}`. Segments are
    /// percent-encoded individually; the query string is used as produced
    /// by [`FilterState::to_query_string`] so it matches the cache key.
    fn route_url(&self, route: &RoutePath, filters: &FilterState) -> Result<Url, ClientError> {
        if route.is_empty() {
            return Err(ClientError::InvalidPath {
                path: route.to_string(),
                reason: "route has no segments".to_owned(),
            });
        }
        let mut url = self.base_url.clone();
        push_segments(&mut url, route.segments())?;
        let query = filters.to_query_string(true);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    fn filters_url(&self, category_slug: &str) -> Result<Url, ClientError> {
        let slug = category_slug.trim();
        if slug.is_empty() {
            return Err(ClientError::InvalidPath {
                path: category_slug.to_owned(),
                reason: "category slug is empty".to_owned(),
            });
        }
        let mut url = self.base_url.clone();
        push_segments(&mut url, [FILTERS_PATH, slug])?;
        {
            let mut pairs = url.query_pairs_mut();
            if self.include_variants {
                pairs.append_pair("include_variants", "true");
            }
            if self.include_counts {
                pairs.append_pair("include_counts", "true");
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        base_url: raw.to_owned(),
        reason,
    };
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_owned()));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn push_segments<I, S>(url: &mut Url, segments: I) -> Result<(), ClientError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base = url.to_string();
    let mut path = url
        .path_segments_mut()
        .map_err(|()| ClientError::InvalidBaseUrl {
            base_url: base,
            reason: "URL cannot be a base".to_owned(),
        })?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment.as_ref());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
