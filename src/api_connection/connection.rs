use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FoodDataConfig;
use crate::request_cache::RequestCache;

#[derive(Debug, Error)]
pub enum FoodDataError {
    /// Transport failure or non-success status from the food-data service.
    #[error("food-data service unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The payload arrived but lacks the structure or fields we need.
    #[error("malformed response from food-data service: {0}")]
    MalformedResponse(String),
    #[error("unknown measure: {0}")]
    UnknownMeasure(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("missing credential: {0}")]
    MissingCredential(String),
}

impl FoodDataError {
    /// True when the request itself failed and repeating it may succeed.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, FoodDataError::UpstreamUnavailable(_))
    }
}

impl From<reqwest::Error> for FoodDataError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries app_id/app_key.
        FoodDataError::UpstreamUnavailable(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for FoodDataError {
    fn from(err: serde_json::Error) -> Self {
        FoodDataError::MalformedResponse(err.to_string())
    }
}

/// HTTP access to the food-data service. Every request goes through the
/// shared [`RequestCache`]; there is no uncached entry point.
#[derive(Clone)]
pub struct Connection {
    http: Client,
    base_url: String,
    app_id: String,
    app_key: String,
    cache: Arc<RequestCache>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("cached_responses", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(config: &FoodDataConfig, cache: Arc<RequestCache>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_key: config.app_key.clone(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<RequestCache> {
        &self.cache
    }

    /// GET `path` with `query`; credentials are appended here and kept out
    /// of the cache signature.
    pub async fn get_cached(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FoodDataError> {
        let signature = RequestCache::get_signature(&self.base_url, path, query);
        if let Some(body) = self.cache.get(&signature) {
            debug!(%path, "cache hit");
            return Ok(body);
        }

        debug!(%path, "cache miss, sending GET");
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .http
            .get(url)
            .query(&self.credentials())
            .query(query);
        let body = Self::send(request).await?;
        self.cache.insert(signature, body.clone());
        Ok(body)
    }

    pub async fn post_cached<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<String, FoodDataError> {
        let body_json = serde_json::to_string(payload)
            .map_err(|e| FoodDataError::InvalidRequest(format!("cannot encode body: {}", e)))?;
        let signature = RequestCache::post_signature(&self.base_url, path, &body_json);
        if let Some(body) = self.cache.get(&signature) {
            debug!(%path, "cache hit");
            return Ok(body);
        }

        debug!(%path, "cache miss, sending POST");
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .http
            .post(url)
            .query(&self.credentials())
            .header("Content-Type", "application/json")
            .body(body_json);
        let body = Self::send(request).await?;
        self.cache.insert(signature, body.clone());
        Ok(body)
    }

    fn credentials(&self) -> [(&'static str, &str); 2] {
        [("app_id", self.app_id.as_str()), ("app_key", self.app_key.as_str())]
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<String, FoodDataError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.text().await?)
        } else {
            // The body is dropped: auth errors may echo the credentials back.
            warn!(%status, "food-data service returned an error status");
            Err(FoodDataError::UpstreamUnavailable(format!("status {}", status)))
        }
    }
}
