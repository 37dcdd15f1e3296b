// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! REST client for the production-tracking backend.
//!
//! Every endpoint lives under `<api_url>/api`. The stored session token, when
//! there is one, is sent as a bearer token. Network failures and 5xx answers
//! get exactly one retry; anything else is returned to the caller at once.
//!
//! Endpoint groups are implemented as `impl ApiClient` blocks in the
//! submodules so the transport stays in one place.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use optrack::api::ApiClient;
//! # use optrack::config::AppConfig;
//! # use optrack::session::MemoryCredentialStore;
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new(&AppConfig::default(), Arc::new(MemoryCredentialStore::new()))?;
//! client.login("ana", "secreto1").await?;
//! for team in client.list_teams().await? {
//!     println!("{} ({} persons)", team.name, team.num_persons);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod products;
pub mod reports;
pub mod teams;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::CredentialStore;

pub use auth::login_error_message;

/// First attempt plus one retry.
const MAX_ATTEMPTS: u32 = 2;

/// Pause before the retry.
const RETRY_DELAY_MS: u64 = 500;

/// Query string pairs.
pub type Query<'a> = &'a [(&'a str, String)];

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    store: Arc<dyn CredentialStore>,
    retry_delay: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.store.is_authenticated())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &AppConfig, store: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        let base = config.api_base();
        let base_url = Url::parse(&base).map_err(|_| ApiError::InvalidUrl(base.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("optrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            store,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Override the pause before the retry (tests use zero).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Build the URL for `segments` below the base. Each segment is
    /// percent-encoded, so user input can go straight into a path.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, segments, &[], None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: Query<'_>,
    ) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, segments, query, None).await
    }

    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, segments, &[], Some(body)).await
    }

    pub async fn put<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, segments, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        self.request::<(), T>(Method::DELETE, segments, &[], None).await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        query: Query<'_>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let text = self.send_with_retry(&method, url, query, body).await?;
        decode_body(&text)
    }

    async fn send_with_retry<B>(
        &self,
        method: &Method,
        url: Url,
        query: Query<'_>,
        body: Option<&B>,
    ) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(method, url.clone(), query, body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::debug!(
                        "REQUEST_RETRY | {} {} attempt={} error={}",
                        method,
                        url.path(),
                        attempt + 1,
                        e
                    );
                    sleep(self.retry_delay).await;
                }
                Err(e) => {
                    tracing::debug!("REQUEST_FAILED | {} {} error={}", method, url.path(), e);
                    return Err(e);
                }
            }
        }
    }

    async fn send_once<B>(
        &self,
        method: &Method,
        url: Url,
        query: Query<'_>,
        body: Option<&B>,
    ) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(credentials) = self.store.load() {
            request = request.bearer_auth(&credentials.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Network("request timed out".to_string())
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(ApiError::from_response(status.as_u16(), &text))
        }
    }
}

/// Decode a 2xx body. An empty body decodes like JSON `null`, so `()` and
/// `Option<T>` accept it.
fn decode_body<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryCredentialStore;
    use crate::types::Product;

    fn client(api_url: &str) -> ApiClient {
        let config = AppConfig { api_url: api_url.to_string(), ..AppConfig::default() };
        ApiClient::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap()
    }

    #[test]
    fn test_endpoint_appends_and_encodes_segments() {
        let client = client("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        let url = client.endpoint(&["users", "by-name", "ana maria"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users/by-name/ana%20maria");
        let url = client.endpoint(&["products", "by-op", "12/3"]).unwrap();
        assert_eq!(url.path(), "/api/products/by-op/12%2F3");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = AppConfig { api_url: "not a url".into(), ..AppConfig::default() };
        let err = ApiClient::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_decode_empty_body() {
        decode_body::<()>("").unwrap();
        assert_eq!(decode_body::<Option<Product>>("  ").unwrap(), None);
        assert!(matches!(decode_body::<Vec<Product>>(""), Err(ApiError::Decode(_))));
        assert!(matches!(decode_body::<Vec<Product>>("{oops"), Err(ApiError::Decode(_))));
    }
}
