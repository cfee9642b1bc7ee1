//! `OmdbClient` - OMDb API client implementation.

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::lookup::get_by_imdb_id;
use super::search::{MovieSearch, search_movies};
use super::types::{OmdbMovie, RawResponse};

/// Default base URL for the OMDb API.
const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// Reserved query parameter carrying the API key.
const API_KEY_PARAM: &str = "apikey";

/// OMDb API client.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Endpoint every request is sent to.
    base_url: Url,
    /// OMDb API key.
    api_key: String,
}

/// Builder for `OmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl OmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets a per-request timeout (default: none).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<OmdbClient, OmdbError> {
        let api_key = self
            .api_key
            .ok_or_else(|| OmdbError::Builder(String::from("api_key is required")))?;
        let user_agent = self
            .user_agent
            .ok_or_else(|| OmdbError::Builder(String::from("user_agent is required")))?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| OmdbError::Builder(format!("invalid default base URL: {e}")))?
        };

        let mut builder = Client::builder().user_agent(&user_agent).gzip(true);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| OmdbError::Builder(format!("failed to build HTTP client: {e}")))?;

        Ok(OmdbClient {
            http_client,
            base_url,
            api_key,
        })
    }
}

impl OmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> OmdbClientBuilder {
        OmdbClientBuilder::new()
    }

    /// Fetches full details for one movie by its IMDb ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a JSON object.
    pub async fn get_by_imdb_id(&self, imdb_id: &str) -> Result<OmdbMovie, OmdbError> {
        get_by_imdb_id(self, imdb_id).await
    }

    /// Searches movies by title, fetching result pages as they are consumed.
    #[must_use]
    pub fn search(&self, text: &str) -> MovieSearch<'_, Self> {
        search_movies(self, text)
    }
}

impl LocalOmdbApi for OmdbClient {
    #[instrument(skip_all)]
    async fn make_request(&self, params: &[(&str, String)]) -> Result<RawResponse, OmdbError> {
        let mut query: Vec<(&str, &str)> = params
            .iter()
            .filter(|(key, _)| *key != API_KEY_PARAM)
            .map(|(key, value)| (*key, value.as_str()))
            .collect();

        tracing::debug!(url = %self.base_url, params = ?query, "OMDb API request");

        query.push((API_KEY_PARAM, self.api_key.as_str()));

        let response = self
            .http_client
            .get(self.base_url.clone())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(OmdbError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        tracing::trace!(body_len = body.len(), "OMDb response body received");

        let raw: RawResponse = serde_json::from_str(&body)?;
        Ok(raw)
    }
}
