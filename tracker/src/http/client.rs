//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::errors::TrackerError;

/// Header carrying a per-request correlation id
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Connection settings for the resource manager endpoint
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Management endpoint, e.g. `https://management.azure.com`
    pub base_url: String,

    /// Subscription that owns the resource groups
    pub subscription_id: String,

    /// Value of the `api-version` query parameter
    pub api_version: String,

    /// Bearer token sent with every request
    pub token: SecretString,

    /// Per-request timeout
    pub timeout: Duration,
}

/// HTTP client for the resource manager API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    subscription_id: String,
    api_version: String,
    token: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &ClientOptions) -> Result<Self, TrackerError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        let base_url = Url::parse(options.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(TrackerError::ConfigError(format!(
                "invalid base URL: {}",
                options.base_url
            )));
        }
        if options.subscription_id.is_empty() {
            return Err(TrackerError::ConfigError(
                "subscription id is required".to_string(),
            ));
        }

        Ok(Self {
            client,
            base_url,
            subscription_id: options.subscription_id.clone(),
            api_version: options.api_version.clone(),
            token: options.token.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build a URL below `/subscriptions/{id}/resourcegroups/{group}`.
    ///
    /// Segments are percent-encoded and the `api-version` query is appended.
    pub fn resource_group_url(
        &self,
        resource_group: &str,
        segments: &[&str],
    ) -> Result<Url, TrackerError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                TrackerError::ConfigError(format!("invalid base URL: {}", self.base_url))
            })?;
            path.pop_if_empty()
                .extend(["subscriptions", self.subscription_id.as_str()])
                .extend(["resourcegroups", resource_group])
                .extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, TrackerError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!("GET {} ({})", url, request_id);

        let response = self
            .client
            .get(url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .header(CLIENT_REQUEST_ID_HEADER, request_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET {} failed: {} - {}", url, status, body);
            return Err(TrackerError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok(body)
    }
}
