//! HTTP client for the remote status store.
//!
//! # Responsibilities
//! - Map update/create/list/delete onto the store's REST API
//! - Attach the API key and schema version to every request
//! - Turn a 4xx on update into a distinguishable "not found"
//!
//! # Design Decisions
//! - Every request carries the client-wide timeout
//! - No retries here; the next cycle is the retry
//! - DELETE of an already-missing record counts as success

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderName;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::config::StoreConfig;
use crate::store::types::{
    CreateStatusBody, RemoteStatusRecord, StoreError, StoreResult, UpdateStatusBody, SCHEMA_HEADER,
    STATUS_SCHEMA_VERSION,
};
use crate::store::{DeleteStatus, ListStatuses, UpsertStatus};

const COLLECTION: &str = "container_status";

/// Status store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusStore {
    base_url: Url,
    api_key: String,
    api_key_header: HeaderName,
    client: reqwest::Client,
}

impl HttpStatusStore {
    /// Build a client from configuration.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::Config(format!("base_url '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let api_key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| StoreError::Config(format!("api_key_header: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("container-pinger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            api_key_header,
            client,
        })
    }

    /// `{base}/container_status[/{address}]`
    fn endpoint(&self, address: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Config(format!("base_url '{}' cannot carry a path", self.base_url)))?;
            segments.pop_if_empty().push(COLLECTION);
            if let Some(address) = address {
                segments.push(address);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(self.api_key_header.clone(), self.api_key.as_str())
            .header(SCHEMA_HEADER, STATUS_SCHEMA_VERSION)
    }

    async fn status_error(response: Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Status { status, body }
    }
}

#[async_trait]
impl UpsertStatus for HttpStatusStore {
    async fn update(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()> {
        let body = UpdateStatusBody {
            ping_time: latency_us,
            last_successful_ping: Utc::now(),
            name,
            state,
        };

        let response = self
            .request(Method::PATCH, self.endpoint(Some(address))?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(address, latency_us, "Status record updated");
            Ok(())
        } else if status.is_client_error() {
            Err(StoreError::NotFound(address.to_string()))
        } else {
            Err(Self::status_error(response).await)
        }
    }

    async fn create(&self, address: &str, latency_us: i64, name: &str, state: &str) -> StoreResult<()> {
        let body = CreateStatusBody {
            ip_address: address,
            ping_time: latency_us,
            last_successful_ping: Utc::now(),
            name,
            state,
        };

        let response = self
            .request(Method::POST, self.endpoint(None)?)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(address, latency_us, "Status record created");
            Ok(())
        } else {
            Err(Self::status_error(response).await)
        }
    }
}

#[async_trait]
impl ListStatuses for HttpStatusStore {
    async fn list(&self) -> StoreResult<Vec<RemoteStatusRecord>> {
        let response = self.request(Method::GET, self.endpoint(None)?).send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DeleteStatus for HttpStatusStore {
    async fn delete(&self, address: &str) -> StoreResult<()> {
        let response = self
            .request(Method::DELETE, self.endpoint(Some(address))?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!(address, "Status record already gone");
                Ok(())
            }
            _ => Err(Self::status_error(response).await),
        }
    }
}
