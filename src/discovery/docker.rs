//! Docker Engine discovery adapter.
//!
//! # Responsibilities
//! - Speak HTTP/1.1 to the Engine API over its unix socket
//! - List containers and map them to targets
//! - Bound the whole call with a fixed timeout

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::UnixStream;
use tokio::time;

use crate::config::DiscoveryConfig;
use crate::discovery::{Discover, DiscoveryError, Target};

/// Container listings beyond this size are rejected.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// One entry of `GET /containers/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSettings {
    #[serde(default)]
    networks: BTreeMap<String, EndpointSettings>,
}

#[derive(Debug, Deserialize)]
struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: String,
}

impl ContainerSummary {
    fn into_target(self) -> Target {
        // Networks are ordered by name; the first attached address wins.
        let address = self
            .network_settings
            .and_then(|settings| {
                settings
                    .networks
                    .into_values()
                    .map(|endpoint| endpoint.ip_address)
                    .find(|ip| !ip.is_empty())
            })
            .unwrap_or_default();

        let name = self
            .names
            .into_iter()
            .next()
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_default();

        Target {
            address,
            name,
            state: self.state,
        }
    }
}

/// Lists containers from a local Docker Engine.
#[derive(Debug, Clone)]
pub struct DockerDiscovery {
    socket_path: PathBuf,
    timeout: Duration,
    all: bool,
}

impl DockerDiscovery {
    /// Create a new adapter. Fails if no socket path is configured.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if config.socket_path.trim().is_empty() {
            return Err(DiscoveryError::Config("socket path is empty".to_string()));
        }

        Ok(Self {
            socket_path: PathBuf::from(&config.socket_path),
            timeout: Duration::from_secs(config.timeout_secs),
            all: config.all,
        })
    }

    fn list_uri(&self) -> &'static str {
        if self.all {
            "/containers/json?all=true"
        } else {
            "/containers/json"
        }
    }

    async fn fetch(&self) -> Result<Vec<ContainerSummary>, DiscoveryError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| DiscoveryError::Connect {
                path: self.socket_path.display().to_string(),
                source,
            })?;

        let (mut sender, connection) =
            hyper::client::conn::http1::handshake::<_, Body>(TokioIo::new(stream))
                .await
                .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Runtime connection closed with error");
            }
        });

        let request = Request::builder()
            .method("GET")
            .uri(self.list_uri())
            .header(header::HOST, "docker")
            .header(header::USER_AGENT, "container-pinger")
            .body(Body::empty())
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Discover for DockerDiscovery {
    async fn list(&self) -> Result<Vec<Target>, DiscoveryError> {
        let containers = time::timeout(self.timeout, self.fetch())
            .await
            .map_err(|_| DiscoveryError::Timeout(self.timeout.as_secs()))??;

        tracing::debug!(count = containers.len(), "Runtime listed containers");

        Ok(containers
            .into_iter()
            .map(ContainerSummary::into_target)
            .collect())
    }
}
