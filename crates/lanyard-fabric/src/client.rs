//! Fabric client trait and the HTTP-over-Unix-socket implementation.

use crate::error::{FabricError, Result};
use crate::types::{EndpointRequest, EndpointResponse};
use async_trait::async_trait;
use hyper::{Body, Client, Method, Request};
use hyperlocal::{UnixClientExt, Uri};
use serde_json::json;
use std::path::PathBuf;

/// Operations offered by the host network subsystem.
///
/// The fabric is the system of record for endpoint existence; lanyard holds
/// only an in-memory cache of what it provisioned. Implementations must be
/// safe to share across tasks.
#[async_trait]
pub trait Fabric: Send + Sync {
    /// Create an endpoint and return its fabric-assigned identity.
    async fn create_endpoint(&self, request: &EndpointRequest) -> Result<EndpointResponse>;

    /// Attach an existing endpoint to a running container.
    async fn attach_endpoint(&self, container_id: &str, endpoint_id: &str) -> Result<()>;

    /// Delete an endpoint.
    async fn delete_endpoint(&self, endpoint_id: &str) -> Result<()>;

    /// Query fabric-side metadata for an endpoint.
    async fn query_endpoint(&self, endpoint_id: &str) -> Result<EndpointResponse>;
}

/// HTTP+JSON fabric client over the service's Unix-domain API socket.
///
/// Requests carry no deadline; retry policy, if any, belongs to the caller's
/// layer.
pub struct HttpFabric {
    socket_path: PathBuf,
}

impl HttpFabric {
    /// Create a client for the fabric service listening at `socket_path`.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
    ) -> Result<hyper::body::Bytes> {
        tracing::debug!(method = %method, endpoint = %endpoint, "Fabric request");
        if let Some(ref body) = body {
            tracing::trace!(body = %body, "Fabric request body");
        }

        let uri: hyper::Uri = Uri::new(&self.socket_path, endpoint).into();
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| FabricError::RequestBuild(e.to_string()))?;

        let client = Client::unix();
        let response = client.request(request).await.map_err(|e| {
            tracing::error!(error = %e, "Fabric request failed");
            FabricError::Transport(e.to_string())
        })?;

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| FabricError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&bytes).into_owned();
            tracing::error!(status = %status, message = %message, "Fabric reported an error");
            return Err(FabricError::Subsystem {
                status: status.as_u16(),
                message,
            });
        }

        tracing::trace!(body_len = bytes.len(), "Fabric response body received");
        Ok(bytes)
    }
}

#[async_trait]
impl Fabric for HttpFabric {
    async fn create_endpoint(&self, request: &EndpointRequest) -> Result<EndpointResponse> {
        let body = serde_json::to_string(request)?;
        let bytes = self
            .request(Method::POST, "/endpoints", Some(body))
            .await?;
        let response: EndpointResponse = serde_json::from_slice(&bytes)?;
        tracing::debug!(name = %request.name, fabric_id = %response.id, "Fabric endpoint created");
        Ok(response)
    }

    async fn attach_endpoint(&self, container_id: &str, endpoint_id: &str) -> Result<()> {
        let body = json!({ "ContainerID": container_id }).to_string();
        self.request(
            Method::POST,
            &format!("/endpoints/{endpoint_id}/attach"),
            Some(body),
        )
        .await?;
        tracing::debug!(endpoint_id = %endpoint_id, container_id = %container_id, "Fabric endpoint attached");
        Ok(())
    }

    async fn delete_endpoint(&self, endpoint_id: &str) -> Result<()> {
        self.request(Method::DELETE, &format!("/endpoints/{endpoint_id}"), None)
            .await?;
        tracing::debug!(endpoint_id = %endpoint_id, "Fabric endpoint deleted");
        Ok(())
    }

    async fn query_endpoint(&self, endpoint_id: &str) -> Result<EndpointResponse> {
        let bytes = self
            .request(Method::GET, &format!("/endpoints/{endpoint_id}"), None)
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
