//! Endpoint lifecycle handlers for the control listener.
//!
//! Each registered path maps 1:1 to an operation on the managed network.
//! Handler bodies run on the listener's serving path and block on fabric
//! calls; operations on the same endpoint are serialized by the network
//! lock.

use crate::listener::{decode, encode, handler, ApiError, HandlerResult, Listener};
use axum::http::StatusCode;
use bytes::Bytes;
use lanyard_core::{EndpointSpec, NetError, Network};
use lanyard_fabric::Fabric;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Listener paths for the endpoint operations.
pub mod paths {
    /// Provision an endpoint; body is an `EndpointSpec`.
    pub const PROVISION: &str = "/network/endpoint/provision";
    /// Deprovision an endpoint; body names the endpoint id.
    pub const DEPROVISION: &str = "/network/endpoint/deprovision";
    /// Fabric-side metadata for an endpoint.
    pub const DESCRIBE: &str = "/network/endpoint/describe";
    /// Identifiers of all provisioned endpoints.
    pub const LIST: &str = "/network/endpoint/list";
}

/// Shared state behind the endpoint handlers.
#[derive(Clone)]
pub struct AppState {
    /// The managed network; the lock serializes table mutation.
    pub network: Arc<Mutex<Network>>,
    /// Client to the host network fabric.
    pub fabric: Arc<dyn Fabric>,
}

/// Request body naming an endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointIdRequest {
    /// Internal endpoint identifier.
    #[serde(rename = "EndpointID")]
    pub endpoint_id: String,
}

/// Response for the list operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    /// Internal endpoint identifiers.
    #[serde(rename = "EndpointIDs")]
    pub endpoint_ids: Vec<String>,
}

fn api_error(err: NetError) -> ApiError {
    match err {
        NetError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
        NetError::Fabric(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
        NetError::Json(_) => ApiError::internal(err.to_string()),
    }
}

async fn provision(state: AppState, body: Bytes) -> HandlerResult {
    let spec: EndpointSpec = decode(&body)?;
    let mut network = state.network.lock().await;
    let record = network
        .provision(state.fabric.as_ref(), &spec)
        .await
        .map_err(api_error)?;
    encode(&record)
}

async fn deprovision(state: AppState, body: Bytes) -> HandlerResult {
    let request: EndpointIdRequest = decode(&body)?;
    let mut network = state.network.lock().await;
    network
        .deprovision(state.fabric.as_ref(), &request.endpoint_id)
        .await
        .map_err(api_error)?;
    encode(&serde_json::json!({}))
}

async fn describe(state: AppState, body: Bytes) -> HandlerResult {
    let request: EndpointIdRequest = decode(&body)?;
    let network = state.network.lock().await;
    let info = network.describe(&request.endpoint_id).map_err(api_error)?;
    encode(&info)
}

async fn list(state: AppState, _body: Bytes) -> HandlerResult {
    let network = state.network.lock().await;
    encode(&ListResponse {
        endpoint_ids: network.endpoint_ids(),
    })
}

/// Register all endpoint handlers on the listener.
pub async fn register_handlers(listener: &Listener, state: AppState) {
    let s = state.clone();
    listener
        .add_handler(
            paths::PROVISION,
            handler(move |body| {
                let s = s.clone();
                async move { provision(s, body).await }
            }),
        )
        .await;

    let s = state.clone();
    listener
        .add_handler(
            paths::DEPROVISION,
            handler(move |body| {
                let s = s.clone();
                async move { deprovision(s, body).await }
            }),
        )
        .await;

    let s = state.clone();
    listener
        .add_handler(
            paths::DESCRIBE,
            handler(move |body| {
                let s = s.clone();
                async move { describe(s, body).await }
            }),
        )
        .await;

    let s = state;
    listener
        .add_handler(
            paths::LIST,
            handler(move |body| {
                let s = s.clone();
                async move { list(s, body).await }
            }),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lanyard_fabric::{EndpointRequest, EndpointResponse, FabricError};

    struct FakeFabric {
        fail_attach: bool,
    }

    #[async_trait]
    impl Fabric for FakeFabric {
        async fn create_endpoint(
            &self,
            request: &EndpointRequest,
        ) -> lanyard_fabric::Result<EndpointResponse> {
            Ok(EndpointResponse {
                id: format!("fab-{}", request.name),
                mac_address: "00:15:5d:01:02:03".to_string(),
                gateway_address: "10.0.0.1".to_string(),
            })
        }

        async fn attach_endpoint(&self, _: &str, _: &str) -> lanyard_fabric::Result<()> {
            if self.fail_attach {
                return Err(FabricError::Subsystem {
                    status: 500,
                    message: "container not running".to_string(),
                });
            }
            Ok(())
        }

        async fn delete_endpoint(&self, _: &str) -> lanyard_fabric::Result<()> {
            Ok(())
        }

        async fn query_endpoint(&self, id: &str) -> lanyard_fabric::Result<EndpointResponse> {
            Ok(EndpointResponse {
                id: id.to_string(),
                ..Default::default()
            })
        }
    }

    fn state(fail_attach: bool) -> AppState {
        AppState {
            network: Arc::new(Mutex::new(Network::new("test", "net-1"))),
            fabric: Arc::new(FakeFabric { fail_attach }),
        }
    }

    fn spec_body() -> Bytes {
        Bytes::from(
            serde_json::to_vec(&serde_json::json!({
                "ContainerID": "0123456789abcdef",
                "NetNsPath": "none",
                "IfName": "eth0",
                "IPAddresses": ["10.0.0.9/24"]
            }))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_provision_handler() {
        let state = state(false);
        let value = provision(state.clone(), spec_body()).await.unwrap();

        assert_eq!(value["ID"], "01234567-eth0");
        assert_eq!(value["FabricID"], "fab-01234567-eth0");

        let listed = list(state, Bytes::new()).await.unwrap();
        assert_eq!(listed["EndpointIDs"][0], "01234567-eth0");
    }

    #[tokio::test]
    async fn test_provision_handler_attach_failure() {
        let err = provision(state(true), spec_body()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_provision_handler_rejects_empty_body() {
        let err = provision(state(false), Bytes::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deprovision_and_describe_handlers() {
        let state = state(false);
        provision(state.clone(), spec_body()).await.unwrap();

        let id_body = Bytes::from(
            serde_json::to_vec(&serde_json::json!({ "EndpointID": "01234567-eth0" })).unwrap(),
        );

        let info = describe(state.clone(), id_body.clone()).await.unwrap();
        assert_eq!(info["fabric_id"], "fab-01234567-eth0");

        deprovision(state.clone(), id_body.clone()).await.unwrap();

        let err = describe(state, id_body).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handlers_register() {
        let listener = crate::listener::Listener::new(crate::listener::Transport::Unix, "");
        register_handlers(&listener, state(false)).await;
    }
}
