//! Integration tests for the control listener.
//!
//! Runs a real listener on a Unix-domain socket in a temp directory and
//! drives the endpoint operations over HTTP, the way a container runtime
//! plugin shim would.

use async_trait::async_trait;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyperlocal::{UnixClientExt, Uri};
use lanyard_core::Network;
use lanyard_ctl::api::paths;
use lanyard_ctl::{register_handlers, AppState, Listener, ListenerState, Transport};
use lanyard_fabric::{EndpointRequest, EndpointResponse, Fabric};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

struct StaticFabric;

#[async_trait]
impl Fabric for StaticFabric {
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

async fn post(socket: &Path, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let uri: hyper::Uri = Uri::new(socket, path).into();
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty))
        .expect("request builds");

    let response = Client::unix().request(request).await.expect("request sent");
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("body read");
    let value = serde_json::from_slice(&bytes).expect("body is JSON");
    (status, value)
}

async fn start_listener(stem: &Path) -> Listener {
    let state = AppState {
        network: Arc::new(Mutex::new(Network::new("test", "net-1"))),
        fabric: Arc::new(StaticFabric),
    };

    let mut listener = Listener::new(Transport::Unix, &stem.to_string_lossy());
    register_handlers(&listener, state).await;

    let (err_tx, _err_rx) = mpsc::channel(1);
    listener.start(err_tx).await.expect("listener starts");
    assert_eq!(listener.state(), ListenerState::Listening);
    listener
}

fn socket_stem(test: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("lanyard-{}-{}", test, std::process::id()))
}

#[tokio::test]
async fn test_endpoint_lifecycle_over_socket() {
    let stem = socket_stem("lifecycle");
    let mut listener = start_listener(&stem).await;
    let socket = Path::new(listener.local_address()).to_path_buf();

    // Provision.
    let spec = json!({
        "ContainerID": "0123456789abcdef",
        "NetNsPath": "none",
        "IfName": "eth0",
        "IPAddresses": ["10.0.0.9/24"],
        "DNS": { "Suffix": "cluster.local", "Servers": ["10.0.0.2"] }
    });
    let (status, record) = post(&socket, paths::PROVISION, Some(spec)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["ID"], "01234567-eth0");
    assert_eq!(record["FabricID"], "fab-01234567-eth0");
    assert_eq!(record["MacAddress"], "00:15:5d:01:02:03");
    assert_eq!(record["Gateways"][0], "10.0.0.1");

    // Describe.
    let id_body = json!({ "EndpointID": "01234567-eth0" });
    let (status, info) = post(&socket, paths::DESCRIBE, Some(id_body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["fabric_id"], "fab-01234567-eth0");

    // List.
    let (status, listed) = post(&socket, paths::LIST, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["EndpointIDs"][0], "01234567-eth0");

    // Deprovision, then the endpoint is gone.
    let (status, _) = post(&socket, paths::DEPROVISION, Some(id_body.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = post(&socket, paths::DESCRIBE, Some(id_body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["Err"].as_str().unwrap().contains("not found"));

    listener.stop();
    assert!(!socket.exists(), "socket file removed on stop");
}

#[tokio::test]
async fn test_empty_body_yields_client_error_envelope() {
    let stem = socket_stem("empty-body");
    let mut listener = start_listener(&stem).await;
    let socket = Path::new(listener.local_address()).to_path_buf();

    let (status, err) = post(&socket, paths::PROVISION, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["Err"].as_str().unwrap().contains("empty"));

    listener.stop();
}

#[tokio::test]
async fn test_unknown_path_yields_not_found_envelope() {
    let stem = socket_stem("unknown-path");
    let mut listener = start_listener(&stem).await;
    let socket = Path::new(listener.local_address()).to_path_buf();

    let (status, err) = post(&socket, "/no/such/path", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["Err"].as_str().unwrap().contains("/no/such/path"));

    listener.stop();
}
