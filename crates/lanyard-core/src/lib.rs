//! # lanyard-core
//!
//! Endpoint identity and lifecycle management for container sandboxes.
//!
//! A [`Network`] owns a table of provisioned endpoints and drives the
//! provisioning protocol against the host network fabric:
//!
//! 1. derive the endpoint identity from the container's identity and its
//!    namespace-sharing information;
//! 2. build the fabric creation request;
//! 3. create the endpoint in the fabric;
//! 4. attach it to the live container;
//! 5. record it in memory.
//!
//! If the attach step fails after the fabric endpoint was created, the
//! endpoint is deleted from the fabric before the attach error is returned,
//! so the fabric never retains an endpoint that failed to attach.
//!
//! Identity scheme: a workload container that joins the network namespace of
//! an infrastructure container encodes the owner in its namespace path
//! (`<path>:<infra-container-id>`). Both containers' endpoint names are
//! derived from 8-character short container ids plus the interface name, so
//! identical inputs always yield the identical endpoint id.

mod endpoint;
mod error;
mod mac;
mod network;

pub use endpoint::{
    build_endpoint_request, derive_endpoint_ids, DnsInfo, EndpointRecord, EndpointSpec, Route,
    VLAN_ID_KEY,
};
pub use error::{NetError, Result};
pub use mac::{MacAddr, MacParseError};
pub use network::Network;
