//! # lanyard-fabric
//!
//! Client boundary to the host network fabric service.
//!
//! The fabric is the host-level subsystem that materializes virtual switches
//! and endpoints for container sandboxes. lanyard never manipulates host
//! networking directly; every operation goes through the [`Fabric`] trait,
//! which makes the service injectable and lets tests substitute a fake.
//!
//! [`HttpFabric`] is the production implementation, speaking HTTP+JSON over
//! the service's Unix-domain API socket.

mod client;
mod error;
mod policy;
mod types;

pub use client::{Fabric, HttpFabric};
pub use error::{FabricError, Result};
pub use policy::{serialize_policies, Policy};
pub use types::{EndpointRequest, EndpointResponse};
