//! Endpoint identity, specification, and record types.

use crate::mac::MacAddr;
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use lanyard_fabric::{serialize_policies, EndpointRequest, Policy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;

/// Vendor-data key carrying the VLAN tag, for callers that have not moved to
/// the typed `VlanID` field.
pub const VLAN_ID_KEY: &str = "VlanID";

/// Length of the container-id fragment used in endpoint names.
const SHORT_ID_LEN: usize = 8;

fn truncate(s: &str, max: usize) -> &str {
    s.get(..max).unwrap_or(s)
}

/// Derive the infrastructure and workload endpoint identifiers for a
/// container.
///
/// A workload container joining a namespace owned by an infrastructure
/// container encodes the owner's id in its namespace path as
/// `<path>:<infra-container-id>`. Only an exact two-part split triggers the
/// linking case; zero or two-plus `:` characters mean the container owns its
/// namespace, and the workload id comes back empty.
///
/// Container ids are truncated to their first 8 characters so endpoint names
/// stay human-readable and bounded.
pub fn derive_endpoint_ids(
    container_id: &str,
    netns_path: &str,
    if_name: &str,
) -> (String, String) {
    let short_id = truncate(container_id, SHORT_ID_LEN);

    let parts: Vec<&str> = netns_path.split(':').collect();
    if parts.len() == 2 {
        // Workload container: the linked infrastructure container id is the
        // second part.
        let linked_id = truncate(parts[1], SHORT_ID_LEN);
        (
            format!("{linked_id}-{if_name}"),
            format!("{short_id}-{if_name}"),
        )
    } else {
        (format!("{short_id}-{if_name}"), String::new())
    }
}

/// DNS configuration for an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsInfo {
    /// DNS suffix.
    #[serde(rename = "Suffix", default)]
    pub suffix: String,
    /// Ordered DNS server addresses.
    #[serde(rename = "Servers", default)]
    pub servers: Vec<String>,
}

/// A static route programmed for an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination prefix.
    #[serde(rename = "Dst")]
    pub destination: IpNet,
    /// Next-hop gateway.
    #[serde(rename = "Gw")]
    pub gateway: IpAddr,
}

/// Caller-supplied endpoint specification.
///
/// Transient: exists only for the duration of one provisioning call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Identifier of the container the endpoint belongs to.
    #[serde(rename = "ContainerID")]
    pub container_id: String,

    /// Network-namespace path, possibly linking to another container's
    /// namespace (see [`derive_endpoint_ids`]).
    #[serde(rename = "NetNsPath", default)]
    pub netns_path: String,

    /// Interface name inside the container.
    #[serde(rename = "IfName")]
    pub if_name: String,

    /// Desired addresses. The fabric carries at most one; extras are dropped
    /// when the creation request is built.
    #[serde(rename = "IPAddresses", default)]
    pub ip_addresses: Vec<IpNet>,

    /// DNS configuration.
    #[serde(rename = "DNS", default)]
    pub dns: DnsInfo,

    /// Static routes.
    #[serde(rename = "Routes", default)]
    pub routes: Vec<Route>,

    /// Opaque policy rules, packaged into the creation request.
    #[serde(rename = "Policies", default)]
    pub policies: Vec<Policy>,

    /// VLAN tag. Takes precedence over the `VlanID` vendor-data key.
    #[serde(rename = "VlanID", default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,

    /// Free-form vendor data for forward-compatible extension fields.
    #[serde(rename = "Data", default)]
    pub vendor_data: HashMap<String, Value>,

    /// Enable source NAT on the host for this endpoint.
    #[serde(rename = "EnableSnatOnHost", default)]
    pub enable_snat_on_host: bool,
}

impl EndpointSpec {
    /// Resolve the VLAN tag: the typed field wins, then the `VlanID`
    /// vendor-data key when it is an integer. Absence or a wrong type yields
    /// 0, never an error.
    pub fn resolved_vlan_id(&self) -> u16 {
        if let Some(vlan) = self.vlan_id {
            return vlan;
        }
        self.vendor_data
            .get(VLAN_ID_KEY)
            .and_then(Value::as_u64)
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(0)
    }
}

/// Build the fabric creation request for an endpoint specification.
///
/// The fabric supports a single address per endpoint, so only the first
/// entry of `ip_addresses` is carried; extras are deliberately dropped at
/// this boundary.
pub fn build_endpoint_request(network_fabric_id: &str, spec: &EndpointSpec) -> EndpointRequest {
    let (infra_id, _) = derive_endpoint_ids(&spec.container_id, &spec.netns_path, &spec.if_name);

    let vlan = spec.resolved_vlan_id();
    let mut request = EndpointRequest {
        name: infra_id,
        virtual_network: network_fabric_id.to_string(),
        dns_suffix: spec.dns.suffix.clone(),
        dns_server_list: spec.dns.servers.join(","),
        policies: serialize_policies(&spec.policies, (vlan != 0).then_some(vlan)),
        ip_address: None,
        prefix_length: None,
    };

    if let Some(first) = spec.ip_addresses.first() {
        request.ip_address = Some(first.addr());
        request.prefix_length = Some(first.prefix_len());
    }

    request
}

/// In-memory record of a provisioned endpoint.
///
/// The fabric id is non-empty only after a successful create call; no record
/// is ever built for a partially created endpoint. Records live as long as
/// the owning [`Network`](crate::Network)'s endpoint table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Internal identifier: the infrastructure endpoint name.
    #[serde(rename = "ID")]
    pub id: String,

    /// Fabric-assigned identifier.
    #[serde(rename = "FabricID")]
    pub fabric_id: String,

    /// Sandbox key: the container the endpoint is attached to.
    #[serde(rename = "SandboxKey")]
    pub sandbox_key: String,

    /// Interface name.
    #[serde(rename = "IfName")]
    pub if_name: String,

    /// Assigned addresses.
    #[serde(rename = "IPAddresses", default)]
    pub ip_addresses: Vec<IpNet>,

    /// Gateway addresses reported by the fabric.
    #[serde(rename = "Gateways", default)]
    pub gateways: Vec<IpAddr>,

    /// DNS configuration.
    #[serde(rename = "DNS", default)]
    pub dns: DnsInfo,

    /// VLAN tag, 0 if unset.
    #[serde(rename = "VlanID", default)]
    pub vlan_id: u16,

    /// Static routes.
    #[serde(rename = "Routes", default)]
    pub routes: Vec<Route>,

    /// Hardware address reported by the fabric, zero when unparsable.
    #[serde(rename = "MacAddress", default)]
    pub mac_address: MacAddr,

    /// Source NAT on host.
    #[serde(rename = "EnableSnatOnHost", default)]
    pub enable_snat_on_host: bool,

    /// When the endpoint was provisioned.
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
}
