//! Wire types for the fabric endpoint API.
//!
//! Field names follow the fabric service's PascalCase JSON schema.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Endpoint creation request sent to the fabric service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRequest {
    /// Endpoint name, derived from the owning container's identity.
    #[serde(rename = "Name")]
    pub name: String,

    /// Fabric identifier of the virtual network the endpoint joins.
    #[serde(rename = "VirtualNetwork")]
    pub virtual_network: String,

    /// DNS suffix for the endpoint.
    #[serde(rename = "DNSSuffix")]
    pub dns_suffix: String,

    /// Comma-joined DNS server list.
    #[serde(rename = "DNSServerList")]
    pub dns_server_list: String,

    /// Packaged policy rules, opaque to lanyard.
    #[serde(rename = "Policies")]
    pub policies: Vec<serde_json::Value>,

    /// The fabric supports a single address per endpoint.
    #[serde(rename = "IPAddress", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,

    /// Prefix length for `ip_address`.
    #[serde(rename = "PrefixLength", skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Fabric response for endpoint create and query calls.
///
/// MAC and gateway come back as text and may be malformed; callers decide
/// how tolerant to be when parsing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointResponse {
    /// Fabric-assigned endpoint identifier.
    #[serde(rename = "ID")]
    pub id: String,

    /// Hardware address assigned by the fabric.
    #[serde(rename = "MacAddress", default)]
    pub mac_address: String,

    /// Gateway address assigned by the fabric.
    #[serde(rename = "GatewayAddress", default)]
    pub gateway_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_request_serialization() {
        let request = EndpointRequest {
            name: "abc12345-eth0".to_string(),
            virtual_network: "net-1".to_string(),
            dns_suffix: "cluster.local".to_string(),
            dns_server_list: "10.0.0.2,10.0.0.3".to_string(),
            policies: vec![],
            ip_address: Some("10.0.0.9".parse().unwrap()),
            prefix_length: Some(24),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"Name\":\"abc12345-eth0\""));
        assert!(json.contains("\"VirtualNetwork\":\"net-1\""));
        assert!(json.contains("\"DNSServerList\":\"10.0.0.2,10.0.0.3\""));
        assert!(json.contains("\"IPAddress\":\"10.0.0.9\""));
        assert!(json.contains("\"PrefixLength\":24"));
    }

    #[test]
    fn test_endpoint_request_omits_absent_address() {
        let request = EndpointRequest {
            name: "abc12345-eth0".to_string(),
            virtual_network: "net-1".to_string(),
            dns_suffix: String::new(),
            dns_server_list: String::new(),
            policies: vec![],
            ip_address: None,
            prefix_length: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("IPAddress"));
        assert!(!json.contains("PrefixLength"));
    }

    #[test]
    fn test_endpoint_response_defaults() {
        let response: EndpointResponse = serde_json::from_str(r#"{"ID":"ep-1"}"#).unwrap();
        assert_eq!(response.id, "ep-1");
        assert!(response.mac_address.is_empty());
        assert!(response.gateway_address.is_empty());
    }
}
