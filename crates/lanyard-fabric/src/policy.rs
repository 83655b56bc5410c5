//! Packaging of endpoint policies into fabric requests.
//!
//! Policy rule contents are opaque to lanyard and are carried through
//! verbatim. The only policy lanyard materializes itself is the VLAN tag.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// An opaque endpoint policy rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy(pub Value);

/// Package policy rules for an endpoint creation request.
///
/// Copies the opaque rules through and appends a VLAN policy object when a
/// tag is set.
pub fn serialize_policies(policies: &[Policy], vlan_id: Option<u16>) -> Vec<Value> {
    let mut packaged: Vec<Value> = policies.iter().map(|p| p.0.clone()).collect();

    if let Some(vlan) = vlan_id {
        packaged.push(json!({ "Type": "VLAN", "VLAN": vlan }));
    }

    packaged
}
