//! Network object owning the endpoint table and the provisioning protocol.

use crate::endpoint::{build_endpoint_request, derive_endpoint_ids, EndpointRecord, EndpointSpec};
use crate::error::{NetError, Result};
use crate::mac::MacAddr;
use chrono::Utc;
use lanyard_fabric::Fabric;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;

/// A virtual network known to the fabric, with its table of provisioned
/// endpoints.
///
/// The table is this process's cache of fabric state; the fabric is the
/// system of record and nothing here is persisted across restarts.
///
/// # Concurrency
///
/// Provisioning provides no mutual exclusion per endpoint: interleaved
/// create/delete for the same identifier against the fabric has undefined
/// outcome, so concurrent operations on one container's endpoint must be
/// serialized by the caller. Sharing the network across tasks requires an
/// external lock around it.
pub struct Network {
    name: String,
    fabric_id: String,
    endpoints: HashMap<String, EndpointRecord>,
}

impl Network {
    /// Create a network handle for the fabric network `fabric_id`.
    pub fn new(name: impl Into<String>, fabric_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fabric_id: fabric_id.into(),
            endpoints: HashMap::new(),
        }
    }

    /// The network's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The network's fabric identifier.
    pub fn fabric_id(&self) -> &str {
        &self.fabric_id
    }

    /// Look up a provisioned endpoint.
    pub fn endpoint(&self, endpoint_id: &str) -> Option<&EndpointRecord> {
        self.endpoints.get(endpoint_id)
    }

    /// Identifiers of all provisioned endpoints.
    pub fn endpoint_ids(&self) -> Vec<String> {
        self.endpoints.keys().cloned().collect()
    }

    /// Provision an endpoint: create it in the fabric, attach it to the
    /// container, and record it.
    ///
    /// If the attach step fails after the fabric endpoint was created, the
    /// endpoint is deleted from the fabric before the attach error is
    /// returned, so the fabric never retains an endpoint that failed to
    /// attach. The rollback's own outcome is logged and never replaces the
    /// attach error.
    ///
    /// A crash between create and attach leaves an orphan in the fabric with
    /// no in-memory record; accepted limitation, no reconciliation sweep.
    pub async fn provision(
        &mut self,
        fabric: &dyn Fabric,
        spec: &EndpointSpec,
    ) -> Result<EndpointRecord> {
        let (infra_id, workload_id) =
            derive_endpoint_ids(&spec.container_id, &spec.netns_path, &spec.if_name);
        let request = build_endpoint_request(&self.fabric_id, spec);

        tracing::debug!(
            endpoint = %infra_id,
            network = %self.name,
            container_id = %spec.container_id,
            "Creating fabric endpoint"
        );
        let response = fabric.create_endpoint(&request).await?;

        tracing::debug!(
            endpoint = %infra_id,
            fabric_id = %response.id,
            "Attaching endpoint to container"
        );
        if let Err(attach_err) = fabric
            .attach_endpoint(&spec.container_id, &response.id)
            .await
        {
            tracing::warn!(
                fabric_id = %response.id,
                error = %attach_err,
                "Attach failed, rolling back created endpoint"
            );
            // The attach error is what the caller gets; a failed rollback
            // must not mask it.
            if let Err(delete_err) = fabric.delete_endpoint(&response.id).await {
                tracing::error!(
                    fabric_id = %response.id,
                    error = %delete_err,
                    "Rollback delete failed, endpoint may be orphaned in the fabric"
                );
            }
            return Err(attach_err.into());
        }

        // Attach succeeded, so a record is produced even when the fabric
        // reported unparsable addresses.
        let gateways: Vec<IpAddr> = response
            .gateway_address
            .parse()
            .ok()
            .into_iter()
            .collect();
        let mac_address = response.mac_address.parse().unwrap_or(MacAddr::ZERO);

        let record = EndpointRecord {
            id: infra_id.clone(),
            fabric_id: response.id,
            sandbox_key: spec.container_id.clone(),
            if_name: spec.if_name.clone(),
            ip_addresses: spec.ip_addresses.clone(),
            gateways,
            dns: spec.dns.clone(),
            vlan_id: spec.resolved_vlan_id(),
            routes: spec.routes.clone(),
            mac_address,
            enable_snat_on_host: spec.enable_snat_on_host,
            created_at: Utc::now(),
        };

        tracing::info!(
            endpoint = %record.id,
            fabric_id = %record.fabric_id,
            container_id = %record.sandbox_key,
            "Endpoint provisioned"
        );
        if !workload_id.is_empty() {
            tracing::debug!(
                endpoint = %record.id,
                workload_endpoint = %workload_id,
                "Workload container sharing infrastructure namespace"
            );
        }

        self.endpoints.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Delete an endpoint from the fabric and drop its record.
    ///
    /// On fabric failure the error is returned verbatim and the record is
    /// kept; callers must not assume the endpoint is gone.
    pub async fn deprovision(&mut self, fabric: &dyn Fabric, endpoint_id: &str) -> Result<()> {
        let record = self
            .endpoints
            .get(endpoint_id)
            .ok_or_else(|| NetError::NotFound(endpoint_id.to_string()))?;

        tracing::debug!(
            endpoint = %endpoint_id,
            fabric_id = %record.fabric_id,
            "Deleting fabric endpoint"
        );
        fabric.delete_endpoint(&record.fabric_id).await?;

        self.endpoints.remove(endpoint_id);
        tracing::info!(endpoint = %endpoint_id, "Endpoint deprovisioned");
        Ok(())
    }

    /// Fabric-side metadata for an endpoint.
    ///
    /// The mapping is additive: new fields may appear over time without
    /// breaking callers.
    pub fn describe(&self, endpoint_id: &str) -> Result<HashMap<String, Value>> {
        let record = self
            .endpoints
            .get(endpoint_id)
            .ok_or_else(|| NetError::NotFound(endpoint_id.to_string()))?;

        let mut info = HashMap::new();
        info.insert(
            "fabric_id".to_string(),
            Value::String(record.fabric_id.clone()),
        );
        Ok(info)
    }
}
