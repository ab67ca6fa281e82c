//! Subnet CRD
//!
//! Subnets are the source of the ARM resource id that virtual network rules
//! point at. The id only exists once Azure has created the subnet, so it lives
//! in status rather than spec.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ResourceSpec, ResourceStatus};

/// Subnet is a managed resource that represents an Azure virtual network subnet.
///
/// Example:
/// ```yaml
/// apiVersion: network.stratus.dev/v1alpha1
/// kind: Subnet
/// metadata:
///   name: sn-db
/// spec:
///   name: databases
///   virtualNetworkName: vnet-prod
///   resourceGroupName: prod-network
///   properties:
///     addressPrefix: 10.0.1.0/24
///     serviceEndpoints:
///       - service: Microsoft.Sql
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "network.stratus.dev",
    version = "v1alpha1",
    kind = "Subnet",
    derive = "PartialEq",
    status = "SubnetStatus",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Prefix","type":"string","jsonPath":".spec.properties.addressPrefix"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Name of the subnet in Azure
    pub name: String,

    /// Virtual network the subnet belongs to
    pub virtual_network_name: String,

    /// Resource group of the virtual network
    pub resource_group_name: String,

    /// Subnet properties
    pub properties: SubnetProperties,
}

/// Properties of a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// Address prefix in CIDR notation
    pub address_prefix: String,

    /// Service endpoints enabled on the subnet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoints: Vec<ServiceEndpoint>,
}

/// A service endpoint on a subnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Service type, e.g. "Microsoft.Sql"
    pub service: String,
}

/// Subnet status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    /// Common managed resource status
    #[serde(flatten)]
    pub resource_status: ResourceStatus,

    /// Provisioning state of the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Detail on the state, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Unique string that changes whenever the resource is updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// ARM resource id of the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Purpose of the subnet as reported by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl Subnet {
    /// ARM resource id, once Azure has allocated one
    pub fn arm_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}
