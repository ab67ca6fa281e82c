//! MysqlServerVirtualNetworkRule and PostgresqlServerVirtualNetworkRule CRDs
//!
//! A virtual network rule lets a subnet reach a database server. All three of
//! its coordinates (server, resource group, subnet id) are usually owned by
//! other managed resources, so each can be given as a referencer.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ResourceSpec, ResourceStatus};
use crate::reference::{
    ResourceGroupNameReferencerForVirtualNetworkRule,
    ServerNameReferencerForMysqlServerVirtualNetworkRule,
    ServerNameReferencerForPostgresqlServerVirtualNetworkRule,
    SubnetIdReferencerForVirtualNetworkRule,
};

/// Properties of a virtual network rule
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleProperties {
    /// ARM resource id of the virtual network subnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub virtual_network_subnet_id: String,

    /// Reference to a Subnet to retrieve its id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet_id_ref: Option<SubnetIdReferencerForVirtualNetworkRule>,

    /// Create the rule before the subnet has the service endpoint enabled
    #[serde(default)]
    pub ignore_missing_vnet_service_endpoint: bool,
}

/// Observed state of a virtual network rule
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkRuleStatus {
    /// Common managed resource status
    #[serde(flatten)]
    pub resource_status: ResourceStatus,

    /// State of this virtual network rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Detail on the state, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Resource type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// MysqlServerVirtualNetworkRule is a managed resource that represents an
/// Azure MySQL database virtual network rule.
///
/// Example:
/// ```yaml
/// apiVersion: database.stratus.dev/v1alpha1
/// kind: MysqlServerVirtualNetworkRule
/// metadata:
///   name: orders-db-vnet
/// spec:
///   name: allow-app-subnet
///   serverNameRef:
///     name: orders-db
///   resourceGroupNameRef:
///     name: rg-prod
///   properties:
///     virtualNetworkSubnetIdRef:
///       name: sn-app
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.stratus.dev",
    version = "v1alpha1",
    kind = "MysqlServerVirtualNetworkRule",
    derive = "PartialEq",
    status = "VirtualNetworkRuleStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MysqlVirtualNetworkRuleSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Name of the virtual network rule
    pub name: String,

    /// Name of the rule's MysqlServer
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_name: String,

    /// Reference to the rule's MysqlServer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name_ref: Option<ServerNameReferencerForMysqlServerVirtualNetworkRule>,

    /// Name of the rule's resource group
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group_name: String,

    /// Reference to a ResourceGroup object to retrieve its name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<ResourceGroupNameReferencerForVirtualNetworkRule>,

    /// Rule properties
    pub properties: VirtualNetworkRuleProperties,
}

/// PostgresqlServerVirtualNetworkRule is a managed resource that represents
/// an Azure PostgreSQL database virtual network rule.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.stratus.dev",
    version = "v1alpha1",
    kind = "PostgresqlServerVirtualNetworkRule",
    derive = "PartialEq",
    status = "VirtualNetworkRuleStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlVirtualNetworkRuleSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Name of the virtual network rule
    pub name: String,

    /// Name of the rule's PostgresqlServer
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_name: String,

    /// Reference to the rule's PostgresqlServer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name_ref: Option<ServerNameReferencerForPostgresqlServerVirtualNetworkRule>,

    /// Name of the rule's resource group
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group_name: String,

    /// Reference to a ResourceGroup object to retrieve its name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<ResourceGroupNameReferencerForVirtualNetworkRule>,

    /// Rule properties
    pub properties: VirtualNetworkRuleProperties,
}
