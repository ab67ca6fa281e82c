//! ResourceGroup CRD
//!
//! A ResourceGroup is the container every other Azure resource is created in.
//! Database servers and virtual network rules reference it by name.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ResourceSpec, ResourceStatus};

/// ResourceGroup is a managed resource that represents an Azure resource group.
///
/// Example:
/// ```yaml
/// apiVersion: stratus.dev/v1alpha1
/// kind: ResourceGroup
/// metadata:
///   name: rg-prod
/// spec:
///   name: prod-databases
///   location: westeurope
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "stratus.dev",
    version = "v1alpha1",
    kind = "ResourceGroup",
    derive = "PartialEq",
    status = "ResourceGroupStatus",
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Location","type":"string","jsonPath":".spec.location"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Name of the resource group in Azure
    pub name: String,

    /// Azure region the resource group lives in
    pub location: String,
}

/// ResourceGroup status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupStatus {
    /// Common managed resource status
    #[serde(flatten)]
    pub resource_status: ResourceStatus,

    /// Provisioning state reported by Azure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}
