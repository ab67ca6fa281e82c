//! Redis CRD
//!
//! An Azure Cache for Redis instance. It has no attribute referencers of its
//! own; its resource group and subnet are always given literally.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{ResourceSpec, ResourceStatus};

/// Redis is a managed resource that represents an Azure Redis cache.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cache.stratus.dev",
    version = "v1beta1",
    kind = "Redis",
    derive = "PartialEq",
    plural = "redis",
    status = "RedisStatus",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".status.redisVersion"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RedisSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Cache parameters
    #[serde(flatten)]
    pub parameters: RedisParameters,
}

/// Desired state of an Azure Redis cache
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedisParameters {
    /// Resource group that should contain this cache
    pub resource_group_name: String,

    /// Azure region of this cache
    pub location: String,

    /// SKU of the cache
    pub sku: RedisSku,

    /// Whether the non-SSL port (6379) is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_non_ssl_port: Option<bool>,

    /// Full ARM id of a subnet to deploy the cache into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Static IP address, required when deploying into a subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_ip: Option<String>,

    /// Number of shards on a Premium cluster cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<u32>,

    /// Redis settings such as maxmemory-policy
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub redis_configuration: BTreeMap<String, String>,
}

/// SKU of a Redis cache
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedisSku {
    /// SKU name: Basic, Standard or Premium
    pub name: String,

    /// SKU family: C (Basic/Standard) or P (Premium)
    pub family: String,

    /// Size of the cache
    pub capacity: u32,
}

/// Observed state of a Redis cache
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedisStatus {
    /// Common managed resource status
    #[serde(flatten)]
    pub resource_status: ResourceStatus,

    /// Provisioning state of the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Detail on the state, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// External id of the cache in Azure
    #[serde(rename = "providerID", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Hostname of the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Non-SSL port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// SSL port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_port: Option<u16>,

    /// Redis version running on the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_version: Option<String>,
}
