//! Custom Resource Definitions for Stratus
//!
//! Managed resources mirror Azure objects. Every one of them embeds the
//! common `ResourceSpec`/`ResourceStatus` blocks and implements [`Managed`].

mod managed;
mod redis;
mod resource_group;
mod sql_server;
mod subnet;
mod types;
mod vnet_rule;

pub use managed::{external_name, Managed, ManagedKind, ManagedMut, ManagedObject};
pub use redis::{Redis, RedisParameters, RedisSku, RedisSpec, RedisStatus};
pub use resource_group::{ResourceGroup, ResourceGroupSpec, ResourceGroupStatus};
pub use sql_server::{
    MysqlServer, MysqlServerSpec, PostgresqlServer, PostgresqlServerSpec, PricingTierSpec,
    SqlEngine, SqlServerClass, SqlServerClassSpec, SqlServerClassSpecTemplate,
    SqlServerParameters, SqlServerStatus, StorageProfileSpec,
};
pub use subnet::{ServiceEndpoint, Subnet, SubnetProperties, SubnetSpec, SubnetStatus};
pub use types::{
    BindingPhase, ClassSpecTemplate, Condition, ConditionStatus, DeletionPolicy, ObjectReference,
    ReclaimPolicy, Reference, ResourceSpec, ResourceStatus, SecretReference,
    REASON_AVAILABLE, REASON_CREATING, REASON_DELETING, REASON_RECONCILE_ERROR,
    REASON_RECONCILE_SUCCESS, REASON_REFERENCE_RESOLUTION_BLOCKED,
    REASON_REFERENCE_RESOLUTION_SUCCESS, REASON_UNAVAILABLE, TYPE_READY,
    TYPE_REFERENCES_RESOLVED, TYPE_SYNCED,
};
pub use vnet_rule::{
    MysqlServerVirtualNetworkRule, MysqlVirtualNetworkRuleSpec,
    PostgresqlServerVirtualNetworkRule, PostgresqlVirtualNetworkRuleSpec,
    VirtualNetworkRuleProperties, VirtualNetworkRuleStatus,
};
