//! Managed resource accessors and the closed set of managed kinds
//!
//! Every CRD that represents an external Azure resource implements
//! [`Managed`], which gives uniform access to the fields shared through
//! `ResourceSpec`/`ResourceStatus`. [`ManagedKind`], [`ManagedMut`] and
//! [`ManagedObject`] enumerate those kinds so callers can dispatch with an
//! exhaustive `match` instead of runtime downcasting.

use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;

use super::redis::Redis;
use super::resource_group::ResourceGroup;
use super::sql_server::{MysqlServer, PostgresqlServer};
use super::subnet::Subnet;
use super::types::{Condition, DeletionPolicy, Reference, SecretReference, TYPE_READY};
use super::vnet_rule::{MysqlServerVirtualNetworkRule, PostgresqlServerVirtualNetworkRule};
use crate::{Error, EXTERNAL_NAME_ANNOTATION};

/// Uniform accessors for the fields every managed resource shares
pub trait Managed {
    /// All conditions currently recorded in status
    fn conditions(&self) -> &[Condition];

    /// Condition of the given type, or an `Unknown` one if unset
    fn get_condition(&self, type_: &str) -> Condition;

    /// Set conditions on status, creating status if absent
    fn set_conditions(&mut self, conditions: Vec<Condition>);

    /// Deletion policy of the external resource
    fn deletion_policy(&self) -> DeletionPolicy;

    /// Set the deletion policy of the external resource
    fn set_deletion_policy(&mut self, policy: DeletionPolicy);

    /// Provider configuration used to connect to the cloud API
    fn provider_config_reference(&self) -> Option<&Reference>;

    /// Set the provider configuration reference
    fn set_provider_config_reference(&mut self, reference: Option<Reference>);

    /// Provider used to connect to the cloud API
    #[deprecated(note = "use provider_config_reference")]
    fn provider_reference(&self) -> Option<&Reference>;

    /// Set the provider reference
    #[deprecated(note = "use set_provider_config_reference")]
    fn set_provider_reference(&mut self, reference: Option<Reference>);

    /// Secret to which connection details are written
    fn write_connection_secret_to_reference(&self) -> Option<&SecretReference>;

    /// Set the connection secret reference
    fn set_write_connection_secret_to_reference(&mut self, reference: Option<SecretReference>);

    /// Whether the `Ready` condition is `True`
    fn is_ready(&self) -> bool {
        self.get_condition(TYPE_READY).is_true()
    }
}

/// Implements [`Managed`] and the enum conversions for managed kinds.
///
/// Each kind must have `spec.resource_spec` and a `Default` status with a
/// `resource_status` field.
macro_rules! impl_managed {
    ($($kind:ident),+ $(,)?) => {
        $(
            impl Managed for $kind {
                fn conditions(&self) -> &[Condition] {
                    self.status
                        .as_ref()
                        .map(|s| s.resource_status.conditions.as_slice())
                        .unwrap_or(&[])
                }

                fn get_condition(&self, type_: &str) -> Condition {
                    self.status
                        .as_ref()
                        .map(|s| s.resource_status.get_condition(type_))
                        .unwrap_or_else(|| Condition::unknown(type_))
                }

                fn set_conditions(&mut self, conditions: Vec<Condition>) {
                    self.status
                        .get_or_insert_with(Default::default)
                        .resource_status
                        .set_conditions(conditions);
                }

                fn deletion_policy(&self) -> DeletionPolicy {
                    self.spec.resource_spec.deletion_policy
                }

                fn set_deletion_policy(&mut self, policy: DeletionPolicy) {
                    self.spec.resource_spec.deletion_policy = policy;
                }

                fn provider_config_reference(&self) -> Option<&Reference> {
                    self.spec.resource_spec.provider_config_ref.as_ref()
                }

                fn set_provider_config_reference(&mut self, reference: Option<Reference>) {
                    self.spec.resource_spec.provider_config_ref = reference;
                }

                fn provider_reference(&self) -> Option<&Reference> {
                    self.spec.resource_spec.provider_ref.as_ref()
                }

                fn set_provider_reference(&mut self, reference: Option<Reference>) {
                    self.spec.resource_spec.provider_ref = reference;
                }

                fn write_connection_secret_to_reference(&self) -> Option<&SecretReference> {
                    self.spec.resource_spec.write_connection_secret_to_ref.as_ref()
                }

                fn set_write_connection_secret_to_reference(
                    &mut self,
                    reference: Option<SecretReference>,
                ) {
                    self.spec.resource_spec.write_connection_secret_to_ref = reference;
                }
            }

            impl<'a> From<&'a mut $kind> for ManagedMut<'a> {
                fn from(resource: &'a mut $kind) -> Self {
                    ManagedMut::$kind(resource)
                }
            }

            impl From<$kind> for ManagedObject {
                fn from(resource: $kind) -> Self {
                    ManagedObject::$kind(resource)
                }
            }
        )+
    };
}

impl_managed!(
    ResourceGroup,
    Subnet,
    MysqlServer,
    PostgresqlServer,
    MysqlServerVirtualNetworkRule,
    PostgresqlServerVirtualNetworkRule,
    Redis,
);

/// Every managed resource kind Stratus knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManagedKind {
    /// Azure resource group
    ResourceGroup,
    /// Virtual network subnet
    Subnet,
    /// MySQL database server
    MysqlServer,
    /// PostgreSQL database server
    PostgresqlServer,
    /// MySQL virtual network rule
    MysqlServerVirtualNetworkRule,
    /// PostgreSQL virtual network rule
    PostgresqlServerVirtualNetworkRule,
    /// Redis cache
    Redis,
}

impl ManagedKind {
    /// All managed kinds
    pub const ALL: [ManagedKind; 7] = [
        Self::ResourceGroup,
        Self::Subnet,
        Self::MysqlServer,
        Self::PostgresqlServer,
        Self::MysqlServerVirtualNetworkRule,
        Self::PostgresqlServerVirtualNetworkRule,
        Self::Redis,
    ];

    /// Kind name as it appears in `kind:`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceGroup => "ResourceGroup",
            Self::Subnet => "Subnet",
            Self::MysqlServer => "MysqlServer",
            Self::PostgresqlServer => "PostgresqlServer",
            Self::MysqlServerVirtualNetworkRule => "MysqlServerVirtualNetworkRule",
            Self::PostgresqlServerVirtualNetworkRule => "PostgresqlServerVirtualNetworkRule",
            Self::Redis => "Redis",
        }
    }

    /// `apiVersion` the kind is served under
    pub fn api_version(self) -> String {
        match self {
            Self::ResourceGroup => ResourceGroup::api_version(&()).to_string(),
            Self::Subnet => Subnet::api_version(&()).to_string(),
            Self::MysqlServer => MysqlServer::api_version(&()).to_string(),
            Self::PostgresqlServer => PostgresqlServer::api_version(&()).to_string(),
            Self::MysqlServerVirtualNetworkRule => {
                MysqlServerVirtualNetworkRule::api_version(&()).to_string()
            }
            Self::PostgresqlServerVirtualNetworkRule => {
                PostgresqlServerVirtualNetworkRule::api_version(&()).to_string()
            }
            Self::Redis => Redis::api_version(&()).to_string(),
        }
    }
}

impl std::fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ManagedKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::serialization_for_kind(s, "not a managed resource kind"))
    }
}

/// Mutable borrow of any managed resource.
///
/// The destination of a referencer assignment. Referencers match on it and
/// reject every kind outside their binding with a type mismatch.
#[derive(Debug)]
pub enum ManagedMut<'a> {
    /// Azure resource group
    ResourceGroup(&'a mut ResourceGroup),
    /// Virtual network subnet
    Subnet(&'a mut Subnet),
    /// MySQL database server
    MysqlServer(&'a mut MysqlServer),
    /// PostgreSQL database server
    PostgresqlServer(&'a mut PostgresqlServer),
    /// MySQL virtual network rule
    MysqlServerVirtualNetworkRule(&'a mut MysqlServerVirtualNetworkRule),
    /// PostgreSQL virtual network rule
    PostgresqlServerVirtualNetworkRule(&'a mut PostgresqlServerVirtualNetworkRule),
    /// Redis cache
    Redis(&'a mut Redis),
}

impl ManagedMut<'_> {
    /// Kind of the borrowed resource
    pub fn kind(&self) -> ManagedKind {
        match self {
            Self::ResourceGroup(_) => ManagedKind::ResourceGroup,
            Self::Subnet(_) => ManagedKind::Subnet,
            Self::MysqlServer(_) => ManagedKind::MysqlServer,
            Self::PostgresqlServer(_) => ManagedKind::PostgresqlServer,
            Self::MysqlServerVirtualNetworkRule(_) => ManagedKind::MysqlServerVirtualNetworkRule,
            Self::PostgresqlServerVirtualNetworkRule(_) => {
                ManagedKind::PostgresqlServerVirtualNetworkRule
            }
            Self::Redis(_) => ManagedKind::Redis,
        }
    }
}

/// Owned value of any managed resource
#[derive(Clone, Debug, PartialEq)]
pub enum ManagedObject {
    /// Azure resource group
    ResourceGroup(ResourceGroup),
    /// Virtual network subnet
    Subnet(Subnet),
    /// MySQL database server
    MysqlServer(MysqlServer),
    /// PostgreSQL database server
    PostgresqlServer(PostgresqlServer),
    /// MySQL virtual network rule
    MysqlServerVirtualNetworkRule(MysqlServerVirtualNetworkRule),
    /// PostgreSQL virtual network rule
    PostgresqlServerVirtualNetworkRule(PostgresqlServerVirtualNetworkRule),
    /// Redis cache
    Redis(Redis),
}

impl ManagedObject {
    /// Kind of the resource
    pub fn kind(&self) -> ManagedKind {
        match self {
            Self::ResourceGroup(_) => ManagedKind::ResourceGroup,
            Self::Subnet(_) => ManagedKind::Subnet,
            Self::MysqlServer(_) => ManagedKind::MysqlServer,
            Self::PostgresqlServer(_) => ManagedKind::PostgresqlServer,
            Self::MysqlServerVirtualNetworkRule(_) => ManagedKind::MysqlServerVirtualNetworkRule,
            Self::PostgresqlServerVirtualNetworkRule(_) => {
                ManagedKind::PostgresqlServerVirtualNetworkRule
            }
            Self::Redis(_) => ManagedKind::Redis,
        }
    }

    /// `metadata.name` of the resource
    pub fn name(&self) -> String {
        match self {
            Self::ResourceGroup(r) => r.name_any(),
            Self::Subnet(r) => r.name_any(),
            Self::MysqlServer(r) => r.name_any(),
            Self::PostgresqlServer(r) => r.name_any(),
            Self::MysqlServerVirtualNetworkRule(r) => r.name_any(),
            Self::PostgresqlServerVirtualNetworkRule(r) => r.name_any(),
            Self::Redis(r) => r.name_any(),
        }
    }

    /// Shared accessors of the resource
    pub fn as_managed(&self) -> &dyn Managed {
        match self {
            Self::ResourceGroup(r) => r,
            Self::Subnet(r) => r,
            Self::MysqlServer(r) => r,
            Self::PostgresqlServer(r) => r,
            Self::MysqlServerVirtualNetworkRule(r) => r,
            Self::PostgresqlServerVirtualNetworkRule(r) => r,
            Self::Redis(r) => r,
        }
    }

    /// Mutable borrow usable as a referencer destination
    pub fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        match self {
            Self::ResourceGroup(r) => r.into(),
            Self::Subnet(r) => r.into(),
            Self::MysqlServer(r) => r.into(),
            Self::PostgresqlServer(r) => r.into(),
            Self::MysqlServerVirtualNetworkRule(r) => r.into(),
            Self::PostgresqlServerVirtualNetworkRule(r) => r.into(),
            Self::Redis(r) => r.into(),
        }
    }

    /// Decode a resource from its JSON representation, dispatching on `kind`
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        let kind: ManagedKind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| Error::serialization("resource has no kind"))?
            .parse()?;

        let api_version = value.get("apiVersion").and_then(|v| v.as_str());
        if api_version != Some(kind.api_version().as_str()) {
            return Err(Error::serialization_for_kind(
                kind.as_str(),
                format!(
                    "unexpected apiVersion {:?}, expected {}",
                    api_version.unwrap_or_default(),
                    kind.api_version()
                ),
            ));
        }

        Ok(match kind {
            ManagedKind::ResourceGroup => Self::ResourceGroup(decode(kind, value)?),
            ManagedKind::Subnet => Self::Subnet(decode(kind, value)?),
            ManagedKind::MysqlServer => Self::MysqlServer(decode(kind, value)?),
            ManagedKind::PostgresqlServer => Self::PostgresqlServer(decode(kind, value)?),
            ManagedKind::MysqlServerVirtualNetworkRule => {
                Self::MysqlServerVirtualNetworkRule(decode(kind, value)?)
            }
            ManagedKind::PostgresqlServerVirtualNetworkRule => {
                Self::PostgresqlServerVirtualNetworkRule(decode(kind, value)?)
            }
            ManagedKind::Redis => Self::Redis(decode(kind, value)?),
        })
    }

    /// Decode every document of a multi-document YAML stream
    pub fn from_yaml_documents(yaml: &str) -> Result<Vec<Self>, Error> {
        use serde::Deserialize;

        let mut objects = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_json::Value::deserialize(document)
                .map_err(|e| Error::serialization(format!("invalid YAML document: {e}")))?;
            if value.is_null() {
                continue;
            }
            objects.push(Self::from_value(value)?);
        }
        Ok(objects)
    }

    /// Encode the resource as JSON
    pub fn to_value(&self) -> Result<serde_json::Value, Error> {
        let encoded = match self {
            Self::ResourceGroup(r) => serde_json::to_value(r),
            Self::Subnet(r) => serde_json::to_value(r),
            Self::MysqlServer(r) => serde_json::to_value(r),
            Self::PostgresqlServer(r) => serde_json::to_value(r),
            Self::MysqlServerVirtualNetworkRule(r) => serde_json::to_value(r),
            Self::PostgresqlServerVirtualNetworkRule(r) => serde_json::to_value(r),
            Self::Redis(r) => serde_json::to_value(r),
        };
        encoded.map_err(|e| Error::serialization_for_kind(self.kind().as_str(), e.to_string()))
    }
}

fn decode<K: DeserializeOwned>(kind: ManagedKind, value: serde_json::Value) -> Result<K, Error> {
    serde_json::from_value(value)
        .map_err(|e| Error::serialization_for_kind(kind.as_str(), e.to_string()))
}

/// Name of the resource in Azure.
///
/// The external-name annotation wins when present; otherwise the object's
/// own name is used.
pub fn external_name<K: ResourceExt>(resource: &K) -> String {
    resource
        .annotations()
        .get(EXTERNAL_NAME_ANNOTATION)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| resource.name_any())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::types::ConditionStatus;
    use crate::crd::{RedisParameters, RedisSku, RedisSpec, ResourceGroupSpec};

    fn sample_group() -> ResourceGroup {
        ResourceGroup::new(
            "rg-prod",
            ResourceGroupSpec {
                resource_spec: Default::default(),
                name: "prod".to_string(),
                location: "westeurope".to_string(),
            },
        )
    }

    fn sample_redis() -> Redis {
        Redis::new(
            "sessions",
            RedisSpec {
                resource_spec: Default::default(),
                parameters: RedisParameters {
                    resource_group_name: "prod-cache".to_string(),
                    location: "westeurope".to_string(),
                    sku: RedisSku {
                        name: "Basic".to_string(),
                        family: "C".to_string(),
                        capacity: 0,
                    },
                    ..Default::default()
                },
            },
        )
    }

    // =========================================================================
    // Managed accessor Tests
    // =========================================================================

    #[test]
    fn conditions_on_resource_without_status() {
        let mut group = sample_group();
        assert!(group.conditions().is_empty());
        assert_eq!(
            group.get_condition(TYPE_READY).status,
            ConditionStatus::Unknown
        );
        assert!(!group.is_ready());

        group.set_conditions(vec![Condition::available()]);
        assert!(group.status.is_some());
        assert!(group.is_ready());
        assert_eq!(group.conditions().len(), 1);
    }

    #[test]
    fn policy_and_reference_accessors() {
        let mut redis = sample_redis();
        assert_eq!(redis.deletion_policy(), DeletionPolicy::Delete);

        redis.set_deletion_policy(DeletionPolicy::Orphan);
        redis.set_provider_config_reference(Some(Reference {
            name: "azure".to_string(),
        }));
        redis.set_write_connection_secret_to_reference(Some(SecretReference {
            name: "sessions-conn".to_string(),
            namespace: "apps".to_string(),
        }));

        assert_eq!(redis.spec.resource_spec.deletion_policy, DeletionPolicy::Orphan);
        assert_eq!(redis.provider_config_reference().unwrap().name, "azure");
        assert_eq!(
            redis.write_connection_secret_to_reference().unwrap().name,
            "sessions-conn"
        );
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_provider_reference_is_separate_field() {
        let mut group = sample_group();
        group.set_provider_reference(Some(Reference {
            name: "legacy".to_string(),
        }));
        assert_eq!(group.provider_reference().unwrap().name, "legacy");
        assert!(group.provider_config_reference().is_none());
    }

    // =========================================================================
    // Kind dispatch Tests
    // =========================================================================

    #[test]
    fn kind_names_round_trip() {
        for kind in ManagedKind::ALL {
            assert_eq!(kind.as_str().parse::<ManagedKind>().unwrap(), kind);
        }
        assert!("Deployment".parse::<ManagedKind>().is_err());
    }

    #[test]
    fn api_versions_follow_crd_groups() {
        assert_eq!(ManagedKind::ResourceGroup.api_version(), "stratus.dev/v1alpha1");
        assert_eq!(ManagedKind::Subnet.api_version(), "network.stratus.dev/v1alpha1");
        assert_eq!(
            ManagedKind::MysqlServerVirtualNetworkRule.api_version(),
            "database.stratus.dev/v1alpha1"
        );
        assert_eq!(ManagedKind::Redis.api_version(), "cache.stratus.dev/v1beta1");
    }

    #[test]
    fn managed_mut_reports_kind() {
        let mut redis = sample_redis();
        assert_eq!(ManagedMut::from(&mut redis).kind(), ManagedKind::Redis);

        let mut object = ManagedObject::from(sample_group());
        assert_eq!(object.as_managed_mut().kind(), ManagedKind::ResourceGroup);
        assert_eq!(object.name(), "rg-prod");
    }

    #[test]
    fn decode_yaml_stream_by_kind() {
        let yaml = r#"
apiVersion: stratus.dev/v1alpha1
kind: ResourceGroup
metadata:
  name: rg-prod
spec:
  name: prod
  location: westeurope
---
apiVersion: network.stratus.dev/v1alpha1
kind: Subnet
metadata:
  name: sn-app
spec:
  name: app
  virtualNetworkName: vnet
  resourceGroupName: prod
  properties:
    addressPrefix: 10.0.0.0/24
---
"#;
        let objects = ManagedObject::from_yaml_documents(yaml).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind(), ManagedKind::ResourceGroup);
        assert_eq!(objects[1].kind(), ManagedKind::Subnet);
        assert_eq!(objects[1].name(), "sn-app");
    }

    #[test]
    fn decode_rejects_wrong_api_version() {
        let value = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Subnet",
            "metadata": {"name": "x"},
        });
        let err = ManagedObject::from_value(value).unwrap_err();
        assert!(err.to_string().contains("unexpected apiVersion"));
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        let value = serde_json::json!({"apiVersion": "v1", "kind": "ConfigMap"});
        let err = ManagedObject::from_value(value).unwrap_err();
        assert!(err.to_string().contains("not a managed resource kind"));
    }

    #[test]
    fn to_value_includes_type_meta() {
        let value = ManagedObject::from(sample_group()).to_value().unwrap();
        assert_eq!(value["kind"], "ResourceGroup");
        assert_eq!(value["apiVersion"], "stratus.dev/v1alpha1");
    }

    // =========================================================================
    // External name Tests
    // =========================================================================

    #[test]
    fn external_name_prefers_annotation() {
        let mut group = sample_group();
        assert_eq!(external_name(&group), "rg-prod");

        group
            .annotations_mut()
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), "legacy-rg".to_string());
        assert_eq!(external_name(&group), "legacy-rg");

        group
            .annotations_mut()
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), String::new());
        assert_eq!(external_name(&group), "rg-prod");
    }
}
