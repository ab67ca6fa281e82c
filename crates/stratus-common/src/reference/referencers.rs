//! Concrete referencer variants and the fields they bind to

use std::fmt::Debug;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::resolution::{Attribute, Resolution};
use super::store::ReferenceStore;
use crate::crd::{
    ManagedKind, ManagedMut, ManagedObject, MysqlServer, MysqlServerVirtualNetworkRule,
    PostgresqlServer, PostgresqlServerVirtualNetworkRule,
};
use crate::Error;

const VIRTUAL_NETWORK_RULES: &[ManagedKind] = &[
    ManagedKind::MysqlServerVirtualNetworkRule,
    ManagedKind::PostgresqlServerVirtualNetworkRule,
];

const SQL_SERVERS: &[ManagedKind] = &[ManagedKind::MysqlServer, ManagedKind::PostgresqlServer];

/// Destination of a referencer: the kinds it may write to and the field it sets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldBinding {
    /// Destination kinds the referencer may assign to
    pub kinds: &'static [ManagedKind],
    /// JSON path of the field written on assignment
    pub field: &'static str,
}

impl FieldBinding {
    /// Whether the binding accepts a destination of this kind
    pub fn permits(&self, kind: ManagedKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// A spec field that resolves its value from another managed resource
///
/// Resolution only reads from the store. Assignment checks the destination
/// kind against [`FieldBinding::kinds`] before writing, so a mismatch leaves
/// the destination untouched.
#[async_trait]
pub trait AttributeReferencer: Debug + Send + Sync {
    /// Variant name, used in errors and logs
    fn type_name(&self) -> &'static str;

    /// Name of the referenced resource
    fn source_name(&self) -> &str;

    /// Attribute read from the referenced resource
    fn attribute(&self) -> Attribute;

    /// Destination kinds and field of this referencer
    fn binding(&self) -> FieldBinding;

    /// Fetch the referenced resource and extract the attribute
    async fn resolve(&self, store: &dyn ReferenceStore) -> Result<Resolution, Error> {
        self.attribute().resolve(store, self.source_name()).await
    }

    /// Write a resolved value into the bound field of `destination`
    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error>;

    /// Type mismatch error for a destination of the given kind
    fn type_mismatch(&self, actual: ManagedKind) -> Error {
        Error::type_mismatch(self.type_name(), self.binding().kinds, actual)
    }

    /// Fail with a type mismatch unless the binding permits `kind`
    fn check_destination(&self, kind: ManagedKind) -> Result<(), Error> {
        if self.binding().permits(kind) {
            Ok(())
        } else {
            Err(self.type_mismatch(kind))
        }
    }
}

/// Resolves the id of a Subnet into a virtual network rule's
/// `virtualNetworkSubnetId`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SubnetIdReferencerForVirtualNetworkRule {
    /// Name of the referenced Subnet
    pub name: String,
}

#[async_trait]
impl AttributeReferencer for SubnetIdReferencerForVirtualNetworkRule {
    fn type_name(&self) -> &'static str {
        "SubnetIdReferencerForVirtualNetworkRule"
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self) -> Attribute {
        Attribute::SubnetId
    }

    fn binding(&self) -> FieldBinding {
        FieldBinding {
            kinds: VIRTUAL_NETWORK_RULES,
            field: "spec.properties.virtualNetworkSubnetId",
        }
    }

    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error> {
        match destination {
            ManagedMut::MysqlServerVirtualNetworkRule(rule) => {
                rule.spec.properties.virtual_network_subnet_id = value.to_string();
            }
            ManagedMut::PostgresqlServerVirtualNetworkRule(rule) => {
                rule.spec.properties.virtual_network_subnet_id = value.to_string();
            }
            other => return Err(self.type_mismatch(other.kind())),
        }
        Ok(())
    }
}

/// Resolves the name of a ResourceGroup into a virtual network rule's
/// `resourceGroupName`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceGroupNameReferencerForVirtualNetworkRule {
    /// Name of the referenced ResourceGroup
    pub name: String,
}

#[async_trait]
impl AttributeReferencer for ResourceGroupNameReferencerForVirtualNetworkRule {
    fn type_name(&self) -> &'static str {
        "ResourceGroupNameReferencerForVirtualNetworkRule"
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self) -> Attribute {
        Attribute::ResourceGroupName
    }

    fn binding(&self) -> FieldBinding {
        FieldBinding {
            kinds: VIRTUAL_NETWORK_RULES,
            field: "spec.resourceGroupName",
        }
    }

    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error> {
        match destination {
            ManagedMut::MysqlServerVirtualNetworkRule(rule) => {
                rule.spec.resource_group_name = value.to_string();
            }
            ManagedMut::PostgresqlServerVirtualNetworkRule(rule) => {
                rule.spec.resource_group_name = value.to_string();
            }
            other => return Err(self.type_mismatch(other.kind())),
        }
        Ok(())
    }
}

/// Resolves the name of a ResourceGroup into a SQL server's
/// `resourceGroupName`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ResourceGroupNameReferencerForSqlServer {
    /// Name of the referenced ResourceGroup
    pub name: String,
}

#[async_trait]
impl AttributeReferencer for ResourceGroupNameReferencerForSqlServer {
    fn type_name(&self) -> &'static str {
        "ResourceGroupNameReferencerForSqlServer"
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self) -> Attribute {
        Attribute::ResourceGroupName
    }

    fn binding(&self) -> FieldBinding {
        FieldBinding {
            kinds: SQL_SERVERS,
            field: "spec.resourceGroupName",
        }
    }

    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error> {
        match destination {
            ManagedMut::MysqlServer(server) => {
                server.spec.parameters.resource_group_name = value.to_string();
            }
            ManagedMut::PostgresqlServer(server) => {
                server.spec.parameters.resource_group_name = value.to_string();
            }
            other => return Err(self.type_mismatch(other.kind())),
        }
        Ok(())
    }
}

/// Resolves the Azure name of a PostgresqlServer into a PostgreSQL virtual
/// network rule's `serverName`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ServerNameReferencerForPostgresqlServerVirtualNetworkRule {
    /// Name of the referenced PostgresqlServer
    pub name: String,
}

#[async_trait]
impl AttributeReferencer for ServerNameReferencerForPostgresqlServerVirtualNetworkRule {
    fn type_name(&self) -> &'static str {
        "ServerNameReferencerForPostgresqlServerVirtualNetworkRule"
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self) -> Attribute {
        Attribute::PostgresqlServerName
    }

    fn binding(&self) -> FieldBinding {
        FieldBinding {
            kinds: &[ManagedKind::PostgresqlServerVirtualNetworkRule],
            field: "spec.serverName",
        }
    }

    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error> {
        match destination {
            ManagedMut::PostgresqlServerVirtualNetworkRule(rule) => {
                rule.spec.server_name = value.to_string();
                Ok(())
            }
            other => Err(self.type_mismatch(other.kind())),
        }
    }
}

/// Resolves the Azure name of a MysqlServer into a MySQL virtual network
/// rule's `serverName`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ServerNameReferencerForMysqlServerVirtualNetworkRule {
    /// Name of the referenced MysqlServer
    pub name: String,
}

#[async_trait]
impl AttributeReferencer for ServerNameReferencerForMysqlServerVirtualNetworkRule {
    fn type_name(&self) -> &'static str {
        "ServerNameReferencerForMysqlServerVirtualNetworkRule"
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self) -> Attribute {
        Attribute::MysqlServerName
    }

    fn binding(&self) -> FieldBinding {
        FieldBinding {
            kinds: &[ManagedKind::MysqlServerVirtualNetworkRule],
            field: "spec.serverName",
        }
    }

    fn assign(&self, destination: ManagedMut<'_>, value: &str) -> Result<(), Error> {
        match destination {
            ManagedMut::MysqlServerVirtualNetworkRule(rule) => {
                rule.spec.server_name = value.to_string();
                Ok(())
            }
            other => Err(self.type_mismatch(other.kind())),
        }
    }
}

/// A managed resource whose spec carries referencer fields
pub trait CanReference {
    /// Referencers set on the spec, in the order they are resolved
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>>;

    /// Destination handle for assigning resolved values
    fn as_managed_mut(&mut self) -> ManagedMut<'_>;
}

fn boxed<R: AttributeReferencer + Clone + 'static>(
    referencer: Option<&R>,
) -> Option<Box<dyn AttributeReferencer>> {
    referencer.map(|r| Box::new(r.clone()) as Box<dyn AttributeReferencer>)
}

impl CanReference for MysqlServer {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        boxed(self.spec.parameters.resource_group_name_ref.as_ref())
            .into_iter()
            .collect()
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        self.into()
    }
}

impl CanReference for PostgresqlServer {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        boxed(self.spec.parameters.resource_group_name_ref.as_ref())
            .into_iter()
            .collect()
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        self.into()
    }
}

impl CanReference for MysqlServerVirtualNetworkRule {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        [
            boxed(self.spec.server_name_ref.as_ref()),
            boxed(self.spec.resource_group_name_ref.as_ref()),
            boxed(self.spec.properties.virtual_network_subnet_id_ref.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        self.into()
    }
}

impl CanReference for PostgresqlServerVirtualNetworkRule {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        [
            boxed(self.spec.server_name_ref.as_ref()),
            boxed(self.spec.resource_group_name_ref.as_ref()),
            boxed(self.spec.properties.virtual_network_subnet_id_ref.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        self.into()
    }
}

impl CanReference for ManagedObject {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        match self {
            ManagedObject::MysqlServer(r) => r.referencers(),
            ManagedObject::PostgresqlServer(r) => r.referencers(),
            ManagedObject::MysqlServerVirtualNetworkRule(r) => r.referencers(),
            ManagedObject::PostgresqlServerVirtualNetworkRule(r) => r.referencers(),
            ManagedObject::ResourceGroup(_) | ManagedObject::Subnet(_) | ManagedObject::Redis(_) => {
                Vec::new()
            }
        }
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        ManagedObject::as_managed_mut(self)
    }
}
