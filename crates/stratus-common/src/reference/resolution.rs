//! Attribute extraction from referenced resources

use std::fmt;

use tracing::debug;

use super::store::ReferenceStore;
use crate::crd::{external_name, Managed, ManagedKind, ManagedObject};
use crate::Error;

/// Attribute a referencer pulls from its source resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// `spec.name` of a ResourceGroup
    ResourceGroupName,
    /// ARM id of a Subnet, from `status.id`
    SubnetId,
    /// Azure name of a MysqlServer
    MysqlServerName,
    /// Azure name of a PostgresqlServer
    PostgresqlServerName,
}

/// Outcome of resolving a referencer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The source is ready and the attribute has a value
    Ready(String),
    /// The source exists but cannot provide the attribute yet
    Pending {
        /// Why the attribute is not available
        reason: String,
    },
    /// No source with that name exists
    NotFound,
}

impl Resolution {
    /// Resolved value, if ready
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a value was resolved
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    fn pending(reason: impl Into<String>) -> Self {
        Self::Pending {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => write!(f, "resolved to {value:?}"),
            Self::Pending { reason } => write!(f, "pending: {reason}"),
            Self::NotFound => f.write_str("not found"),
        }
    }
}

impl Attribute {
    /// Kind of resource the attribute is read from
    pub fn source_kind(self) -> ManagedKind {
        match self {
            Self::ResourceGroupName => ManagedKind::ResourceGroup,
            Self::SubnetId => ManagedKind::Subnet,
            Self::MysqlServerName => ManagedKind::MysqlServer,
            Self::PostgresqlServerName => ManagedKind::PostgresqlServer,
        }
    }

    /// Human-readable attribute name
    pub fn description(self) -> &'static str {
        match self {
            Self::ResourceGroupName => "resource group name",
            Self::SubnetId => "subnet id",
            Self::MysqlServerName | Self::PostgresqlServerName => "server name",
        }
    }

    /// Extract the attribute from a fetched source
    ///
    /// A source that is not `Ready`, or whose attribute is still empty, is
    /// pending. An empty value is never returned as resolved.
    pub fn extract(self, source: &ManagedObject) -> Result<Resolution, Error> {
        if source.kind() != self.source_kind() {
            return Err(Error::internal_with_context(
                "reference_resolution",
                format!(
                    "{} is read from a {}, got {} {}",
                    self.description(),
                    self.source_kind(),
                    source.kind(),
                    source.name()
                ),
            ));
        }

        if !source.as_managed().is_ready() {
            return Ok(Resolution::pending(format!(
                "{} {} is not ready",
                source.kind(),
                source.name()
            )));
        }

        let value = match (self, source) {
            (Self::ResourceGroupName, ManagedObject::ResourceGroup(rg)) => rg.spec.name.clone(),
            (Self::SubnetId, ManagedObject::Subnet(subnet)) => {
                subnet.arm_id().unwrap_or_default().to_string()
            }
            (Self::MysqlServerName, ManagedObject::MysqlServer(server)) => external_name(server),
            (Self::PostgresqlServerName, ManagedObject::PostgresqlServer(server)) => {
                external_name(server)
            }
            _ => String::new(),
        };

        if value.is_empty() {
            return Ok(Resolution::pending(format!(
                "{} {} has no {} yet",
                source.kind(),
                source.name(),
                self.description()
            )));
        }
        Ok(Resolution::Ready(value))
    }

    /// Fetch the named source and extract the attribute from it
    pub async fn resolve(
        self,
        store: &dyn ReferenceStore,
        source_name: &str,
    ) -> Result<Resolution, Error> {
        let kind = self.source_kind();
        let resolution = match store.get(kind, source_name).await? {
            Some(source) => self.extract(&source)?,
            None => Resolution::NotFound,
        };
        debug!(
            source_kind = %kind,
            source = %source_name,
            attribute = self.description(),
            %resolution,
            "resolved attribute"
        );
        Ok(resolution)
    }
}
