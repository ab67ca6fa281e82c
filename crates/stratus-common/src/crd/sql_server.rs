//! MysqlServer, PostgresqlServer and SqlServerClass CRDs
//!
//! Both server kinds share the same parameters; they differ only in the
//! database engine Azure provisions. A SqlServerClass holds a parameter
//! template from which either kind can be provisioned on demand.

use kube::{CustomResource, Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    ClassSpecTemplate, ObjectReference, ResourceSpec, ResourceStatus, SecretReference,
};
use crate::reference::ResourceGroupNameReferencerForSqlServer;
use crate::Error;

/// Database engine of a SQL server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlEngine {
    /// Azure Database for MySQL
    Mysql,
    /// Azure Database for PostgreSQL
    Postgresql,
}

impl SqlEngine {
    /// Engine versions Azure accepts for this engine
    pub fn valid_versions(self) -> &'static [&'static str] {
        match self {
            Self::Mysql => &["5.6", "5.7"],
            Self::Postgresql => &["9.5", "9.6", "10", "10.0", "10.2"],
        }
    }
}

impl std::fmt::Display for SqlEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Postgresql => write!(f, "postgresql"),
        }
    }
}

/// Desired state of an Azure SQL database server, either MySQL or PostgreSQL
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerParameters {
    /// Resource group that should contain this server
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group_name: String,

    /// Reference to a ResourceGroup object to retrieve its name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name_ref: Option<ResourceGroupNameReferencerForSqlServer>,

    /// Azure region of this server
    pub location: String,

    /// Pricing tier (aka SKU) of this server
    pub pricing_tier: PricingTierSpec,

    /// Storage profile of this server
    pub storage_profile: StorageProfileSpec,

    /// Administrator login name
    pub admin_login_name: String,

    /// Engine version, for example "5.7" or "9.6"
    pub version: String,

    /// Whether SSL is required to connect to this server
    #[serde(default)]
    pub ssl_enforced: bool,
}

/// Performance and cost oriented properties of a SQL server
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PricingTierSpec {
    /// Tier of the SKU: Basic, GeneralPurpose or MemoryOptimized
    pub tier: String,

    /// Number of virtual cores
    pub vcores: u32,

    /// Hardware family
    pub family: String,
}

/// Storage related properties of a SQL server
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfileSpec {
    /// Maximum storage allowed, in GB
    #[serde(rename = "storageGB")]
    pub storage_gb: u32,

    /// Days backups are retained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<u32>,

    /// Whether backups are geo-redundant
    #[serde(default)]
    pub geo_redundant_backup: bool,
}

impl SqlServerParameters {
    /// Validate the parameters for the given engine
    pub fn validate(&self, resource: &str, engine: SqlEngine) -> Result<(), Error> {
        if !engine.valid_versions().contains(&self.version.as_str()) {
            return Err(Error::validation_for_field(
                resource,
                "spec.version",
                format!(
                    "unsupported {} version {:?}, expected one of: {}",
                    engine,
                    self.version,
                    engine.valid_versions().join(", ")
                ),
            ));
        }
        if self.resource_group_name.is_empty() && self.resource_group_name_ref.is_none() {
            return Err(Error::validation_for_field(
                resource,
                "spec.resourceGroupName",
                "either resourceGroupName or resourceGroupNameRef must be set",
            ));
        }
        if self.location.is_empty() {
            return Err(Error::validation_for_field(
                resource,
                "spec.location",
                "location cannot be empty",
            ));
        }
        if self.pricing_tier.vcores == 0 {
            return Err(Error::validation_for_field(
                resource,
                "spec.pricingTier.vcores",
                "vcores must be at least 1",
            ));
        }
        if self.storage_profile.storage_gb == 0 {
            return Err(Error::validation_for_field(
                resource,
                "spec.storageProfile.storageGB",
                "storageGB must be at least 1",
            ));
        }
        Ok(())
    }
}

/// MysqlServer is a managed resource that represents an Azure MySQL database server.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.stratus.dev",
    version = "v1alpha1",
    kind = "MysqlServer",
    derive = "PartialEq",
    status = "SqlServerStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Class","type":"string","jsonPath":".spec.classRef.name"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MysqlServerSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Server parameters
    #[serde(flatten)]
    pub parameters: SqlServerParameters,
}

/// PostgresqlServer is a managed resource that represents an Azure PostgreSQL
/// database server.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.stratus.dev",
    version = "v1alpha1",
    kind = "PostgresqlServer",
    derive = "PartialEq",
    status = "SqlServerStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Class","type":"string","jsonPath":".spec.classRef.name"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlServerSpec {
    /// Common managed resource fields
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Server parameters
    #[serde(flatten)]
    pub parameters: SqlServerParameters,
}

/// Observed state of a SQL server
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerStatus {
    /// Common managed resource status
    #[serde(flatten)]
    pub resource_status: ResourceStatus,

    /// State of this server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Detail on the state, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// External id of the server in Azure
    #[serde(rename = "providerID", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Endpoint used in connection strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl MysqlServer {
    /// Validate the server spec
    pub fn validate(&self) -> Result<(), Error> {
        self.spec
            .parameters
            .validate(&self.name_any(), SqlEngine::Mysql)
    }
}

impl PostgresqlServer {
    /// Validate the server spec
    pub fn validate(&self) -> Result<(), Error> {
        self.spec
            .parameters
            .validate(&self.name_any(), SqlEngine::Postgresql)
    }
}

/// Template for the spec of a dynamically provisioned MysqlServer or PostgresqlServer
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerClassSpecTemplate {
    /// Common class fields
    #[serde(flatten)]
    pub class: ClassSpecTemplate,

    /// Parameters copied into every provisioned server
    #[serde(flatten)]
    pub parameters: SqlServerParameters,
}

/// SqlServerClass defines the desired spec of servers provisioned from it.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.stratus.dev",
    version = "v1alpha1",
    kind = "SqlServerClass",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Provider-Ref","type":"string","jsonPath":".spec.specTemplate.providerRef.name"}"#,
    printcolumn = r#"{"name":"Reclaim-Policy","type":"string","jsonPath":".spec.specTemplate.reclaimPolicy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SqlServerClassSpec {
    /// Template for the spec of a dynamically provisioned server
    pub spec_template: SqlServerClassSpecTemplate,
}

impl SqlServerClass {
    /// Build a MysqlServer from this class
    pub fn provision_mysql_server(&self, name: &str) -> MysqlServer {
        MysqlServer::new(
            name,
            MysqlServerSpec {
                resource_spec: self.provisioned_resource_spec(name),
                parameters: self.spec.spec_template.parameters.clone(),
            },
        )
    }

    /// Build a PostgresqlServer from this class
    pub fn provision_postgresql_server(&self, name: &str) -> PostgresqlServer {
        PostgresqlServer::new(
            name,
            PostgresqlServerSpec {
                resource_spec: self.provisioned_resource_spec(name),
                parameters: self.spec.spec_template.parameters.clone(),
            },
        )
    }

    fn provisioned_resource_spec(&self, name: &str) -> ResourceSpec {
        let template = &self.spec.spec_template.class;
        ResourceSpec {
            write_connection_secret_to_ref: template
                .write_connection_secrets_to_namespace
                .as_ref()
                .map(|namespace| SecretReference {
                    name: name.to_string(),
                    namespace: namespace.clone(),
                }),
            class_ref: Some(ObjectReference {
                api_version: Some(Self::api_version(&()).to_string()),
                kind: Some(Self::kind(&()).to_string()),
                name: self.name_any(),
                namespace: None,
                uid: self.metadata.uid.clone(),
            }),
            provider_ref: template.provider_ref.clone(),
            reclaim_policy: template.reclaim_policy,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::types::{ReclaimPolicy, Reference};

    fn sample_parameters() -> SqlServerParameters {
        SqlServerParameters {
            resource_group_name: "prod-databases".to_string(),
            resource_group_name_ref: None,
            location: "westeurope".to_string(),
            pricing_tier: PricingTierSpec {
                tier: "GeneralPurpose".to_string(),
                vcores: 2,
                family: "Gen5".to_string(),
            },
            storage_profile: StorageProfileSpec {
                storage_gb: 25,
                backup_retention_days: Some(7),
                geo_redundant_backup: false,
            },
            admin_login_name: "dbadmin".to_string(),
            version: "5.7".to_string(),
            ssl_enforced: true,
        }
    }

    fn sample_class() -> SqlServerClass {
        let mut parameters = sample_parameters();
        parameters.resource_group_name = String::new();
        parameters.resource_group_name_ref = Some(ResourceGroupNameReferencerForSqlServer {
            name: "rg-prod".to_string(),
        });
        SqlServerClass::new(
            "standard-mysql",
            SqlServerClassSpec {
                spec_template: SqlServerClassSpecTemplate {
                    class: ClassSpecTemplate {
                        write_connection_secrets_to_namespace: Some("stratus-system".to_string()),
                        provider_ref: Some(Reference {
                            name: "azure-prod".to_string(),
                        }),
                        reclaim_policy: Some(ReclaimPolicy::Delete),
                    },
                    parameters,
                },
            },
        )
    }

    // =========================================================================
    // Schema Tests
    // =========================================================================

    #[test]
    fn mysql_server_yaml_with_reference() {
        let yaml = r#"
apiVersion: database.stratus.dev/v1alpha1
kind: MysqlServer
metadata:
  name: orders-db
spec:
  resourceGroupNameRef:
    name: rg-prod
  location: westeurope
  pricingTier:
    tier: GeneralPurpose
    vcores: 2
    family: Gen5
  storageProfile:
    storageGB: 25
    backupRetentionDays: 7
  adminLoginName: dbadmin
  version: "5.7"
  sslEnforced: true
  writeConnectionSecretToRef:
    name: orders-db-conn
    namespace: shop
"#;
        let server: MysqlServer = serde_yaml::from_str(yaml).expect("parse");
        let params = &server.spec.parameters;
        assert_eq!(params.resource_group_name, "");
        assert_eq!(
            params.resource_group_name_ref.as_ref().map(|r| r.name.as_str()),
            Some("rg-prod")
        );
        assert_eq!(params.storage_profile.storage_gb, 25);
        assert_eq!(
            server
                .spec
                .resource_spec
                .write_connection_secret_to_ref
                .as_ref()
                .map(|s| s.namespace.as_str()),
            Some("shop")
        );
    }

    #[test]
    fn status_uses_provider_id_key() {
        let status = SqlServerStatus {
            provider_id: Some("/subscriptions/1/servers/orders-db".to_string()),
            endpoint: Some("orders-db.mysql.database.azure.com".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&status).unwrap();
        assert!(value.get("providerID").is_some());
        assert!(value.get("providerId").is_none());
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn valid_mysql_parameters() {
        assert!(sample_parameters()
            .validate("orders-db", SqlEngine::Mysql)
            .is_ok());
    }

    #[test]
    fn mysql_version_rejected_for_postgresql() {
        let err = sample_parameters()
            .validate("orders-db", SqlEngine::Postgresql)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported postgresql version"));
        match err {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("spec.version")),
            _ => panic!("Expected Validation variant"),
        }
    }

    #[test]
    fn resource_group_name_or_ref_required() {
        let mut params = sample_parameters();
        params.resource_group_name = String::new();
        assert!(params.validate("db", SqlEngine::Mysql).is_err());

        params.resource_group_name_ref = Some(ResourceGroupNameReferencerForSqlServer {
            name: "rg".to_string(),
        });
        assert!(params.validate("db", SqlEngine::Mysql).is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut params = sample_parameters();
        params.pricing_tier.vcores = 0;
        assert!(params
            .validate("db", SqlEngine::Mysql)
            .unwrap_err()
            .to_string()
            .contains("vcores"));

        let mut params = sample_parameters();
        params.storage_profile.storage_gb = 0;
        assert!(params
            .validate("db", SqlEngine::Mysql)
            .unwrap_err()
            .to_string()
            .contains("storageGB"));
    }

    #[test]
    fn server_validate_uses_its_engine() {
        let mut pg = PostgresqlServer::new(
            "pg",
            PostgresqlServerSpec {
                resource_spec: Default::default(),
                parameters: sample_parameters(),
            },
        );
        assert!(pg.validate().is_err());
        pg.spec.parameters.version = "9.6".to_string();
        assert!(pg.validate().is_ok());
    }

    // =========================================================================
    // Class Provisioning Tests
    // =========================================================================

    #[test]
    fn class_provisions_server_with_reference() {
        let class = sample_class();
        let server = class.provision_mysql_server("orders-db");

        assert_eq!(server.name_any(), "orders-db");
        assert_eq!(
            server
                .spec
                .parameters
                .resource_group_name_ref
                .as_ref()
                .map(|r| r.name.as_str()),
            Some("rg-prod")
        );
        let class_ref = server.spec.resource_spec.class_ref.as_ref().unwrap();
        assert_eq!(class_ref.name, "standard-mysql");
        assert_eq!(class_ref.kind.as_deref(), Some("SqlServerClass"));
        assert_eq!(
            class_ref.api_version.as_deref(),
            Some("database.stratus.dev/v1alpha1")
        );
        assert_eq!(
            server.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Delete)
        );
        let secret = server
            .spec
            .resource_spec
            .write_connection_secret_to_ref
            .as_ref()
            .unwrap();
        assert_eq!(secret.name, "orders-db");
        assert_eq!(secret.namespace, "stratus-system");
    }

    #[test]
    fn class_provisions_postgresql_server() {
        let server = sample_class().provision_postgresql_server("analytics");
        assert_eq!(server.spec.parameters.location, "westeurope");
        assert!(server.status.is_none());
    }
}
