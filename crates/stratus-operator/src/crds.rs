//! CRD generation and installation

use anyhow::Context;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, CustomResourceExt, ResourceExt};
use tracing::info;

use stratus_common::crd::{
    MysqlServer, MysqlServerVirtualNetworkRule, PostgresqlServer,
    PostgresqlServerVirtualNetworkRule, Redis, ResourceGroup, SqlServerClass, Subnet,
};

/// Every CRD served by Stratus
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        ResourceGroup::crd(),
        Subnet::crd(),
        MysqlServer::crd(),
        PostgresqlServer::crd(),
        SqlServerClass::crd(),
        MysqlServerVirtualNetworkRule::crd(),
        PostgresqlServerVirtualNetworkRule::crd(),
        Redis::crd(),
    ]
}

/// All CRDs as one multi-document YAML stream
pub fn crds_yaml() -> anyhow::Result<String> {
    let documents = all_crds()
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to serialize CRD")?;
    Ok(documents.join("---\n"))
}

/// Install or update every CRD with server-side apply
///
/// The operator installs its own CRDs on startup so their versions always
/// match the running binary.
pub async fn ensure_crds_installed(client: &Client, field_manager: &str) -> anyhow::Result<()> {
    let api: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(field_manager).force();

    for crd in all_crds() {
        let name = crd.name_any();
        info!(crd = %name, "installing CRD");
        api.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .with_context(|| format!("failed to install CRD {name}"))?;
    }

    info!("all Stratus CRDs installed/updated");
    Ok(())
}
