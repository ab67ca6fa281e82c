//! Offline resolution of a manifest file
//!
//! Loads managed resources from multi-document YAML into a `MemoryStore`,
//! resolves every referencer against the other resources in the file, and
//! renders the result as YAML plus a per-reference report.

use std::fmt::Write as _;

use anyhow::Context;

use stratus_common::crd::{ManagedObject, MysqlServer, PostgresqlServer};
use stratus_common::reference::MemoryStore;
use stratus_resolver::{resolve_all, ResolveOutcome, ResourceReport};

/// Result of resolving a manifest
#[derive(Debug)]
pub struct OfflineRun {
    /// Resources after resolution, ordered by kind then name
    pub store: MemoryStore,
    /// Per-resource resolution results
    pub reports: Vec<ResourceReport>,
    /// Resources whose spec failed validation, with the reason
    pub invalid: Vec<(String, String)>,
}

impl OfflineRun {
    /// Number of resources whose resolution failed or whose spec is invalid
    pub fn failures(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_err()).count() + self.invalid.len()
    }

    /// Resolved resources as a multi-document YAML stream
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        let mut documents = Vec::with_capacity(self.store.len());
        for object in self.store.objects() {
            let value = object.to_value()?;
            documents.push(serde_yaml::to_string(&value).context("failed to render YAML")?);
        }
        Ok(documents.join("---\n"))
    }

    /// Human-readable report of every resource carrying referencers
    pub fn report(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            let heading = format!("{} {}", report.kind, report.name);
            match &report.result {
                Ok(ResolveOutcome::NoReferences) => continue,
                Ok(ResolveOutcome::Blocked(_)) => {
                    let _ = writeln!(out, "{heading}: blocked");
                }
                Ok(ResolveOutcome::Resolved { changed, .. }) => {
                    let state = if *changed { "resolved" } else { "unchanged" };
                    let _ = writeln!(out, "{heading}: {state}");
                }
                Err(e) => {
                    let _ = writeln!(out, "{heading}: error: {e}");
                    continue;
                }
            }
            for reference in report.result.iter().flat_map(|o| o.references()) {
                let _ = writeln!(out, "  {reference}");
            }
        }
        for (resource, reason) in &self.invalid {
            let _ = writeln!(out, "{resource}: invalid: {reason}");
        }
        out
    }
}

/// Resolve every resource in a YAML manifest
pub async fn resolve_manifest(yaml: &str) -> anyhow::Result<OfflineRun> {
    let objects = ManagedObject::from_yaml_documents(yaml)?;
    let mut store: MemoryStore = objects.into_iter().collect();
    let reports = resolve_all(&mut store).await;

    let invalid = store
        .objects()
        .filter_map(|object| {
            let result = match object {
                ManagedObject::MysqlServer(server) => MysqlServer::validate(server),
                ManagedObject::PostgresqlServer(server) => PostgresqlServer::validate(server),
                _ => Ok(()),
            };
            result
                .err()
                .map(|e| (format!("{} {}", object.kind(), object.name()), e.to_string()))
        })
        .collect();

    Ok(OfflineRun {
        store,
        reports,
        invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
apiVersion: stratus.dev/v1alpha1
kind: ResourceGroup
metadata:
  name: rg-prod
spec:
  name: prod-databases
  location: westeurope
status:
  conditions:
    - type: Ready
      status: "True"
      reason: Available
      lastTransitionTime: "2024-05-01T10:00:00Z"
---
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
    storageGB: 100
  adminLoginName: orders
  version: "5.7"
---
apiVersion: database.stratus.dev/v1alpha1
kind: MysqlServerVirtualNetworkRule
metadata:
  name: orders-db-vnet
spec:
  name: allow-app-subnet
  serverName: orders-db
  resourceGroupNameRef:
    name: rg-prod
  properties:
    virtualNetworkSubnetIdRef:
      name: sn-missing
"#;

    #[tokio::test]
    async fn manifest_resolves_and_reports() {
        let run = resolve_manifest(MANIFEST).await.unwrap();
        assert_eq!(run.failures(), 0);

        let yaml = run.to_yaml().unwrap();
        assert!(yaml.contains("resourceGroupName: prod-databases"));

        let report = run.report();
        assert!(report.contains("MysqlServer orders-db: resolved"));
        assert!(report.contains("MysqlServerVirtualNetworkRule orders-db-vnet: blocked"));
        assert!(report.contains("Subnet sn-missing: not found"));
        // Resources without referencers are left out of the report
        assert!(!report.lines().any(|line| line.starts_with("ResourceGroup")));
    }

    #[tokio::test]
    async fn invalid_server_is_a_failure() {
        let manifest = MANIFEST.replace("version: \"5.7\"", "version: \"8.0\"");
        let run = resolve_manifest(&manifest).await.unwrap();
        assert_eq!(run.failures(), 1);
        assert!(run.report().contains("MysqlServer orders-db: invalid:"));
    }

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let err = resolve_manifest("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a managed resource kind"));
    }
}
