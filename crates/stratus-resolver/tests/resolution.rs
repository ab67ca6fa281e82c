//! Resolution of a whole environment of managed resources held in memory

use stratus_common::crd::{
    ManagedKind, ManagedMut, ManagedObject, Redis, RedisParameters, RedisSpec,
};
use stratus_common::reference::{
    AttributeReferencer, CanReference, MemoryStore, ResourceGroupNameReferencerForSqlServer,
    Resolution,
};
use stratus_common::Error;
use stratus_resolver::{resolve_all, resolve_references, ResolveOutcome};

const ENVIRONMENT: &str = include_str!("fixtures/environment.yaml");

const SUBNET_ID: &str = "/subscriptions/0000/resourceGroups/prod-network/providers/Microsoft.Network/virtualNetworks/vnet-prod/subnets/app";

fn environment() -> MemoryStore {
    ManagedObject::from_yaml_documents(ENVIRONMENT)
        .expect("fixture parses")
        .into_iter()
        .collect()
}

fn lookup(store: &MemoryStore, kind: ManagedKind, name: &str) -> ManagedObject {
    store
        .lookup(kind, name)
        .cloned()
        .unwrap_or_else(|| panic!("{kind} {name} in store"))
}

// =============================================================================
// Whole environment
// =============================================================================

#[tokio::test]
async fn fixture_loads_every_kind() {
    let store = environment();
    assert_eq!(store.len(), 7);
    let kinds: Vec<_> = store.objects().map(ManagedObject::kind).collect();
    for kind in ManagedKind::ALL {
        assert!(kinds.contains(&kind), "{kind} missing from fixture");
    }
}

#[tokio::test]
async fn resolving_environment_fills_ready_references_only() {
    let mut store = environment();
    let reports = resolve_all(&mut store).await;
    assert_eq!(reports.len(), 7);

    for report in &reports {
        let outcome = report
            .result
            .as_ref()
            .unwrap_or_else(|e| panic!("{} {} failed: {e}", report.kind, report.name));
        let expected_blocked = report.name == "analytics-vnet";
        assert_eq!(
            matches!(outcome, ResolveOutcome::Blocked(_)),
            expected_blocked,
            "{} {}: {outcome:?}",
            report.kind,
            report.name
        );
    }

    match lookup(&store, ManagedKind::MysqlServerVirtualNetworkRule, "orders-db-vnet") {
        ManagedObject::MysqlServerVirtualNetworkRule(rule) => {
            assert_eq!(rule.spec.server_name, "orders-db-7f3a");
            assert_eq!(rule.spec.resource_group_name, "prod-databases");
            assert_eq!(rule.spec.properties.virtual_network_subnet_id, SUBNET_ID);
            // References stay on the spec after resolution
            assert!(rule.spec.server_name_ref.is_some());
        }
        other => panic!("unexpected object {other:?}"),
    }

    // A server that is still being created has its resource group resolved
    // from the ready resource group
    match lookup(&store, ManagedKind::PostgresqlServer, "analytics") {
        ManagedObject::PostgresqlServer(server) => {
            assert_eq!(server.spec.parameters.resource_group_name, "prod-databases");
        }
        other => panic!("unexpected object {other:?}"),
    }

    // ...but a rule pointing at that server is blocked as a whole
    match lookup(&store, ManagedKind::PostgresqlServerVirtualNetworkRule, "analytics-vnet") {
        ManagedObject::PostgresqlServerVirtualNetworkRule(rule) => {
            assert!(rule.spec.server_name.is_empty());
            assert!(rule.spec.resource_group_name.is_empty());
            assert!(rule.spec.properties.virtual_network_subnet_id.is_empty());
        }
        other => panic!("unexpected object {other:?}"),
    }
}

#[tokio::test]
async fn blocked_rule_reports_which_source_is_pending() {
    let store = environment();
    let mut rule = lookup(
        &store,
        ManagedKind::PostgresqlServerVirtualNetworkRule,
        "analytics-vnet",
    );

    let outcome = resolve_references(&store, &mut rule).await.unwrap();
    let references = outcome.references();
    assert_eq!(references.len(), 3);
    assert_eq!(
        references[0].resolution,
        Resolution::Pending {
            reason: "PostgresqlServer analytics is not ready".to_string()
        }
    );
    assert!(references[1].resolution.is_ready());
    assert!(references[2].resolution.is_ready());
    assert_eq!(
        outcome.blocked_message().unwrap(),
        "spec.serverName -> PostgresqlServer analytics: pending: PostgresqlServer analytics is not ready"
    );
}

#[tokio::test]
async fn second_pass_over_environment_changes_nothing() {
    let mut store = environment();
    resolve_all(&mut store).await;
    let after_first: Vec<_> = store.objects().cloned().collect();

    let reports = resolve_all(&mut store).await;
    for report in reports {
        assert!(!report.result.unwrap().changed());
    }
    let after_second: Vec<_> = store.objects().cloned().collect();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn removed_source_turns_resolved_rule_back_to_blocked() {
    let mut store = environment();
    resolve_all(&mut store).await;
    store.remove(ManagedKind::Subnet, "sn-app");

    let mut rule = lookup(&store, ManagedKind::MysqlServerVirtualNetworkRule, "orders-db-vnet");
    let before = rule.clone();
    let outcome = resolve_references(&store, &mut rule).await.unwrap();

    assert!(matches!(outcome, ResolveOutcome::Blocked(_)));
    assert_eq!(outcome.references()[2].resolution, Resolution::NotFound);
    // Previously resolved values are kept, not cleared
    assert_eq!(rule, before);
}

// =============================================================================
// Misattached referencers
// =============================================================================

/// A Redis cache that claims to carry a SQL server referencer
#[derive(Clone, Debug, PartialEq)]
struct MisattachedCache(Redis);

impl CanReference for MisattachedCache {
    fn referencers(&self) -> Vec<Box<dyn AttributeReferencer>> {
        vec![Box::new(ResourceGroupNameReferencerForSqlServer {
            name: "rg-prod".to_string(),
        })]
    }

    fn as_managed_mut(&mut self) -> ManagedMut<'_> {
        (&mut self.0).into()
    }
}

#[tokio::test]
async fn misattached_referencer_is_type_mismatch_without_writes() {
    let store = environment();
    let mut cache = MisattachedCache(Redis::new(
        "sessions",
        RedisSpec {
            resource_spec: Default::default(),
            parameters: RedisParameters {
                resource_group_name: "prod-cache".to_string(),
                location: "westeurope".to_string(),
                ..Default::default()
            },
        },
    ));
    let before = cache.clone();

    let err = resolve_references(&store, &mut cache).await.unwrap_err();
    match &err {
        Error::TypeMismatch {
            referencer,
            expected,
            actual,
        } => {
            assert_eq!(referencer, "ResourceGroupNameReferencerForSqlServer");
            assert_eq!(expected, "MysqlServer or PostgresqlServer");
            assert_eq!(actual, "Redis");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
    assert!(!err.is_retryable());
    assert_eq!(cache, before);
}
