//! Reference resolution controllers
//!
//! One controller per kind that carries referencers. Each reconcile resolves
//! the resource's references against the API server, merge-patches the spec
//! when a bound field changed, and records the `ReferencesResolved` condition.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::{Patch, PatchParams};
use kube::core::ClusterResourceScope;
use kube::runtime::controller::Action;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use stratus_common::crd::{
    Condition, Managed, ManagedKind, MysqlServer, MysqlServerVirtualNetworkRule,
    PostgresqlServer, PostgresqlServerVirtualNetworkRule, TYPE_REFERENCES_RESOLVED,
};
use stratus_common::reference::{CanReference, KubeStore, ReferenceStore};
use stratus_common::Error;

use crate::config::ResolverConfig;
use crate::resolver::{resolve_references, ResolveOutcome};

/// A managed kind whose spec carries referencers
pub trait ReferencingResource:
    CanReference
    + Managed
    + Resource<Scope = ClusterResourceScope, DynamicType = ()>
    + Clone
    + PartialEq
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind of this resource
    const KIND: ManagedKind;
}

impl ReferencingResource for MysqlServer {
    const KIND: ManagedKind = ManagedKind::MysqlServer;
}

impl ReferencingResource for PostgresqlServer {
    const KIND: ManagedKind = ManagedKind::PostgresqlServer;
}

impl ReferencingResource for MysqlServerVirtualNetworkRule {
    const KIND: ManagedKind = ManagedKind::MysqlServerVirtualNetworkRule;
}

impl ReferencingResource for PostgresqlServerVirtualNetworkRule {
    const KIND: ManagedKind = ManagedKind::PostgresqlServerVirtualNetworkRule;
}

/// Shared state of the resolution controllers
pub struct Context {
    client: Client,
    store: Arc<dyn ReferenceStore>,
    config: ResolverConfig,
}

impl Context {
    /// Create a context reading references through the API server
    pub fn new(client: Client, config: ResolverConfig) -> Self {
        Self {
            store: Arc::new(KubeStore::new(client.clone())),
            client,
            config,
        }
    }

    /// Controller configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

/// Writes a reconcile pass decided on, before touching the API server
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcilePlan {
    /// Spec to merge-patch, when a bound field changed
    pub spec_patch: Option<serde_json::Value>,
    /// Conditions to write, when `ReferencesResolved` changed
    pub conditions: Option<Vec<Condition>>,
    /// When to reconcile again
    pub requeue: Duration,
}

/// Resolve the references of `resource` and decide what to write
///
/// Returns `None` when the resource carries no referencers.
pub async fn plan<K: ReferencingResource>(
    resource: &K,
    store: &dyn ReferenceStore,
    config: &ResolverConfig,
) -> Result<Option<ReconcilePlan>, Error> {
    let mut desired = resource.clone();
    let outcome = resolve_references(store, &mut desired).await?;

    let (condition, requeue) = match &outcome {
        ResolveOutcome::NoReferences => return Ok(None),
        ResolveOutcome::Blocked(_) => (
            Condition::reference_resolution_blocked(
                outcome.blocked_message().unwrap_or_default(),
            ),
            config.blocked_requeue(),
        ),
        ResolveOutcome::Resolved { .. } => (
            Condition::reference_resolution_success(),
            config.resolved_requeue(),
        ),
    };

    let spec_patch = if outcome.changed() {
        let value = serde_json::to_value(&desired)
            .map_err(|e| Error::serialization_for_kind(K::KIND.as_str(), e.to_string()))?;
        Some(serde_json::json!({ "spec": value["spec"] }))
    } else {
        None
    };

    let conditions = if resource
        .get_condition(TYPE_REFERENCES_RESOLVED)
        .equal(&condition)
    {
        None
    } else {
        desired.set_conditions(vec![condition]);
        Some(desired.conditions().to_vec())
    };

    Ok(Some(ReconcilePlan {
        spec_patch,
        conditions,
        requeue,
    }))
}

/// Reconcile the references of one resource
pub async fn reconcile<K: ReferencingResource>(
    resource: Arc<K>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let name = resource.name_any();
    debug!(kind = %K::KIND, resource = %name, "reconciling references");

    let Some(plan) = plan(&*resource, ctx.store.as_ref(), &ctx.config).await? else {
        return Ok(Action::await_change());
    };

    let api: Api<K> = Api::all(ctx.client.clone());
    let params = PatchParams::apply(&ctx.config.field_manager);

    if let Some(spec_patch) = &plan.spec_patch {
        api.patch(&name, &params, &Patch::Merge(spec_patch)).await?;
        info!(kind = %K::KIND, resource = %name, "resolved references written to spec");
    }

    if let Some(conditions) = &plan.conditions {
        let status_patch = serde_json::json!({ "status": { "conditions": conditions } });
        api.patch_status(&name, &params, &Patch::Merge(&status_patch))
            .await?;
    }

    Ok(Action::requeue(plan.requeue))
}

/// Requeue policy after a failed reconcile
pub fn error_policy<K: ReferencingResource>(
    resource: Arc<K>,
    error: &Error,
    ctx: Arc<Context>,
) -> Action {
    let name = resource.name_any();
    if error.is_retryable() {
        warn!(kind = %K::KIND, resource = %name, error = %error, "reference resolution failed, retrying");
        Action::requeue(ctx.config.error_requeue())
    } else {
        error!(kind = %K::KIND, resource = %name, error = %error, "reference resolution needs a configuration change");
        Action::requeue(ctx.config.permanent_error_requeue())
    }
}

/// Boxed controller future
pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Build a controller for every kind that carries referencers
pub fn build_controllers(client: Client, config: ResolverConfig) -> Vec<ControllerFuture> {
    let ctx = Arc::new(Context::new(client.clone(), config));

    vec![
        build_controller::<MysqlServer>(client.clone(), ctx.clone()),
        build_controller::<PostgresqlServer>(client.clone(), ctx.clone()),
        build_controller::<MysqlServerVirtualNetworkRule>(client.clone(), ctx.clone()),
        build_controller::<PostgresqlServerVirtualNetworkRule>(client, ctx),
    ]
}

fn build_controller<K: ReferencingResource>(client: Client, ctx: Arc<Context>) -> ControllerFuture {
    let api: Api<K> = Api::all(client);
    let watcher = WatcherConfig::default().timeout(ctx.config.watch_timeout_secs);

    info!("- {} reference controller", K::KIND);

    Box::pin(
        Controller::new(api, watcher)
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, ctx)
            .for_each(log_reconcile_result(K::KIND)),
    )
}

fn log_reconcile_result<T: Debug, E: Debug>(
    kind: ManagedKind,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => debug!(?action, %kind, "reconciliation completed"),
            Err(e) => error!(error = ?e, %kind, "reconciliation error"),
        }
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_common::crd::{
        ConditionStatus, PostgresqlServerSpec, ResourceGroup, ResourceGroupSpec,
        SqlServerParameters, REASON_REFERENCE_RESOLUTION_BLOCKED,
        REASON_REFERENCE_RESOLUTION_SUCCESS,
    };
    use stratus_common::reference::{MemoryStore, ResourceGroupNameReferencerForSqlServer};

    fn server(resource_group_ref: Option<&str>) -> PostgresqlServer {
        PostgresqlServer::new(
            "analytics",
            PostgresqlServerSpec {
                resource_spec: Default::default(),
                parameters: SqlServerParameters {
                    resource_group_name_ref: resource_group_ref.map(|name| {
                        ResourceGroupNameReferencerForSqlServer {
                            name: name.to_string(),
                        }
                    }),
                    location: "westeurope".to_string(),
                    version: "10".to_string(),
                    ..Default::default()
                },
            },
        )
    }

    fn ready_group() -> ResourceGroup {
        let mut group = ResourceGroup::new(
            "rg-prod",
            ResourceGroupSpec {
                resource_spec: Default::default(),
                name: "prod".to_string(),
                location: "westeurope".to_string(),
            },
        );
        group.set_conditions(vec![Condition::available()]);
        group
    }

    #[tokio::test]
    async fn server_without_references_needs_no_plan() {
        let store = MemoryStore::new();
        let plan = plan(&server(None), &store, &ResolverConfig::default())
            .await
            .unwrap();
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn blocked_reference_records_condition_and_requeues_soon() {
        let store = MemoryStore::new();
        let config = ResolverConfig::default();
        let plan = plan(&server(Some("rg-prod")), &store, &config)
            .await
            .unwrap()
            .unwrap();

        assert!(plan.spec_patch.is_none());
        assert_eq!(plan.requeue, config.blocked_requeue());

        let conditions = plan.conditions.unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, TYPE_REFERENCES_RESOLVED);
        assert_eq!(conditions[0].status, ConditionStatus::False);
        assert_eq!(conditions[0].reason, REASON_REFERENCE_RESOLUTION_BLOCKED);
        assert!(conditions[0].message.contains("ResourceGroup rg-prod: not found"));
    }

    #[tokio::test]
    async fn resolved_reference_patches_spec() {
        let mut store = MemoryStore::new();
        store.insert(ready_group());
        let config = ResolverConfig::default();

        let plan = plan(&server(Some("rg-prod")), &store, &config)
            .await
            .unwrap()
            .unwrap();

        let spec = plan.spec_patch.unwrap();
        assert_eq!(spec["spec"]["resourceGroupName"], "prod");
        assert_eq!(spec["spec"]["resourceGroupNameRef"]["name"], "rg-prod");
        assert_eq!(plan.requeue, config.resolved_requeue());

        let conditions = plan.conditions.unwrap();
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].reason, REASON_REFERENCE_RESOLUTION_SUCCESS);
    }

    #[tokio::test]
    async fn settled_resource_needs_no_writes() {
        let mut store = MemoryStore::new();
        store.insert(ready_group());

        let mut settled = server(Some("rg-prod"));
        settled.spec.parameters.resource_group_name = "prod".to_string();
        settled.set_conditions(vec![Condition::reference_resolution_success()]);

        let plan = plan(&settled, &store, &ResolverConfig::default())
            .await
            .unwrap()
            .unwrap();
        assert!(plan.spec_patch.is_none());
        assert!(plan.conditions.is_none());
    }

    #[tokio::test]
    async fn stale_literal_is_overwritten_by_reference() {
        let mut store = MemoryStore::new();
        store.insert(ready_group());

        let mut stale = server(Some("rg-prod"));
        stale.spec.parameters.resource_group_name = "old-group".to_string();

        let plan = plan(&stale, &store, &ResolverConfig::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plan.spec_patch.unwrap()["spec"]["resourceGroupName"], "prod");
    }
}
