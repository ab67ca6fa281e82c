//! Read access to referenced resources
//!
//! Every managed kind is cluster-scoped, so a source is identified by its kind
//! and `metadata.name` alone.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use kube::api::Api;
use kube::core::ClusterResourceScope;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;

use crate::crd::{
    ManagedKind, ManagedObject, MysqlServer, MysqlServerVirtualNetworkRule, PostgresqlServer,
    PostgresqlServerVirtualNetworkRule, Redis, ResourceGroup, Subnet,
};
use crate::Error;

/// Lookup of managed resources by kind and name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Fetch a resource, `None` if it does not exist
    async fn get(&self, kind: ManagedKind, name: &str) -> Result<Option<ManagedObject>, Error>;
}

/// Store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Create a store reading through the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_opt<K>(&self, name: &str) -> Result<Option<ManagedObject>, Error>
    where
        K: Resource<Scope = ClusterResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned
            + Into<ManagedObject>,
    {
        let api: Api<K> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?.map(Into::into))
    }
}

#[async_trait]
impl ReferenceStore for KubeStore {
    async fn get(&self, kind: ManagedKind, name: &str) -> Result<Option<ManagedObject>, Error> {
        match kind {
            ManagedKind::ResourceGroup => self.get_opt::<ResourceGroup>(name).await,
            ManagedKind::Subnet => self.get_opt::<Subnet>(name).await,
            ManagedKind::MysqlServer => self.get_opt::<MysqlServer>(name).await,
            ManagedKind::PostgresqlServer => self.get_opt::<PostgresqlServer>(name).await,
            ManagedKind::MysqlServerVirtualNetworkRule => {
                self.get_opt::<MysqlServerVirtualNetworkRule>(name).await
            }
            ManagedKind::PostgresqlServerVirtualNetworkRule => {
                self.get_opt::<PostgresqlServerVirtualNetworkRule>(name).await
            }
            ManagedKind::Redis => self.get_opt::<Redis>(name).await,
        }
    }
}

/// In-memory store, used for offline resolution of manifests and in tests
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    objects: BTreeMap<(ManagedKind, String), ManagedObject>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a resource, returning the previous one
    pub fn insert(&mut self, object: impl Into<ManagedObject>) -> Option<ManagedObject> {
        let object = object.into();
        self.objects.insert((object.kind(), object.name()), object)
    }

    /// Remove a resource
    pub fn remove(&mut self, kind: ManagedKind, name: &str) -> Option<ManagedObject> {
        self.objects.remove(&(kind, name.to_string()))
    }

    /// Borrow a resource
    pub fn lookup(&self, kind: ManagedKind, name: &str) -> Option<&ManagedObject> {
        self.objects.get(&(kind, name.to_string()))
    }

    /// Keys of all stored resources, ordered by kind then name
    pub fn keys(&self) -> Vec<(ManagedKind, String)> {
        self.objects.keys().cloned().collect()
    }

    /// All stored resources, ordered by kind then name
    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.objects.values()
    }

    /// Number of stored resources
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no resources
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<ManagedObject> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = ManagedObject>>(iter: I) -> Self {
        let mut store = Self::new();
        for object in iter {
            store.insert(object);
        }
        store
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn get(&self, kind: ManagedKind, name: &str) -> Result<Option<ManagedObject>, Error> {
        Ok(self.lookup(kind, name).cloned())
    }
}
