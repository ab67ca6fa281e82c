//! Attribute referencers
//!
//! A referencer is a spec field that names another managed resource instead
//! of holding a literal value. Once that resource is ready, the referencer
//! resolves an attribute from it and assigns the value into the plain field
//! next to it.
//!
//! Resolution is a pure read through a [`ReferenceStore`]; assignment is a
//! type-checked write into a [`ManagedMut`](crate::crd::ManagedMut)
//! destination that never touches anything but the bound field.

mod referencers;
mod resolution;
mod store;

pub use referencers::{
    AttributeReferencer, CanReference, FieldBinding,
    ResourceGroupNameReferencerForSqlServer, ResourceGroupNameReferencerForVirtualNetworkRule,
    ServerNameReferencerForMysqlServerVirtualNetworkRule,
    ServerNameReferencerForPostgresqlServerVirtualNetworkRule,
    SubnetIdReferencerForVirtualNetworkRule,
};
pub use resolution::{Attribute, Resolution};
#[cfg(test)]
pub use store::MockReferenceStore;
pub use store::{KubeStore, MemoryStore, ReferenceStore};
