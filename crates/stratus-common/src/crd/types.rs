//! Runtime types shared by every managed resource
//!
//! Conditions, the common `ResourceSpec`/`ResourceStatus` blocks that are
//! flattened into each CRD, and the reference types they carry.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type indicating the resource is ready for use
pub const TYPE_READY: &str = "Ready";

/// Condition type indicating the last reconcile succeeded
pub const TYPE_SYNCED: &str = "Synced";

/// Condition type indicating all attribute referencers were resolved
pub const TYPE_REFERENCES_RESOLVED: &str = "ReferencesResolved";

/// Reason: the external resource is available
pub const REASON_AVAILABLE: &str = "Available";
/// Reason: the external resource is not available
pub const REASON_UNAVAILABLE: &str = "Unavailable";
/// Reason: the external resource is being created
pub const REASON_CREATING: &str = "Creating";
/// Reason: the external resource is being deleted
pub const REASON_DELETING: &str = "Deleting";
/// Reason: the last reconcile succeeded
pub const REASON_RECONCILE_SUCCESS: &str = "ReconcileSuccess";
/// Reason: the last reconcile failed
pub const REASON_RECONCILE_ERROR: &str = "ReconcileError";
/// Reason: every referencer resolved and was assigned
pub const REASON_REFERENCE_RESOLUTION_SUCCESS: &str = "ReferenceResolutionSuccess";
/// Reason: at least one referenced object is missing or not ready
pub const REASON_REFERENCE_RESOLUTION_BLOCKED: &str = "ReferenceResolutionBlocked";

/// Condition status following Kubernetes conventions
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Ready, ReferencesResolved)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// Condition reported when a type has never been set
    pub fn unknown(type_: impl Into<String>) -> Self {
        Self::new(type_, ConditionStatus::Unknown, "", "")
    }

    /// The external resource is available for use
    pub fn available() -> Self {
        Self::new(TYPE_READY, ConditionStatus::True, REASON_AVAILABLE, "")
    }

    /// The external resource is not available for use
    pub fn unavailable() -> Self {
        Self::new(TYPE_READY, ConditionStatus::False, REASON_UNAVAILABLE, "")
    }

    /// The external resource is being created
    pub fn creating() -> Self {
        Self::new(TYPE_READY, ConditionStatus::False, REASON_CREATING, "")
    }

    /// The external resource is being deleted
    pub fn deleting() -> Self {
        Self::new(TYPE_READY, ConditionStatus::False, REASON_DELETING, "")
    }

    /// The last reconcile of the resource succeeded
    pub fn reconcile_success() -> Self {
        Self::new(TYPE_SYNCED, ConditionStatus::True, REASON_RECONCILE_SUCCESS, "")
    }

    /// The last reconcile of the resource failed
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            TYPE_SYNCED,
            ConditionStatus::False,
            REASON_RECONCILE_ERROR,
            message,
        )
    }

    /// Every referencer on the resource was resolved and assigned
    pub fn reference_resolution_success() -> Self {
        Self::new(
            TYPE_REFERENCES_RESOLVED,
            ConditionStatus::True,
            REASON_REFERENCE_RESOLUTION_SUCCESS,
            "",
        )
    }

    /// Resolution is waiting on missing or unready referenced objects
    pub fn reference_resolution_blocked(message: impl Into<String>) -> Self {
        Self::new(
            TYPE_REFERENCES_RESOLVED,
            ConditionStatus::False,
            REASON_REFERENCE_RESOLUTION_BLOCKED,
            message,
        )
    }

    /// Compare two conditions ignoring the transition time
    pub fn equal(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }

    /// Whether this condition is `True`
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Binding phase of a managed resource relative to its claim
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum BindingPhase {
    /// The resource cannot be bound to a claim
    Unbindable,
    /// The resource is ready to be bound
    Unbound,
    /// The resource is bound to a claim
    Bound,
    /// The claim was deleted and the resource was retained
    Released,
}

/// What happens to a managed resource when its claim is deleted
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Keep the managed resource
    #[default]
    Retain,
    /// Delete the managed resource
    Delete,
}

/// What happens to the external resource when the managed resource is deleted
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Leave the external resource in place
    Orphan,
    /// Delete the external resource
    #[default]
    Delete,
}

/// Reference to a cluster-scoped object by name
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Reference {
    /// Name of the referenced object
    pub name: String,
}

/// Reference to a secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,
    /// Namespace of the secret
    pub namespace: String,
}

/// Reference to an arbitrary Kubernetes object
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// API version of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Kind of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Name of the referenced object
    pub name: String,
    /// Namespace of the referenced object (if namespaced)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// UID of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Fields common to the spec of every managed resource.
///
/// Composed into each CRD's spec via `#[serde(flatten)]`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Secret to which connection details of this resource are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// Claim this resource is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_ref: Option<ObjectReference>,

    /// Class this resource was dynamically provisioned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<ObjectReference>,

    /// Provider used to connect to the cloud API.
    /// Deprecated: use `providerConfigRef`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<Reference>,

    /// Provider configuration used to connect to the cloud API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<Reference>,

    /// What happens to this resource when its claim is deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<ReclaimPolicy>,

    /// What happens to the external resource when this resource is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Fields common to the status of every managed resource.
///
/// Composed into each CRD's status via `#[serde(flatten)]`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    /// Conditions of the resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Binding phase of the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_phase: Option<BindingPhase>,
}

impl ResourceStatus {
    /// Get the condition of the given type, or an `Unknown` one if unset
    pub fn get_condition(&self, type_: &str) -> Condition {
        self.conditions
            .iter()
            .find(|c| c.type_ == type_)
            .cloned()
            .unwrap_or_else(|| Condition::unknown(type_))
    }

    /// Set conditions, replacing any existing condition of the same type.
    ///
    /// A condition equal to the existing one (ignoring transition time) keeps
    /// the existing entry so the transition time only moves on real changes.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for new in conditions {
            match self.conditions.iter_mut().find(|c| c.type_ == new.type_) {
                Some(existing) if existing.equal(&new) => {}
                Some(existing) => *existing = new,
                None => self.conditions.push(new),
            }
        }
    }
}

/// Fields common to every resource class template
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpecTemplate {
    /// Namespace to which connection secrets of provisioned resources are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secrets_to_namespace: Option<String>,

    /// Provider used by provisioned resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<Reference>,

    /// Reclaim policy of provisioned resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<ReclaimPolicy>,
}
