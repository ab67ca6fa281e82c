//! All-or-nothing resolution of a resource's referencers
//!
//! Every referencer on the resource is resolved before anything is written.
//! If any source is missing or not ready the resource is left exactly as it
//! was, so an abandoned or blocked pass never leaves a partial assignment
//! behind.

use std::fmt;

use tracing::{debug, info};

use stratus_common::crd::ManagedKind;
use stratus_common::reference::{CanReference, MemoryStore, ReferenceStore, Resolution};
use stratus_common::Error;

/// Resolution state of one referencer field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceStatus {
    /// Referencer variant
    pub referencer: &'static str,
    /// Field the referencer writes to
    pub field: &'static str,
    /// Kind of the referenced resource
    pub source_kind: ManagedKind,
    /// Name of the referenced resource
    pub source_name: String,
    /// What resolving the reference produced
    pub resolution: Resolution,
}

impl fmt::Display for ReferenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {}: {}",
            self.field, self.source_kind, self.source_name, self.resolution
        )
    }
}

/// Result of a resolution pass over one resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The resource carries no referencers
    NoReferences,
    /// At least one source is missing or not ready; nothing was written
    Blocked(Vec<ReferenceStatus>),
    /// Every referencer resolved and its value was assigned
    Resolved {
        /// Whether any bound field changed value
        changed: bool,
        /// Per-field resolution results
        references: Vec<ReferenceStatus>,
    },
}

impl ResolveOutcome {
    /// Per-field resolution results, empty when there are no referencers
    pub fn references(&self) -> &[ReferenceStatus] {
        match self {
            Self::NoReferences => &[],
            Self::Blocked(references) | Self::Resolved { references, .. } => references,
        }
    }

    /// Whether the resource's spec was modified
    pub fn changed(&self) -> bool {
        matches!(self, Self::Resolved { changed: true, .. })
    }

    /// One-line summary of the references that are not resolved yet
    pub fn blocked_message(&self) -> Option<String> {
        match self {
            Self::Blocked(references) => Some(
                references
                    .iter()
                    .filter(|r| !r.resolution.is_ready())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

/// Resolve every referencer on `resource` and assign the results
///
/// Destination kinds are checked for every referencer before the store is
/// read, so a misattached referencer fails with `Error::TypeMismatch` and no
/// field is written.
pub async fn resolve_references<T>(
    store: &dyn ReferenceStore,
    resource: &mut T,
) -> Result<ResolveOutcome, Error>
where
    T: CanReference + Clone + PartialEq,
{
    let referencers = resource.referencers();
    if referencers.is_empty() {
        return Ok(ResolveOutcome::NoReferences);
    }

    let kind = resource.as_managed_mut().kind();
    for referencer in &referencers {
        referencer.check_destination(kind)?;
    }

    let mut references = Vec::with_capacity(referencers.len());
    for referencer in &referencers {
        let resolution = referencer.resolve(store).await?;
        references.push(ReferenceStatus {
            referencer: referencer.type_name(),
            field: referencer.binding().field,
            source_kind: referencer.attribute().source_kind(),
            source_name: referencer.source_name().to_string(),
            resolution,
        });
    }

    let blocked = references
        .iter()
        .filter(|r| !r.resolution.is_ready())
        .count();
    if blocked > 0 {
        debug!(%kind, blocked, "references not resolvable yet");
        return Ok(ResolveOutcome::Blocked(references));
    }

    let before = resource.clone();
    for (referencer, status) in referencers.iter().zip(&references) {
        if let Some(value) = status.resolution.value() {
            referencer.assign(resource.as_managed_mut(), value)?;
        }
    }
    let changed = *resource != before;

    if changed {
        info!(%kind, references = references.len(), "assigned resolved references");
    }
    Ok(ResolveOutcome::Resolved {
        changed,
        references,
    })
}

/// Resolution result for one resource of a [`MemoryStore`]
#[derive(Debug)]
pub struct ResourceReport {
    /// Kind of the resource
    pub kind: ManagedKind,
    /// Name of the resource
    pub name: String,
    /// Outcome of the pass, or why it failed
    pub result: Result<ResolveOutcome, Error>,
}

/// Resolve every resource held in `store`, writing results back into it
///
/// Resources are visited in kind then name order. Sources are read from the
/// store as it is when each resource is visited. A failing resource is
/// reported and does not stop the others.
pub async fn resolve_all(store: &mut MemoryStore) -> Vec<ResourceReport> {
    let mut reports = Vec::with_capacity(store.len());
    for (kind, name) in store.keys() {
        let Some(mut object) = store.lookup(kind, &name).cloned() else {
            continue;
        };
        let result = resolve_references(&*store, &mut object).await;
        if matches!(result, Ok(ResolveOutcome::Resolved { changed: true, .. })) {
            store.insert(object);
        }
        reports.push(ResourceReport { kind, name, result });
    }
    reports
}
