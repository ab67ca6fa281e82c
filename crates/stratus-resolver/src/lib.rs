//! Reference resolution for Stratus managed resources
//!
//! [`resolve_references`] runs one all-or-nothing pass over a resource's
//! referencers. [`controller`] wraps it in kube-rs controllers for every kind
//! that carries referencers.

#![deny(missing_docs)]

pub mod config;
pub mod controller;
pub mod resolver;

pub use config::ResolverConfig;
pub use controller::build_controllers;
pub use resolver::{
    resolve_all, resolve_references, ReferenceStatus, ResolveOutcome, ResourceReport,
};
