//! Context provider interface
//!
//! A context provider produces one fragment of the data a config template is
//! rendered with. Fragments for a file are merged in registration order, so a
//! later provider overrides keys set by an earlier one.

use std::fmt;
use std::sync::Arc;

use crate::config::HookState;

/// Key-value data produced by one context provider
pub type ContextFragment = serde_json::Map<String, serde_json::Value>;

/// Shared handle to a context provider, as stored in resource maps
pub type ContextHandle = Arc<dyn ContextProvider>;

/// Producer of a configuration fragment
pub trait ContextProvider: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Relation interfaces this provider depends on.
    ///
    /// An empty fragment from a provider with interfaces marks those
    /// interfaces as incomplete.
    fn interfaces(&self) -> &'static [&'static str] {
        &[]
    }

    /// Produce the current configuration fragment
    fn produce(&self, state: &HookState) -> anyhow::Result<ContextFragment>;
}
