//! CLI command implementations

pub mod inspect;
pub mod lifecycle;
pub mod probe;
pub mod render;

use anyhow::{Context, Result};
use neutron_api_core::HookState;
use neutron_api_hooks::NeutronApi;

use crate::cli::GlobalArgs;

/// Load the hook state and build the charm for the running unit
pub(crate) fn load_charm(global: &GlobalArgs) -> Result<NeutronApi> {
    let (state, path) =
        HookState::load(global.state.as_deref()).context("Failed to load hook state")?;
    tracing::debug!(
        "Charm {} on {} from {}",
        state.config.neutron_plugin,
        state.config.openstack_origin,
        path
    );
    Ok(NeutronApi::system(state).with_templates_dir(global.templates.clone()))
}
