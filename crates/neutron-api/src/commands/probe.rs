//! Live API probes

use anyhow::{bail, Result};

use super::load_charm;
use crate::cli::{GlobalArgs, RouterFeatureArgs};
use crate::output;

pub fn ready(global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    if charm.neutron_ready() {
        output::success("neutron API is ready");
        Ok(())
    } else {
        output::error("neutron API is not ready");
        bail!("neutron API is not ready")
    }
}

pub fn router_feature(args: RouterFeatureArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let present = match args.feature.as_str() {
        "ha" => charm.l3ha_router_present(),
        "distributed" => charm.dvr_router_present(),
        feature => charm.router_feature_present(feature),
    };

    if present {
        output::info(&format!("A router has {} enabled", args.feature));
    } else {
        output::info(&format!("No router has {} enabled", args.feature));
    }
    Ok(())
}
