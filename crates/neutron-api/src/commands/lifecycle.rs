//! Install, upgrade and source-install commands

use anyhow::{bail, Context, Result};
use neutron_api_hooks::Renderer;

use super::load_charm;
use crate::cli::{GitInstallArgs, GlobalArgs};
use crate::output;

pub fn install(global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    charm.install()?;
    output::success(&format!(
        "Installed neutron-api from {}",
        charm.state().config.openstack_origin
    ));
    Ok(())
}

pub fn upgrade(global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let mut renderer = charm.register_configs(None)?;
    let from = charm.os_release("neutron-server")?;

    charm.do_openstack_upgrade(&mut renderer)?;
    let restarted = charm.config_changed(&renderer)?;

    output::success(&format!("Upgraded from {} to {}", from, renderer.release()));
    if !restarted.is_empty() {
        output::kv("Restarted", &restarted.join(", "));
    }
    Ok(())
}

pub fn setup_ipv6(global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    charm.setup_ipv6()?;
    output::success("Unit is ready for IPv6");
    Ok(())
}

pub fn git_install(args: GitInstallArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    if !charm.git_install_requested() {
        output::warning("openstack-origin-git is not set; nothing to install");
        return Ok(());
    }

    let projects = match (&args.projects, &charm.state().config.openstack_origin_git) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read projects file {}", path))?,
        (None, Some(yaml)) => yaml.clone(),
        (None, None) => bail!("No projects to install from"),
    };

    charm.git_install(&projects)?;
    output::success("Installed neutron from source");
    Ok(())
}
