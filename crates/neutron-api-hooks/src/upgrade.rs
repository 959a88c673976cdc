//! OpenStack release upgrades

use crate::charm::NeutronApi;
use crate::constants::UPGRADE_DPKG_OPTS;
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use neutron_api_core::OpenStackRelease;
use tracing::info;

impl NeutronApi {
    /// Upgrade to the release of the configured `openstack-origin`.
    ///
    /// Switches the package source, upgrades and installs packages, re-binds
    /// `renderer` to the new release and, from kilo on, stamps and migrates
    /// the database. Earlier releases leave migrations to the cloud
    /// controller. Nothing is retried; a failure leaves the upgrade partial.
    pub fn do_openstack_upgrade(&self, renderer: &mut dyn Renderer) -> Result<()> {
        let current = self.os_release("neutron-server")?;
        let origin = self.state().config.openstack_origin.clone();
        let target = self.install_source_release(&origin)?;

        info!("Performing OpenStack upgrade to {}", target);

        self.packages()
            .add_source(&origin)
            .with_context(|| format!("Failed to configure installation source {}", origin))?;

        let options: Vec<String> = UPGRADE_DPKG_OPTS.iter().map(|s| s.to_string()).collect();
        self.packages().update(true)?;
        self.packages().upgrade(&options, true)?;

        let packages: Vec<String> = self
            .determine_packages(Some(target.as_str()))?
            .into_iter()
            .collect();
        self.packages().install(&packages, &options)?;

        renderer.set_release(target);

        if target >= OpenStackRelease::Kilo {
            self.stamp_neutron_database(current)?;
            self.migrate_neutron_database()?;
        }
        Ok(())
    }
}
