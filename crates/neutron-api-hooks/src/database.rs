//! neutron database schema management

use crate::charm::NeutronApi;
use crate::constants::NEUTRON_CONF;
use crate::host::Invocation;
use anyhow::{Context, Result};
use neutron_api_core::OpenStackRelease;
use tracing::info;

impl NeutronApi {
    fn db_manage(&self) -> Result<Invocation> {
        let plugin = self.plugin()?;
        Ok(Invocation::new("neutron-db-manage").args([
            "--config-file",
            NEUTRON_CONF,
            "--config-file",
            plugin.config.as_str(),
        ]))
    }

    /// Mark the database as being at `release` without migrating it
    pub fn stamp_neutron_database(&self, release: OpenStackRelease) -> Result<()> {
        info!("Stamping the neutron database with release {}", release);
        let cmd = self.db_manage()?.args(["stamp", release.as_str()]);
        self.runner()
            .run(&cmd)
            .context("Failed to stamp the neutron database")?;
        Ok(())
    }

    /// Initialise a new database or upgrade an existing one to head
    pub fn migrate_neutron_database(&self) -> Result<()> {
        info!("Migrating the neutron database");
        let cmd = self.db_manage()?.args(["upgrade", "head"]);
        self.runner()
            .run(&cmd)
            .context("Failed to migrate the neutron database")?;
        Ok(())
    }
}
