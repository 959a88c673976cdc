//! Package derivation and release resolution

use crate::charm::NeutronApi;
use crate::constants::{
    BASE_GIT_PACKAGES, BASE_PACKAGES, GIT_PACKAGE_BLACKLIST, GIT_PACKAGE_BLACKLIST_KILO,
    KILO_PACKAGES,
};
use crate::error::HookError;
use anyhow::Result;
use neutron_api_core::{InstallSource, OpenStackRelease, UbuntuSeries};
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl NeutronApi {
    /// Ubuntu series of the unit
    pub fn series(&self) -> Result<UbuntuSeries> {
        Ok(self.host().lsb_codename()?.parse()?)
    }

    /// OpenStack release a source provides.
    ///
    /// Accepts an install source string or a bare release codename.
    pub fn install_source_release(&self, source: &str) -> Result<OpenStackRelease> {
        if let Ok(release) = source.trim().parse::<OpenStackRelease>() {
            return Ok(release);
        }

        let parsed = InstallSource::parse(source)?;
        let series = match &parsed {
            InstallSource::CloudArchive { series, .. } => *series,
            _ => self.series()?,
        };
        parsed.release(series)?.ok_or_else(|| {
            HookError::UnresolvedRelease {
                source_spec: source.to_string(),
            }
            .into()
        })
    }

    /// Release of an installed package.
    ///
    /// Falls back to the configured install source when the package is not
    /// installed, and to essex when that cannot be resolved either.
    pub fn os_release(&self, package: &str) -> Result<OpenStackRelease> {
        if let Some(version) = self.packages().installed_version(package) {
            if let Some(release) = OpenStackRelease::from_package_version(&version) {
                debug!("{} {} is {}", package, version, release);
                return Ok(release);
            }
            warn!("Unrecognised {} version {}", package, version);
        }

        let origin = &self.state().config.openstack_origin;
        Ok(match self.install_source_release(origin) {
            Ok(release) => release,
            Err(e) => {
                warn!("Could not resolve release of {}: {:#}", origin, e);
                OpenStackRelease::Essex
            }
        })
    }

    /// Packages to install for `source`, or the configured origin
    pub fn determine_packages(&self, source: Option<&str>) -> Result<BTreeSet<String>> {
        let source = source.unwrap_or(&self.state().config.openstack_origin);
        let release = self.install_source_release(source)?;
        let plugin = self.plugin()?;

        let mut packages: BTreeSet<String> = BASE_PACKAGES.iter().map(|p| p.to_string()).collect();
        for (_, entry) in self.resource_map()?.iter() {
            packages.extend(entry.services.iter().cloned());
        }
        packages.extend(plugin.server_packages);

        let kilo_or_later = release >= OpenStackRelease::Kilo;
        if kilo_or_later {
            packages.extend(KILO_PACKAGES.iter().map(|p| p.to_string()));
        }

        if self.git_install_requested() {
            packages.extend(BASE_GIT_PACKAGES.iter().map(|p| p.to_string()));

            let mut blacklist: Vec<&str> = GIT_PACKAGE_BLACKLIST.to_vec();
            if kilo_or_later {
                blacklist.extend_from_slice(GIT_PACKAGE_BLACKLIST_KILO);
            }
            for package in blacklist {
                if !packages.remove(package) {
                    return Err(HookError::BlacklistInvariant {
                        package: package.to_string(),
                    }
                    .into());
                }
            }
        }

        debug!("{} packages for {}", packages.len(), release);
        Ok(packages)
    }
}
