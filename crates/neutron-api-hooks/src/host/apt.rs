//! Package management through apt

use super::{CommandRunner, Host, Invocation};
use anyhow::{Context, Result};
use camino::Utf8Path;
use neutron_api_core::{InstallSource, UbuntuSeries};
use std::sync::Arc;
use tracing::{debug, info, warn};

const CLOUD_ARCHIVE_LIST: &str = "/etc/apt/sources.list.d/cloud-archive.list";
const PROPOSED_LIST: &str = "/etc/apt/sources.list.d/juju_deb.list";
const CLOUD_ARCHIVE_URL: &str = "http://ubuntu-cloud.archive.canonical.com/ubuntu";
const UBUNTU_ARCHIVE_URL: &str = "http://archive.ubuntu.com/ubuntu";

/// Package manager operations used by hooks
pub trait PackageManager: Send + Sync {
    /// Refresh package indexes; failures are only logged unless `fatal`
    fn update(&self, fatal: bool) -> Result<()>;

    /// Upgrade installed packages, as a dist-upgrade when `dist`
    fn upgrade(&self, options: &[String], dist: bool) -> Result<()>;

    fn install(&self, packages: &[String], options: &[String]) -> Result<()>;

    /// Add a package source (install source string or apt line)
    fn add_source(&self, source: &str) -> Result<()>;

    /// Installed version of a package, if installed
    fn installed_version(&self, package: &str) -> Option<String>;
}

/// apt-get based package manager
pub struct Apt {
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn Host>,
}

impl Apt {
    pub fn new(runner: Arc<dyn CommandRunner>, host: Arc<dyn Host>) -> Self {
        Self { runner, host }
    }

    fn apt_get(&self) -> Invocation {
        Invocation::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
    }

    fn series(&self) -> Result<UbuntuSeries> {
        Ok(self.host.lsb_codename()?.parse()?)
    }

    fn add_cloud_archive(
        &self,
        series: UbuntuSeries,
        release: &str,
        proposed: bool,
    ) -> Result<()> {
        if self.installed_version("ubuntu-cloud-keyring").is_none() {
            self.install(&["ubuntu-cloud-keyring".to_string()], &[])?;
        }

        let pocket = if proposed { "proposed" } else { "updates" };
        let line = format!(
            "deb {} {}-{}/{} main\n",
            CLOUD_ARCHIVE_URL, series, pocket, release
        );
        self.host
            .write(Utf8Path::new(CLOUD_ARCHIVE_LIST), line.as_bytes())
            .context("Failed to write cloud archive source list")
    }
}

impl PackageManager for Apt {
    fn update(&self, fatal: bool) -> Result<()> {
        info!("Updating apt package indexes");
        match self.runner.run(&self.apt_get().arg("update")) {
            Ok(_) => Ok(()),
            Err(e) if !fatal => {
                warn!("apt-get update failed: {}", e);
                Ok(())
            }
            Err(e) => Err(e.context("apt-get update failed")),
        }
    }

    fn upgrade(&self, options: &[String], dist: bool) -> Result<()> {
        let verb = if dist { "dist-upgrade" } else { "upgrade" };
        info!("Upgrading packages ({})", verb);
        let cmd = self
            .apt_get()
            .arg("--assume-yes")
            .args(options.iter().cloned())
            .arg(verb);
        self.runner
            .run(&cmd)
            .with_context(|| format!("apt-get {} failed", verb))?;
        Ok(())
    }

    fn install(&self, packages: &[String], options: &[String]) -> Result<()> {
        if packages.is_empty() {
            debug!("No packages to install");
            return Ok(());
        }

        info!("Installing {:?}", packages);
        let cmd = self
            .apt_get()
            .arg("--assume-yes")
            .args(options.iter().cloned())
            .arg("install")
            .args(packages.iter().cloned());
        self.runner
            .run(&cmd)
            .context("apt-get install failed")?;
        Ok(())
    }

    fn add_source(&self, source: &str) -> Result<()> {
        let parsed = InstallSource::parse(source)?;
        debug!("Adding source {:?}", parsed);

        match parsed {
            InstallSource::Distro => Ok(()),
            InstallSource::DistroProposed => {
                let line = format!(
                    "deb {} {}-proposed restricted main multiverse universe\n",
                    UBUNTU_ARCHIVE_URL,
                    self.series()?
                );
                self.host
                    .write(Utf8Path::new(PROPOSED_LIST), line.as_bytes())
                    .context("Failed to write proposed source list")
            }
            InstallSource::CloudArchive {
                series,
                release,
                proposed,
            } => self.add_cloud_archive(series, release.as_str(), proposed),
            InstallSource::Ppa(src) | InstallSource::Deb(src) => {
                self.runner
                    .run(&Invocation::new("add-apt-repository").args(["--yes", src.as_str()]))
                    .with_context(|| format!("Failed to add source {}", src))?;
                Ok(())
            }
        }
    }

    fn installed_version(&self, package: &str) -> Option<String> {
        let cmd = Invocation::new("dpkg-query").args([
            "--show",
            "--showformat=${Version}",
            package,
        ]);
        match self.runner.run(&cmd) {
            Ok(version) if !version.is_empty() => Some(version),
            _ => None,
        }
    }
}
