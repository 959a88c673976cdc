//! The neutron-api charm and its collaborators
//!
//! `NeutronApi` carries the hook state and the host-facing collaborators
//! every operation works through. The operations themselves live next to
//! their concern (`resource_map`, `packages`, `upgrade`, ...) as further
//! `impl NeutronApi` blocks.

use crate::constants::{CA_CERT_PATH, INSTALL_DPKG_OPTS, TEMPLATES};
use crate::git_install::{GitSourceInstaller, SourceInstaller};
use crate::host::{Apt, CommandRunner, DuctRunner, Host, PackageManager, SystemHost};
use crate::plugins::{PluginDescriptor, PluginRegistry, PluginResolver};
use crate::probes::{ClientConnector, KeystoneConnector};
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use camino::{Utf8Path, Utf8PathBuf};
use neutron_api_core::HookState;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// The neutron-api charm bound to one hook invocation
pub struct NeutronApi {
    state: HookState,
    host: Arc<dyn Host>,
    runner: Arc<dyn CommandRunner>,
    packages: Arc<dyn PackageManager>,
    plugins: Arc<dyn PluginResolver>,
    installer: Arc<dyn SourceInstaller>,
    templates_dir: Utf8PathBuf,
    /// Resolved on first use; only the probes need an API client
    connector: OnceLock<Arc<dyn ClientConnector>>,
}

impl NeutronApi {
    /// Create a charm over explicit host collaborators
    pub fn new(
        state: HookState,
        host: Arc<dyn Host>,
        runner: Arc<dyn CommandRunner>,
        packages: Arc<dyn PackageManager>,
    ) -> Self {
        let installer = Arc::new(GitSourceInstaller::new(runner.clone(), host.clone()));
        Self {
            state,
            host,
            runner,
            packages,
            plugins: Arc::new(PluginRegistry::builtin()),
            installer,
            templates_dir: Utf8PathBuf::from(TEMPLATES),
            connector: OnceLock::new(),
        }
    }

    /// Create a charm operating on the running unit
    pub fn system(state: HookState) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(DuctRunner);
        let host: Arc<dyn Host> = Arc::new(SystemHost::system(runner.clone()));
        let packages = Arc::new(Apt::new(runner.clone(), host.clone()));
        Self::new(state, host, runner, packages)
    }

    pub fn with_plugins(mut self, plugins: Arc<dyn PluginResolver>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn SourceInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_templates_dir(mut self, templates_dir: impl Into<Utf8PathBuf>) -> Self {
        self.templates_dir = templates_dir.into();
        self
    }

    /// Use a specific API client connector instead of keystone
    pub fn with_connector(mut self, connector: Arc<dyn ClientConnector>) -> Self {
        self.connector = OnceLock::from(connector);
        self
    }

    pub fn state(&self) -> &HookState {
        &self.state
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    pub fn packages(&self) -> &Arc<dyn PackageManager> {
        &self.packages
    }

    pub fn installer(&self) -> &Arc<dyn SourceInstaller> {
        &self.installer
    }

    pub fn templates_dir(&self) -> &Utf8Path {
        &self.templates_dir
    }

    pub(crate) fn connector(&self) -> &Arc<dyn ClientConnector> {
        self.connector
            .get_or_init(|| Arc::new(KeystoneConnector::default()))
    }

    /// Descriptor of the configured neutron plugin
    pub fn plugin(&self) -> Result<PluginDescriptor> {
        let name = &self.state.config.neutron_plugin;
        Ok(self.plugins.resolve(name, &self.state.config)?)
    }

    /// Whether neutron is installed from source
    pub fn git_install_requested(&self) -> bool {
        self.state.config.git_install_requested()
    }

    /// The keystone-provided CA certificate, base64 encoded
    pub fn keystone_ca_cert_b64(&self) -> Result<Option<String>> {
        let path = Utf8Path::new(CA_CERT_PATH);
        if !self.host.is_file(path) {
            return Ok(None);
        }
        let cert = self
            .host
            .read(path)
            .with_context(|| format!("Failed to read {}", CA_CERT_PATH))?;
        Ok(Some(STANDARD.encode(cert)))
    }

    /// Install packages, or neutron from source, for the configured origin
    pub fn install(&self) -> Result<()> {
        let origin = &self.state.config.openstack_origin;
        info!("Installing neutron-api from {}", origin);

        self.packages.add_source(origin)?;
        self.packages.update(true)?;

        let packages: Vec<String> = self.determine_packages(None)?.into_iter().collect();
        let options: Vec<String> = INSTALL_DPKG_OPTS.iter().map(|s| s.to_string()).collect();
        self.packages.install(&packages, &options)?;

        if let Some(projects_yaml) = &self.state.config.openstack_origin_git {
            self.git_install(projects_yaml)?;
        }
        Ok(())
    }

    /// Re-render every config file, restarting services whose files changed
    pub fn config_changed(&self, renderer: &dyn Renderer) -> Result<Vec<String>> {
        if self.state.config.prefer_ipv6 {
            self.setup_ipv6()?;
        }
        let restart_map = self.restart_map()?;
        self.restart_on_change(&restart_map, || renderer.write_all())
    }

    /// Run `f`, then restart the services of every file in `restart_map`
    /// whose content changed.
    ///
    /// Returns the restarted services in restart order.
    pub fn restart_on_change<F>(
        &self,
        restart_map: &[(String, Vec<String>)],
        f: F,
    ) -> Result<Vec<String>>
    where
        F: FnOnce() -> Result<()>,
    {
        let before: HashMap<&str, Option<String>> = restart_map
            .iter()
            .map(|(path, _)| (path.as_str(), self.file_hash(path)))
            .collect();

        f()?;

        let mut restarted: Vec<String> = Vec::new();
        for (path, services) in restart_map {
            let after = self.file_hash(path);
            if before.get(path.as_str()) == Some(&after) {
                continue;
            }
            debug!("{} changed", path);
            for service in services {
                if !restarted.contains(service) {
                    restarted.push(service.clone());
                }
            }
        }

        for service in &restarted {
            self.host.service_restart(service)?;
        }
        Ok(restarted)
    }

    fn file_hash(&self, path: &str) -> Option<String> {
        let content = self.host.read(Utf8Path::new(path)).ok()?;
        Some(hex::encode(Sha256::digest(&content)))
    }
}
