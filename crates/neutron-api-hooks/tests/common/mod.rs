//! Common test helpers for neutron-api-hooks integration tests
//!
//! Provides recording mocks for every collaborator of `NeutronApi`:
//! - A shared event log the mocks append to, for ordering assertions
//! - Command runner, package manager and renderer mocks
//! - API client connectors with canned router listings
//! - A unit fixture rooted in a temporary directory

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use camino::{Utf8Path, Utf8PathBuf};
use neutron_api_core::types::IdentityServiceRelation;
use neutron_api_core::{ContextHandle, HookState, OpenStackRelease};
use neutron_api_hooks::host::Invocation;
use neutron_api_hooks::probes::{ClientConnector, Credentials, NeutronClient, Router};
use neutron_api_hooks::renderer::Renderer;
use neutron_api_hooks::{
    CommandRunner, Host, NeutronApi, PackageManager, ProjectsConfig, SourceInstaller, SystemHost,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ─── Event Log ───────────────────────────────────────────────────────────────

/// Ordered record of collaborator calls shared by all mocks of a test
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Events starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    /// Position of the first event starting with `prefix`
    pub fn position(&self, prefix: &str) -> usize {
        let events = self.events();
        events
            .iter()
            .position(|e| e.starts_with(prefix))
            .unwrap_or_else(|| panic!("No event starting with '{}'. Events: {:?}", prefix, events))
    }

    pub fn assert_none(&self, prefix: &str) {
        let events = self.events();
        assert!(
            !events.iter().any(|e| e.starts_with(prefix)),
            "Unexpected event starting with '{}'. Events: {:?}",
            prefix,
            events
        );
    }
}

// ─── Command Runner ──────────────────────────────────────────────────────────

/// Records commands as `run <command line>`; dpkg-query answers from
/// `versions`, commands listed in `failing` exit non-zero
#[derive(Default)]
pub struct RecordingRunner {
    pub log: EventLog,
    pub versions: HashMap<String, String>,
    pub failing: Vec<String>,
}

impl RecordingRunner {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn with_version(mut self, package: &str, version: &str) -> Self {
        self.versions.insert(package.to_string(), version.to_string());
        self
    }

    pub fn failing(mut self, command_prefix: &str) -> Self {
        self.failing.push(command_prefix.to_string());
        self
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        let line = invocation.to_string();
        self.log.record(format!("run {}", line));

        if self.failing.iter().any(|f| line.starts_with(f.as_str())) {
            bail!("{} exited with status 1", invocation.program);
        }
        if invocation.program == "dpkg-query" {
            let package = invocation.args.last().cloned().unwrap_or_default();
            return self
                .versions
                .get(&package)
                .cloned()
                .ok_or_else(|| anyhow!("package {} is not installed", package));
        }
        Ok(String::new())
    }
}

// ─── Package Manager ─────────────────────────────────────────────────────────

/// Records package operations as `add_source`, `update`, `upgrade` and
/// `install` events
#[derive(Default)]
pub struct RecordingPackageManager {
    pub log: EventLog,
    pub installed: HashMap<String, String>,
    pub fail_install: bool,
}

impl RecordingPackageManager {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn with_installed(mut self, package: &str, version: &str) -> Self {
        self.installed.insert(package.to_string(), version.to_string());
        self
    }

    pub fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }
}

impl PackageManager for RecordingPackageManager {
    fn update(&self, fatal: bool) -> Result<()> {
        self.log.record(format!("update fatal={}", fatal));
        Ok(())
    }

    fn upgrade(&self, options: &[String], dist: bool) -> Result<()> {
        self.log
            .record(format!("upgrade dist={} {}", dist, options.join(" ")));
        Ok(())
    }

    fn install(&self, packages: &[String], options: &[String]) -> Result<()> {
        self.log.record(format!(
            "install {} | {}",
            packages.join(" "),
            options.join(" ")
        ));
        if self.fail_install {
            bail!("apt-get install failed");
        }
        Ok(())
    }

    fn add_source(&self, source: &str) -> Result<()> {
        self.log.record(format!("add_source {}", source));
        Ok(())
    }

    fn installed_version(&self, package: &str) -> Option<String> {
        self.installed.get(package).cloned()
    }
}

/// Packages listed in an `install` event
pub fn installed_packages(event: &str) -> Vec<String> {
    event
        .trim_start_matches("install ")
        .split(" | ")
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .map(String::from)
        .collect()
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Renderer recording release switches and writes
pub struct RecordingRenderer {
    pub log: EventLog,
    pub release: OpenStackRelease,
    pub paths: Vec<String>,
}

impl RecordingRenderer {
    pub fn new(log: EventLog, release: OpenStackRelease) -> Self {
        Self {
            log,
            release,
            paths: Vec::new(),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn register(&mut self, path: &str, _contexts: Vec<ContextHandle>) {
        self.paths.push(path.to_string());
    }

    fn set_release(&mut self, release: OpenStackRelease) {
        self.log.record(format!("set_release {}", release));
        self.release = release;
    }

    fn release(&self) -> OpenStackRelease {
        self.release
    }

    fn registered(&self) -> Vec<String> {
        self.paths.clone()
    }

    fn write(&self, path: &str) -> Result<()> {
        self.log.record(format!("write {}", path));
        Ok(())
    }
}

// ─── Source Installer ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingInstaller {
    pub log: EventLog,
}

impl RecordingInstaller {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl SourceInstaller for RecordingInstaller {
    fn clone_and_install(&self, projects: &ProjectsConfig, core_project: &str) -> Result<()> {
        self.log.record(format!(
            "clone_and_install {} ({} repositories)",
            core_project,
            projects.repositories.len()
        ));
        Ok(())
    }

    fn pip_install(&self, package: &str, venv: &Utf8Path, proxy: Option<&str>) -> Result<()> {
        self.log.record(format!(
            "pip_install {} venv={} proxy={}",
            package,
            venv,
            proxy.unwrap_or("none")
        ));
        Ok(())
    }
}

// ─── API Client ──────────────────────────────────────────────────────────────

/// Client answering with a fixed router listing, or failing
pub struct MockClient {
    routers: Option<Vec<Router>>,
}

impl NeutronClient for MockClient {
    fn list_routers(&self) -> Result<Vec<Router>> {
        self.routers
            .clone()
            .ok_or_else(|| anyhow!("503 Service Unavailable"))
    }
}

/// Connector handing out `MockClient`s and recording credentials used
pub struct MockConnector {
    routers: Option<Vec<Router>>,
    refuse: bool,
    pub credentials: Mutex<Vec<Credentials>>,
}

impl MockConnector {
    /// Connector whose client lists `routers`
    pub fn with_routers(routers: Vec<Value>) -> Self {
        let routers = routers
            .into_iter()
            .map(|r| r.as_object().cloned().unwrap_or_default())
            .collect();
        Self {
            routers: Some(routers),
            refuse: false,
            credentials: Mutex::new(Vec::new()),
        }
    }

    /// Connector whose client fails every listing
    pub fn failing_listing() -> Self {
        Self {
            routers: None,
            refuse: false,
            credentials: Mutex::new(Vec::new()),
        }
    }

    /// Connector that cannot build a client at all
    pub fn refusing() -> Self {
        Self {
            routers: None,
            refuse: true,
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn connections(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }
}

impl ClientConnector for MockConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn NeutronClient>> {
        self.credentials.lock().unwrap().push(credentials.clone());
        if self.refuse {
            bail!("keystone unreachable");
        }
        Ok(Box::new(MockClient {
            routers: self.routers.clone(),
        }))
    }
}

// ─── Unit Fixture ────────────────────────────────────────────────────────────

/// A unit filesystem rooted in a temporary directory
pub struct TestUnit {
    pub temp: TempDir,
    pub root: Utf8PathBuf,
    pub log: EventLog,
}

impl TestUnit {
    /// A trusty unit
    pub fn new() -> Self {
        Self::with_series("trusty")
    }

    pub fn with_series(series: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let unit = Self {
            temp,
            root,
            log: EventLog::new(),
        };
        unit.write(
            "/etc/lsb-release",
            &format!(
                "DISTRIB_ID=Ubuntu\nDISTRIB_CODENAME={}\nDISTRIB_DESCRIPTION=\"Ubuntu\"\n",
                series
            ),
        );
        unit
    }

    /// Create a file on the unit
    pub fn write(&self, path: &str, content: &str) {
        let full = self.path(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    pub fn mkdir(&self, path: &str) {
        std::fs::create_dir_all(self.path(path)).unwrap();
    }

    /// Where a unit path lives on the test filesystem
    pub fn path(&self, path: &str) -> Utf8PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path(path)).unwrap()
    }

    /// Host over this unit using `runner` for commands
    pub fn host(&self, runner: Arc<dyn CommandRunner>) -> Arc<dyn Host> {
        Arc::new(SystemHost::new(self.root.clone(), runner))
    }

    /// Charm with recording runner and package manager
    pub fn charm(&self, state: HookState) -> NeutronApi {
        self.charm_with(
            state,
            RecordingRunner::new(self.log.clone()),
            RecordingPackageManager::new(self.log.clone()),
        )
    }

    pub fn charm_with(
        &self,
        state: HookState,
        runner: RecordingRunner,
        packages: RecordingPackageManager,
    ) -> NeutronApi {
        let runner: Arc<dyn CommandRunner> = Arc::new(runner);
        let host = self.host(runner.clone());
        NeutronApi::new(state, host, runner, Arc::new(packages))
            .with_templates_dir(templates_dir())
    }
}

/// Templates shipped with the charm
pub fn templates_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

// ─── Hook State Builders ─────────────────────────────────────────────────────

/// Hook state with the given plugin and origin
pub fn state(plugin: &str, origin: &str) -> HookState {
    let mut state = HookState::default();
    state.config.neutron_plugin = plugin.to_string();
    state.config.openstack_origin = origin.to_string();
    state
}

/// Hook state installing from source
pub fn git_state(origin: &str) -> HookState {
    let mut state = state("ovs", origin);
    state.config.openstack_origin_git = Some(PROJECTS_YAML.to_string());
    state
}

/// Add a complete identity-service relation
pub fn with_identity(mut state: HookState) -> HookState {
    state.relations.identity_service = Some(IdentityServiceRelation {
        service_host: Some("10.5.0.10".into()),
        service_port: Some(5000),
        auth_host: Some("10.5.0.10".into()),
        auth_port: Some(35357),
        service_tenant: Some("services".into()),
        service_username: Some("neutron".into()),
        service_password: Some("s3cret".into()),
        ..Default::default()
    });
    state
}

pub const PROJECTS_YAML: &str = r#"
repositories:
  - name: requirements
    repository: git://github.com/openstack/requirements
    branch: stable/kilo
  - name: neutron
    repository: git://github.com/openstack/neutron
    branch: stable/kilo
directory: /mnt/openstack-git
"#;
