//! Installing neutron from source
//!
//! Used instead of the distro packages when `openstack-origin-git` holds a
//! projects YAML document naming the repositories to build.

use crate::charm::NeutronApi;
use crate::error::HookError;
use crate::host::{CommandRunner, Host, Invocation};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_DIRECTORY: &str = "/mnt/openstack-git";
/// Cloned first so other projects' requirements can be synced against it
const REQUIREMENTS_PROJECT: &str = "requirements";

const NEUTRON_DIRS: &[&str] = &["/var/lib/neutron", "/var/lib/neutron/lock", "/var/log/neutron"];
const NEUTRON_LOGS: &[&str] = &["/var/log/neutron/server.log"];

/// One repository to clone and install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub repository: String,
    pub branch: String,
}

/// Projects YAML given in `openstack-origin-git`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectsConfig {
    pub repositories: Vec<Repository>,

    /// Parent directory for clones and the virtualenv
    #[serde(default = "default_directory")]
    pub directory: Utf8PathBuf,

    #[serde(default)]
    pub http_proxy: Option<String>,

    #[serde(default)]
    pub https_proxy: Option<String>,
}

fn default_directory() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_DIRECTORY)
}

impl ProjectsConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid projects YAML")
    }

    pub fn repository(&self, project: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == project)
    }

    /// Virtualenv every project is installed into
    pub fn venv_dir(&self) -> Utf8PathBuf {
        self.directory.join("venv")
    }

    /// Clone directory of a project
    pub fn src_dir(&self, project: &str) -> Result<Utf8PathBuf> {
        let repo = self
            .repository(project)
            .ok_or_else(|| HookError::MissingProject {
                project: project.to_string(),
            })?;
        let base = repo
            .repository
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(repo.name.as_str());
        Ok(self.directory.join(base))
    }
}

/// Builds projects from source into a virtualenv
pub trait SourceInstaller: Send + Sync {
    /// Clone every repository and install it; `core_project` must be listed
    fn clone_and_install(&self, projects: &ProjectsConfig, core_project: &str) -> Result<()>;

    /// Install a Python package into a virtualenv
    fn pip_install(&self, package: &str, venv: &Utf8Path, proxy: Option<&str>) -> Result<()>;
}

/// Clones with git and installs with the virtualenv's pip
pub struct GitSourceInstaller {
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn Host>,
}

impl GitSourceInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, host: Arc<dyn Host>) -> Self {
        Self { runner, host }
    }

    fn with_proxy(invocation: Invocation, projects: &ProjectsConfig) -> Invocation {
        let mut invocation = invocation;
        if let Some(proxy) = &projects.http_proxy {
            invocation = invocation.env("http_proxy", proxy);
        }
        if let Some(proxy) = &projects.https_proxy {
            invocation = invocation.env("https_proxy", proxy);
        }
        invocation
    }

    fn clone_repo(&self, projects: &ProjectsConfig, repo: &Repository) -> Result<Utf8PathBuf> {
        let dest = projects.src_dir(&repo.name)?;
        if self.host.exists(&dest) {
            debug!("{} already cloned at {}", repo.name, dest);
            return Ok(dest);
        }

        info!("Cloning {} ({})", repo.repository, repo.branch);
        let cmd = Invocation::new("git").args([
            "clone",
            "--branch",
            repo.branch.as_str(),
            repo.repository.as_str(),
            dest.as_str(),
        ]);
        self.runner
            .run(&Self::with_proxy(cmd, projects))
            .with_context(|| format!("Failed to clone {}", repo.repository))?;
        Ok(dest)
    }
}

impl SourceInstaller for GitSourceInstaller {
    fn clone_and_install(&self, projects: &ProjectsConfig, core_project: &str) -> Result<()> {
        if projects.repository(core_project).is_none() {
            return Err(HookError::MissingProject {
                project: core_project.to_string(),
            }
            .into());
        }

        self.host
            .mkdir(&projects.directory, "root", "root", 0o755, false)?;

        let venv = projects.venv_dir();
        if !self.host.exists(&venv) {
            let cmd = Invocation::new("virtualenv").arg(venv.as_str());
            self.runner
                .run(&Self::with_proxy(cmd, projects))
                .context("Failed to create virtualenv")?;
        }

        let mut requirements_dir = None;
        if let Some(repo) = projects.repository(REQUIREMENTS_PROJECT) {
            requirements_dir = Some(self.clone_repo(projects, repo)?);
        }

        for repo in &projects.repositories {
            if repo.name == REQUIREMENTS_PROJECT {
                continue;
            }
            let src = self.clone_repo(projects, repo)?;

            if let Some(requirements) = &requirements_dir {
                let cmd = Invocation::new(venv.join("bin/python").as_str())
                    .arg(requirements.join("update.py").as_str())
                    .arg(src.as_str());
                self.runner
                    .run(&cmd)
                    .with_context(|| format!("Failed to sync requirements of {}", repo.name))?;
            }

            self.pip_install(src.as_str(), &venv, projects.http_proxy.as_deref())?;
        }
        Ok(())
    }

    fn pip_install(&self, package: &str, venv: &Utf8Path, proxy: Option<&str>) -> Result<()> {
        info!("Installing {} into {}", package, venv);
        let mut cmd = Invocation::new(venv.join("bin/pip").as_str()).arg("install");
        if let Some(proxy) = proxy {
            cmd = cmd.arg(format!("--proxy={}", proxy));
        }
        self.runner
            .run(&cmd.arg(package))
            .with_context(|| format!("pip install {} failed", package))?;
        Ok(())
    }
}

impl NeutronApi {
    /// Install neutron from the repositories in `projects_yaml`.
    ///
    /// Does nothing unless a source install is configured.
    pub fn git_install(&self, projects_yaml: &str) -> Result<()> {
        if !self.git_install_requested() {
            return Ok(());
        }

        let projects = ProjectsConfig::from_yaml(projects_yaml)?;
        self.git_pre_install()?;
        self.installer().clone_and_install(&projects, "neutron")?;
        self.git_post_install(&projects)
    }

    /// Create the neutron account, state directories and log files
    pub fn git_pre_install(&self) -> Result<()> {
        let host = self.host();
        host.add_user("neutron", "/bin/bash", true)?;
        host.add_group("neutron", true)?;
        host.add_user_to_group("neutron", "neutron")?;

        for dir in NEUTRON_DIRS {
            host.mkdir(Utf8Path::new(dir), "neutron", "neutron", 0o755, false)?;
        }
        for log in NEUTRON_LOGS {
            host.write_file(Utf8Path::new(log), b"", "neutron", "neutron", 0o600)?;
        }
        Ok(())
    }

    /// Install runtime dependencies, put config trees, binaries and the
    /// init script in place, then restart neutron-server
    pub fn git_post_install(&self, projects: &ProjectsConfig) -> Result<()> {
        let host = self.host();
        let venv = projects.venv_dir();
        let bin_dir = venv.join("bin");

        self.installer()
            .pip_install("mysql-python", &venv, projects.http_proxy.as_deref())?;

        let src_etc = projects.src_dir("neutron")?.join("etc");
        let config_trees = [
            (src_etc.clone(), Utf8PathBuf::from("/etc/neutron")),
            (src_etc.join("neutron/plugins"), Utf8PathBuf::from("/etc/neutron/plugins")),
            (
                src_etc.join("neutron/rootwrap.d"),
                Utf8PathBuf::from("/etc/neutron/rootwrap.d"),
            ),
        ];
        for (src, dest) in &config_trees {
            if host.exists(dest) {
                host.remove_tree(dest)?;
            }
            host.copy_tree(src, dest)?;
        }

        // TODO: replace the bin symlinks once the venv bin dir is on PATH
        for name in ["neutron-rootwrap", "neutron-db-manage"] {
            let link = Utf8PathBuf::from("/usr/local/bin").join(name);
            if host.lexists(&link) {
                host.remove_file(&link)?;
            }
            host.symlink(&bin_dir.join(name), &link)?;
        }

        self.render_template(
            "git/neutron_sudoers",
            Utf8Path::new("/etc/sudoers.d/neutron_sudoers"),
            &tera::Context::new(),
            0o440,
        )?;

        let mut upstart = tera::Context::new();
        upstart.insert("service_description", "Neutron API server");
        upstart.insert("charm_name", "neutron-api");
        upstart.insert("process_name", "neutron-server");
        upstart.insert("executable_name", bin_dir.join("neutron-server").as_str());
        self.render_template(
            "git/upstart/neutron-server.upstart",
            Utf8Path::new("/etc/init/neutron-server.conf"),
            &upstart,
            0o644,
        )?;

        host.service_restart("neutron-server")
    }
}
