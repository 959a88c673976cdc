//! Filesystem, account and service operations on the unit

use super::{CommandRunner, Invocation};
use anyhow::{anyhow, bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Host operations used by hooks.
///
/// All paths are absolute paths as seen on the unit.
pub trait Host: Send + Sync {
    /// Whether the path exists, following symlinks
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Whether the path exists without following symlinks
    fn lexists(&self, path: &Utf8Path) -> bool;

    fn is_file(&self, path: &Utf8Path) -> bool;

    fn read(&self, path: &Utf8Path) -> Result<Vec<u8>>;

    /// Write content, creating parent directories, without touching ownership
    fn write(&self, path: &Utf8Path, content: &[u8]) -> Result<()>;

    /// Write content with ownership and permissions
    fn write_file(
        &self,
        path: &Utf8Path,
        content: &[u8],
        owner: &str,
        group: &str,
        perms: u32,
    ) -> Result<()>;

    /// Create a directory tree with ownership and permissions.
    ///
    /// With `force`, a non-directory already at `path` is replaced.
    fn mkdir(&self, path: &Utf8Path, owner: &str, group: &str, perms: u32, force: bool)
        -> Result<()>;

    fn remove_tree(&self, path: &Utf8Path) -> Result<()>;

    /// Copy a directory tree; the destination must not exist
    fn copy_tree(&self, src: &Utf8Path, dest: &Utf8Path) -> Result<()>;

    fn remove_file(&self, path: &Utf8Path) -> Result<()>;

    fn symlink(&self, target: &Utf8Path, link: &Utf8Path) -> Result<()>;

    /// Create a user unless it already exists
    fn add_user(&self, name: &str, shell: &str, system_user: bool) -> Result<()>;

    /// Create a group unless it already exists
    fn add_group(&self, name: &str, system_group: bool) -> Result<()>;

    fn add_user_to_group(&self, user: &str, group: &str) -> Result<()>;

    fn service_restart(&self, service: &str) -> Result<()>;

    /// Lowercase Ubuntu series codename of the unit
    fn lsb_codename(&self) -> Result<String>;
}

/// Host implementation operating on a filesystem root.
///
/// The root is `/` on a unit; any other root confines every path to a
/// directory tree, which is how hooks are exercised in tests. Account,
/// ownership and service changes are delegated to system commands.
pub struct SystemHost {
    root: Utf8PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl SystemHost {
    /// Create a host rooted at `root`
    pub fn new(root: impl Into<Utf8PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    /// Host for the real system root
    pub fn system(runner: Arc<dyn CommandRunner>) -> Self {
        Self::new("/", runner)
    }

    /// Map a unit path onto this host's root
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if self.root == "/" {
            return path.to_owned();
        }
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }

    fn chown(&self, path: &Utf8Path, owner: &str, group: &str) -> Result<()> {
        self.runner.run(
            &Invocation::new("chown")
                .arg(format!("{}:{}", owner, group))
                .arg(self.resolve(path).as_str()),
        )?;
        Ok(())
    }

    fn chmod(&self, path: &Utf8Path, perms: u32) -> Result<()> {
        let real = self.resolve(path);
        fs::set_permissions(&real, fs::Permissions::from_mode(perms))
            .with_context(|| format!("Failed to set permissions on {}", real))
    }

    fn account_exists(&self, database: &str, name: &str) -> bool {
        self.runner
            .run(&Invocation::new("getent").args([database, name]))
            .is_ok()
    }
}

impl Host for SystemHost {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.resolve(path).exists()
    }

    fn lexists(&self, path: &Utf8Path) -> bool {
        fs::symlink_metadata(self.resolve(path)).is_ok()
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&self, path: &Utf8Path) -> Result<Vec<u8>> {
        let real = self.resolve(path);
        fs::read(&real).with_context(|| format!("Failed to read {}", real))
    }

    fn write(&self, path: &Utf8Path, content: &[u8]) -> Result<()> {
        let real = self.resolve(path);
        if let Some(parent) = real.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory for {}", real))?;
        }
        fs::write(&real, content).with_context(|| format!("Failed to write {}", real))
    }

    fn write_file(
        &self,
        path: &Utf8Path,
        content: &[u8],
        owner: &str,
        group: &str,
        perms: u32,
    ) -> Result<()> {
        debug!(
            "Writing file {} {}:{} {:o}",
            path, owner, group, perms
        );
        self.write(path, content)?;
        self.chown(path, owner, group)?;
        self.chmod(path, perms)
    }

    fn mkdir(
        &self,
        path: &Utf8Path,
        owner: &str,
        group: &str,
        perms: u32,
        force: bool,
    ) -> Result<()> {
        let real = self.resolve(path);
        debug!("Making dir {} {}:{} {:o}", path, owner, group, perms);

        if real.exists() {
            if force && !real.is_dir() {
                fs::remove_file(&real)
                    .with_context(|| format!("Failed to remove {}", real))?;
                fs::create_dir_all(&real)
                    .with_context(|| format!("Failed to create {}", real))?;
            }
        } else {
            fs::create_dir_all(&real).with_context(|| format!("Failed to create {}", real))?;
        }

        self.chown(path, owner, group)?;
        self.chmod(path, perms)
    }

    fn remove_tree(&self, path: &Utf8Path) -> Result<()> {
        let real = self.resolve(path);
        fs::remove_dir_all(&real).with_context(|| format!("Failed to remove {}", real))
    }

    fn copy_tree(&self, src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
        let src = self.resolve(src);
        let dest = self.resolve(dest);

        if dest.exists() {
            bail!("Copy destination already exists: {}", dest);
        }
        if !src.is_dir() {
            bail!("Copy source is not a directory: {}", src);
        }

        for entry in WalkDir::new(&src) {
            let entry = entry.with_context(|| format!("Failed to walk {}", src))?;
            let relative = entry
                .path()
                .strip_prefix(&src)
                .map_err(|e| anyhow!("Path outside copy source: {}", e))?;
            let target = dest.as_std_path().join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
            } else {
                fs::copy(entry.path(), &target).with_context(|| {
                    format!(
                        "Failed to copy {} to {}",
                        entry.path().display(),
                        target.display()
                    )
                })?;
            }
        }

        Ok(())
    }

    fn remove_file(&self, path: &Utf8Path) -> Result<()> {
        let real = self.resolve(path);
        fs::remove_file(&real).with_context(|| format!("Failed to remove {}", real))
    }

    fn symlink(&self, target: &Utf8Path, link: &Utf8Path) -> Result<()> {
        let real_target = self.resolve(target);
        let real_link = self.resolve(link);
        if let Some(parent) = real_link.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory for {}", real_link))?;
        }
        std::os::unix::fs::symlink(&real_target, &real_link)
            .with_context(|| format!("Failed to link {} -> {}", real_link, real_target))
    }

    fn add_user(&self, name: &str, shell: &str, system_user: bool) -> Result<()> {
        if self.account_exists("passwd", name) {
            info!("user '{}' already exists", name);
            return Ok(());
        }

        info!("creating user '{}'", name);
        let mut cmd = Invocation::new("useradd");
        if system_user {
            cmd = cmd.arg("--system");
        }
        cmd = cmd.args(["--shell", shell, name]);
        self.runner.run(&cmd)?;
        Ok(())
    }

    fn add_group(&self, name: &str, system_group: bool) -> Result<()> {
        if self.account_exists("group", name) {
            info!("group '{}' already exists", name);
            return Ok(());
        }

        info!("creating group '{}'", name);
        let mut cmd = Invocation::new("groupadd");
        if system_group {
            cmd = cmd.arg("--system");
        }
        self.runner.run(&cmd.arg(name))?;
        Ok(())
    }

    fn add_user_to_group(&self, user: &str, group: &str) -> Result<()> {
        info!("Adding user {} to group {}", user, group);
        self.runner
            .run(&Invocation::new("gpasswd").args(["-a", user, group]))?;
        Ok(())
    }

    fn service_restart(&self, service: &str) -> Result<()> {
        info!("Restarting service {}", service);
        self.runner
            .run(&Invocation::new("service").args([service, "restart"]))?;
        Ok(())
    }

    fn lsb_codename(&self) -> Result<String> {
        let content = self.read(Utf8Path::new("/etc/lsb-release"))?;
        String::from_utf8_lossy(&content)
            .lines()
            .find_map(|line| line.strip_prefix("DISTRIB_CODENAME="))
            .map(|codename| codename.trim().trim_matches('"').to_lowercase())
            .ok_or_else(|| anyhow!("DISTRIB_CODENAME missing from /etc/lsb-release"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        missing_accounts: bool,
    }

    impl CommandRunner for Recorder {
        fn run(&self, invocation: &Invocation) -> Result<String> {
            self.commands.lock().unwrap().push(invocation.to_string());
            if self.missing_accounts && invocation.program == "getent" {
                bail!("not found");
            }
            Ok(String::new())
        }
    }

    fn host(temp: &TempDir, recorder: Arc<Recorder>) -> SystemHost {
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        SystemHost::new(root, recorder)
    }

    #[test]
    fn test_resolve_under_root() {
        let temp = TempDir::new().unwrap();
        let host = host(&temp, Arc::new(Recorder::default()));
        let resolved = host.resolve(Utf8Path::new("/etc/neutron/neutron.conf"));
        assert!(resolved.starts_with(temp.path().to_str().unwrap()));
        assert!(resolved.ends_with("etc/neutron/neutron.conf"));

        let system = SystemHost::system(Arc::new(Recorder::default()));
        assert_eq!(
            system.resolve(Utf8Path::new("/etc/neutron")),
            Utf8PathBuf::from("/etc/neutron")
        );
    }

    #[test]
    fn test_mkdir_and_write_file_set_modes() {
        let temp = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let host = host(&temp, recorder.clone());

        host.mkdir(Utf8Path::new("/var/log/neutron"), "neutron", "neutron", 0o755, false)
            .unwrap();
        host.write_file(
            Utf8Path::new("/var/log/neutron/server.log"),
            b"",
            "neutron",
            "neutron",
            0o600,
        )
        .unwrap();

        let log = temp.path().join("var/log/neutron/server.log");
        let mode = fs::metadata(&log).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        let dir_mode = fs::metadata(temp.path().join("var/log/neutron"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o755);

        let commands = recorder.commands.lock().unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| c.starts_with("chown neutron:neutron ")));
    }

    #[test]
    fn test_copy_tree_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let host = host(&temp, Arc::new(Recorder::default()));

        host.write(Utf8Path::new("/src/etc/a.conf"), b"a").unwrap();
        host.write(Utf8Path::new("/src/etc/sub/b.conf"), b"b").unwrap();

        host.copy_tree(Utf8Path::new("/src/etc"), Utf8Path::new("/dest"))
            .unwrap();
        assert_eq!(fs::read(temp.path().join("dest/sub/b.conf")).unwrap(), b"b");

        assert!(host
            .copy_tree(Utf8Path::new("/src/etc"), Utf8Path::new("/dest"))
            .is_err());
    }

    #[test]
    fn test_lexists_sees_dangling_symlink() {
        let temp = TempDir::new().unwrap();
        let host = host(&temp, Arc::new(Recorder::default()));
        let link = Utf8Path::new("/usr/local/bin/dangling");

        host.symlink(Utf8Path::new("/nowhere"), link).unwrap();
        assert!(host.lexists(link));
        assert!(!host.exists(link));
    }

    #[test]
    fn test_add_user_skips_existing() {
        let temp = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder::default());
        let host = host(&temp, recorder.clone());

        host.add_user("neutron", "/bin/bash", true).unwrap();
        let commands = recorder.commands.lock().unwrap();
        assert_eq!(commands.as_slice(), ["getent passwd neutron"]);
    }

    #[test]
    fn test_add_user_and_group_create_missing() {
        let temp = TempDir::new().unwrap();
        let recorder = Arc::new(Recorder {
            missing_accounts: true,
            ..Default::default()
        });
        let host = host(&temp, recorder.clone());

        host.add_user("neutron", "/bin/bash", true).unwrap();
        host.add_group("neutron", true).unwrap();

        let commands = recorder.commands.lock().unwrap();
        assert!(commands.contains(&"useradd --system --shell /bin/bash neutron".to_string()));
        assert!(commands.contains(&"groupadd --system neutron".to_string()));
    }

    #[test]
    fn test_lsb_codename() {
        let temp = TempDir::new().unwrap();
        let host = host(&temp, Arc::new(Recorder::default()));
        host.write(
            Utf8Path::new("/etc/lsb-release"),
            b"DISTRIB_ID=Ubuntu\nDISTRIB_RELEASE=14.04\nDISTRIB_CODENAME=Trusty\n",
        )
        .unwrap();

        assert_eq!(host.lsb_codename().unwrap(), "trusty");
    }
}
