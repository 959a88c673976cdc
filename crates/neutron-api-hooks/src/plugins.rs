//! Neutron plugin registry
//!
//! Maps a `neutron-plugin` option value to what neutron-server needs for
//! it: the plugin config file, the contexts rendering that file, and the
//! server-side packages and services.

use crate::constants::NEUTRON_CONF_DIR;
use crate::contexts::SharedDbContext;
use neutron_api_core::types::CharmConfig;
use neutron_api_core::{ContextHandle, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const ML2_PLUGIN: &str = "neutron.plugins.ml2.plugin.Ml2Plugin";

/// Server-side requirements of one neutron plugin
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Plugin config file path
    pub config: String,

    /// Core plugin class configured in neutron.conf
    pub driver: String,

    /// Contexts rendering the plugin config file
    pub contexts: Vec<ContextHandle>,

    pub server_packages: Vec<String>,

    pub server_services: Vec<String>,
}

/// Resolves a plugin identifier to its descriptor
pub trait PluginResolver: Send + Sync {
    fn resolve(&self, plugin: &str, config: &CharmConfig) -> Result<PluginDescriptor>;
}

/// Static attributes of a registered plugin
#[derive(Debug, Clone)]
pub struct PluginEntry {
    pub config: &'static str,
    pub driver: &'static str,
    pub server_packages: &'static [&'static str],
    pub server_services: &'static [&'static str],

    /// Whether the plugin config carries database settings
    pub shared_db: bool,
}

/// Registry of known neutron plugins
pub struct PluginRegistry {
    entries: HashMap<String, PluginEntry>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry with the plugins neutron-server supports out of the box
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "ovs",
            PluginEntry {
                config: "/etc/neutron/plugins/ml2/ml2_conf.ini",
                driver: ML2_PLUGIN,
                server_packages: &["neutron-server", "neutron-plugin-ml2"],
                server_services: &["neutron-server"],
                shared_db: true,
            },
        );
        let nsx = PluginEntry {
            config: "/etc/neutron/plugins/vmware/nsx.ini",
            driver: "vmware",
            server_packages: &["neutron-server", "neutron-plugin-vmware"],
            server_services: &["neutron-server"],
            shared_db: true,
        };
        registry.register("nvp", nsx.clone());
        registry.register("nsx", nsx);
        registry.register(
            "n1kv",
            PluginEntry {
                config: "/etc/neutron/plugins/cisco/cisco_plugins.ini",
                driver: "neutron.plugins.cisco.network_plugin.PluginV2",
                server_packages: &["neutron-server", "neutron-plugin-cisco"],
                server_services: &["neutron-server"],
                shared_db: true,
            },
        );
        registry.register(
            "Calico",
            PluginEntry {
                config: "/etc/neutron/plugins/ml2/ml2_conf.ini",
                driver: ML2_PLUGIN,
                server_packages: &["neutron-server", "calico-control", "etcd"],
                server_services: &["neutron-server", "etcd"],
                shared_db: false,
            },
        );
        registry.register(
            "vsp",
            PluginEntry {
                config: "/etc/neutron/plugins/nuage/nuage_plugin.ini",
                driver: "neutron.plugins.nuage.plugin.NuagePlugin",
                server_packages: &["neutron-server", "neutron-plugin-nuage"],
                server_services: &["neutron-server"],
                shared_db: true,
            },
        );
        registry.register(
            "plumgrid",
            PluginEntry {
                config: "/etc/neutron/plugins/plumgrid/plumgrid.ini",
                driver: "neutron.plugins.plumgrid.plumgrid_plugin.plumgrid_plugin.NeutronPluginPLUMgridV2",
                server_packages: &["neutron-server", "neutron-plugin-plumgrid", "plumgrid-pythonlib"],
                server_services: &["neutron-server"],
                shared_db: false,
            },
        );
        registry
    }

    /// Register or replace a plugin
    pub fn register(&mut self, name: impl Into<String>, entry: PluginEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.entries.get(name)
    }

    /// Registered plugin names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginResolver for PluginRegistry {
    fn resolve(&self, plugin: &str, config: &CharmConfig) -> Result<PluginDescriptor> {
        let entry = self.get(plugin).ok_or_else(|| Error::unknown_plugin(plugin))?;
        debug!("Resolved neutron plugin {} -> {}", plugin, entry.config);

        let mut contexts: Vec<ContextHandle> = Vec::new();
        if entry.shared_db {
            contexts.push(Arc::new(
                SharedDbContext::new(&config.database_user, &config.database)
                    .with_relation_prefix("neutron")
                    .with_ssl_dir(NEUTRON_CONF_DIR),
            ));
        }

        Ok(PluginDescriptor {
            config: entry.config.to_string(),
            driver: entry.driver.to_string(),
            contexts,
            server_packages: entry.server_packages.iter().map(|s| s.to_string()).collect(),
            server_services: entry.server_services.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Core plugin class for a built-in plugin
pub fn core_plugin(plugin: &str) -> Option<&'static str> {
    PluginRegistry::builtin().get(plugin).map(|entry| entry.driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_plugins() {
        let registry = PluginRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["Calico", "n1kv", "nsx", "nvp", "ovs", "plumgrid", "vsp"]
        );
    }

    #[test]
    fn test_resolve_ovs() {
        let descriptor = PluginRegistry::builtin()
            .resolve("ovs", &CharmConfig::default())
            .unwrap();
        assert_eq!(descriptor.config, "/etc/neutron/plugins/ml2/ml2_conf.ini");
        assert_eq!(descriptor.server_packages, ["neutron-server", "neutron-plugin-ml2"]);
        assert_eq!(descriptor.server_services, ["neutron-server"]);
        assert_eq!(descriptor.contexts.len(), 1);
        assert_eq!(descriptor.contexts[0].name(), "shared-db");
    }

    #[test]
    fn test_resolve_calico_has_no_contexts() {
        let descriptor = PluginRegistry::builtin()
            .resolve("Calico", &CharmConfig::default())
            .unwrap();
        assert!(descriptor.contexts.is_empty());
        assert_eq!(descriptor.server_services, ["neutron-server", "etcd"]);
    }

    #[test]
    fn test_resolve_unknown_plugin() {
        let err = PluginRegistry::builtin()
            .resolve("midonet", &CharmConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin { .. }));
    }

    #[test]
    fn test_core_plugin() {
        assert_eq!(core_plugin("ovs"), Some(ML2_PLUGIN));
        assert_eq!(core_plugin("unknown"), None);
    }
}
