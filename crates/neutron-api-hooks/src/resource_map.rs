//! Resource map: which services and contexts own each config file
//!
//! The map is rebuilt on every call so it always reflects the configured
//! plugin and the Apache layout currently on disk.

use crate::charm::NeutronApi;
use crate::constants::{
    api_port, APACHE_24_CONF, APACHE_CONF, APACHE_CONF_AVAILABLE, HAPROXY_CONF, NEUTRON_CONF,
    NEUTRON_CONF_DIR, NEUTRON_DEFAULT,
};
use crate::contexts::{
    AmqpContext, ApacheSslContext, BindHostContext, HaProxyContext, IdentityServiceContext,
    NeutronCcContext, NeutronHaProxyContext, NotificationDriverContext, PostgresqlDbContext,
    SharedDbContext, SyslogContext, WorkerConfigContext, ZeroMqContext,
};
use anyhow::Result;
use camino::Utf8Path;
use neutron_api_core::types::CharmConfig;
use neutron_api_core::ContextHandle;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Services restarted and contexts rendered for one config file
#[derive(Debug, Clone, Default)]
pub struct ResourceEntry {
    pub services: Vec<String>,
    pub contexts: Vec<ContextHandle>,
}

impl ResourceEntry {
    pub fn new(services: &[&str], contexts: Vec<ContextHandle>) -> Self {
        Self {
            services: services.iter().map(|s| s.to_string()).collect(),
            contexts,
        }
    }
}

/// Config file path to resources, in insertion order
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: Vec<(String, ResourceEntry)>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; an existing path keeps its position
    pub fn insert(&mut self, path: impl Into<String>, entry: ResourceEntry) {
        let path = path.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((path, entry)),
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<ResourceEntry> {
        let index = self.entries.iter().position(|(p, _)| p == path)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, path: &str) -> Option<&ResourceEntry> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceEntry)> {
        self.entries.iter().map(|(p, entry)| (p.as_str(), entry))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Config file path to the services restarted when it changes
pub type RestartMap = Vec<(String, Vec<String>)>;

/// Resources managed regardless of plugin, before the Apache branch is applied
pub fn base_resource_map(config: &CharmConfig) -> ResourceMap {
    let neutron_cc: ContextHandle = Arc::new(NeutronCcContext);
    let apache_ssl: ContextHandle = Arc::new(ApacheSslContext);

    let mut map = ResourceMap::new();
    map.insert(
        NEUTRON_CONF,
        ResourceEntry::new(
            &["neutron-server"],
            vec![
                Arc::new(AmqpContext::new(NEUTRON_CONF_DIR)),
                Arc::new(
                    SharedDbContext::new(&config.database_user, &config.database)
                        .with_ssl_dir(NEUTRON_CONF_DIR),
                ),
                Arc::new(PostgresqlDbContext::new(&config.database)),
                Arc::new(IdentityServiceContext::new("neutron", "neutron")),
                neutron_cc.clone(),
                Arc::new(SyslogContext),
                Arc::new(ZeroMqContext),
                Arc::new(NotificationDriverContext),
                Arc::new(BindHostContext),
                Arc::new(WorkerConfigContext),
            ],
        ),
    );
    map.insert(
        NEUTRON_DEFAULT,
        ResourceEntry::new(&["neutron-server"], vec![neutron_cc]),
    );
    map.insert(
        APACHE_CONF,
        ResourceEntry::new(&["apache2"], vec![apache_ssl.clone()]),
    );
    map.insert(
        APACHE_24_CONF,
        ResourceEntry::new(&["apache2"], vec![apache_ssl]),
    );
    map.insert(
        HAPROXY_CONF,
        ResourceEntry::new(
            &["haproxy"],
            vec![
                Arc::new(HaProxyContext::new(true)),
                Arc::new(NeutronHaProxyContext),
            ],
        ),
    );
    map
}

impl NeutronApi {
    /// Build the resource map for this invocation
    pub fn resource_map(&self) -> Result<ResourceMap> {
        let config = &self.state().config;
        let mut map = base_resource_map(config);

        // Apache 2.4 only loads vhosts ending in .conf
        if self.host().exists(Utf8Path::new(APACHE_CONF_AVAILABLE)) {
            map.remove(APACHE_CONF);
        } else {
            map.remove(APACHE_24_CONF);
        }

        // neutron-server only needs the plugin config, not the plugin agent
        let plugin = self.plugin()?;
        let mut contexts = plugin.contexts;
        contexts.push(Arc::new(NeutronCcContext));
        contexts.push(Arc::new(PostgresqlDbContext::new(&config.database)));
        map.insert(
            plugin.config,
            ResourceEntry {
                services: plugin.server_services,
                contexts,
            },
        );

        debug!("Resource map covers {} config files", map.len());
        Ok(map)
    }

    /// Config files that restart services when they change
    pub fn restart_map(&self) -> Result<RestartMap> {
        Ok(self
            .resource_map()?
            .iter()
            .filter(|(_, entry)| !entry.services.is_empty())
            .map(|(path, entry)| (path.to_string(), entry.services.clone()))
            .collect())
    }

    /// Every service this charm manages
    pub fn services(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .restart_map()?
            .into_iter()
            .flat_map(|(_, services)| services)
            .collect())
    }

    /// API ports of the managed services; services without one are skipped
    pub fn determine_ports(&self) -> Result<BTreeSet<u16>> {
        Ok(self
            .restart_map()?
            .iter()
            .flat_map(|(_, services)| services.iter())
            .filter_map(|service| api_port(service))
            .collect())
    }
}
