//! Charm options as set by the operator

use serde::{Deserialize, Serialize};

/// Operator-facing charm options
///
/// Every option has a default so a partial `config:` section is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CharmConfig {
    /// Neutron plugin identifier (ovs, nsx, n1kv, Calico, vsp, plumgrid)
    pub neutron_plugin: String,

    /// Package install source (`distro`, `cloud:<series>-<release>`, `ppa:...`, `deb ...`)
    pub openstack_origin: String,

    /// Projects YAML for installing from source; unset means package install
    pub openstack_origin_git: Option<String>,

    /// Database user for the shared-db relation
    pub database_user: String,

    /// Database name for the shared-db and pgsql-db relations
    pub database: String,

    /// Keystone region
    pub region: String,

    /// RabbitMQ user
    pub rabbit_user: String,

    /// RabbitMQ virtual host
    pub rabbit_vhost: String,

    pub debug: bool,

    pub verbose: bool,

    pub use_syslog: bool,

    /// Worker processes per CPU core
    pub worker_multiplier: f64,

    pub neutron_security_groups: bool,

    pub l2_population: bool,

    /// gre, vxlan or "gre vxlan"
    pub overlay_network_type: String,

    /// Distributed virtual routing
    pub enable_dvr: bool,

    /// L3 high availability routers
    pub enable_l3ha: bool,

    /// Bind services on IPv6 addresses
    pub prefer_ipv6: bool,

    /// Base64 encoded SSL certificate for the HTTPS frontend
    pub ssl_cert: Option<String>,

    /// Base64 encoded SSL key for the HTTPS frontend
    pub ssl_key: Option<String>,
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            neutron_plugin: "ovs".to_string(),
            openstack_origin: "distro".to_string(),
            openstack_origin_git: None,
            database_user: "neutron".to_string(),
            database: "neutron".to_string(),
            region: "RegionOne".to_string(),
            rabbit_user: "neutron".to_string(),
            rabbit_vhost: "openstack".to_string(),
            debug: false,
            verbose: false,
            use_syslog: false,
            worker_multiplier: 2.0,
            neutron_security_groups: false,
            l2_population: true,
            overlay_network_type: "gre".to_string(),
            enable_dvr: false,
            enable_l3ha: false,
            prefer_ipv6: false,
            ssl_cert: None,
            ssl_key: None,
        }
    }
}

impl CharmConfig {
    /// Whether the service is deployed from source rather than packages
    pub fn git_install_requested(&self) -> bool {
        self.openstack_origin_git
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty() && v.trim() != "None")
    }

    /// Whether an SSL certificate and key are configured for the API frontend
    pub fn https(&self) -> bool {
        self.ssl_cert.as_deref().is_some_and(|c| !c.is_empty())
            && self.ssl_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
