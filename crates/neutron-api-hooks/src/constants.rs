//! Fixed paths, package lists and ports

/// Directory holding charm templates, relative to the charm root
pub const TEMPLATES: &str = "templates/";

pub const NEUTRON_CONF_DIR: &str = "/etc/neutron";
pub const NEUTRON_CONF: &str = "/etc/neutron/neutron.conf";
pub const NEUTRON_DEFAULT: &str = "/etc/default/neutron-server";
pub const HAPROXY_CONF: &str = "/etc/haproxy/haproxy.cfg";
pub const APACHE_CONF: &str = "/etc/apache2/sites-available/openstack_https_frontend";
pub const APACHE_24_CONF: &str = "/etc/apache2/sites-available/openstack_https_frontend.conf";
/// Present only with Apache 2.4, which expects `.conf` vhost files
pub const APACHE_CONF_AVAILABLE: &str = "/etc/apache2/conf-available";
pub const CA_CERT_PATH: &str = "/usr/local/share/ca-certificates/keystone_juju_ca_cert.crt";

pub const BASE_PACKAGES: &[&str] = &[
    "apache2",
    "haproxy",
    "python-keystoneclient",
    "python-mysqldb",
    "python-psycopg2",
    "python-six",
    "uuid",
];

pub const KILO_PACKAGES: &[&str] = &[
    "python-neutron-lbaas",
    "python-neutron-fwaas",
    "python-neutron-vpnaas",
];

/// Build dependencies for installing from source
pub const BASE_GIT_PACKAGES: &[&str] = &[
    "libffi-dev",
    "libmysqlclient-dev",
    "libssl-dev",
    "libxml2-dev",
    "libxslt1-dev",
    "libyaml-dev",
    "python-dev",
    "python-pip",
    "python-setuptools",
    "zlib1g-dev",
];

/// Packages that are installed from source instead
pub const GIT_PACKAGE_BLACKLIST: &[&str] = &[
    "neutron-server",
    "neutron-plugin-ml2",
    "python-keystoneclient",
    "python-six",
];

pub const GIT_PACKAGE_BLACKLIST_KILO: &[&str] = &[
    "python-neutron-lbaas",
    "python-neutron-fwaas",
    "python-neutron-vpnaas",
];

/// API ports of the services this charm manages
pub const API_PORTS: &[(&str, u16)] = &[("neutron-server", 9696)];

/// Message bus topics the neutron-server control plane listens on
pub const TOPICS: &[&str] = &[
    "q-l3-plugin",
    "q-firewall-plugin",
    "n-lbaas-plugin",
    "ipsec_driver",
    "q-metering-plugin",
    "q-plugin",
    "neutron",
];

/// dpkg options that let new package config files win over local edits
pub const UPGRADE_DPKG_OPTS: &[&str] = &[
    "--option",
    "Dpkg::Options::=--force-confnew",
    "--option",
    "Dpkg::Options::=--force-confdef",
];

/// dpkg options for a fresh install, keeping any existing config files
pub const INSTALL_DPKG_OPTS: &[&str] = &["--option=Dpkg::Options::=--force-confold"];

/// Port for a managed service, if it exposes one
pub fn api_port(service: &str) -> Option<u16> {
    API_PORTS
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, port)| *port)
}

/// Topics this service's control plane participates in
pub fn get_topics() -> Vec<&'static str> {
    TOPICS.to_vec()
}
