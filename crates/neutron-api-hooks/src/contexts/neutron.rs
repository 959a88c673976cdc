//! Context providers specific to neutron-server

use crate::constants::api_port;
use crate::plugins::core_plugin;
use anyhow::Result;
use neutron_api_core::{ContextFragment, ContextProvider, HookState};
use serde_json::{json, Map};

const NEUTRON_API_PORT: u16 = 9696;

/// Port the API listens on behind haproxy and, with https, apache
pub fn determine_api_port(public_port: u16, https: bool) -> u16 {
    // haproxy always fronts the API in single-node mode
    let mut hops = 1;
    if https {
        hops += 1;
    }
    public_port - hops * 10
}

/// Port haproxy listens on behind the apache HTTPS frontend
pub fn determine_apache_port(public_port: u16) -> u16 {
    public_port - 10
}

/// Keystone credentials and endpoints from the identity-service relation
#[derive(Debug, Clone)]
pub struct IdentityServiceContext {
    pub service: String,
    pub service_user: String,
}

impl IdentityServiceContext {
    pub fn new(service: impl Into<String>, service_user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            service_user: service_user.into(),
        }
    }
}

impl Default for IdentityServiceContext {
    fn default() -> Self {
        Self::new("neutron", "neutron")
    }
}

impl ContextProvider for IdentityServiceContext {
    fn name(&self) -> &'static str {
        "identity-service"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["identity-service"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        let Some(rel) = &state.relations.identity_service else {
            return Ok(ctxt);
        };
        let (
            Some(service_host),
            Some(service_port),
            Some(auth_host),
            Some(auth_port),
            Some(tenant),
            Some(password),
        ) = (
            &rel.service_host,
            rel.service_port,
            &rel.auth_host,
            rel.auth_port,
            &rel.service_tenant,
            &rel.service_password,
        )
        else {
            return Ok(ctxt);
        };
        let admin_user = rel
            .service_username
            .clone()
            .unwrap_or_else(|| self.service_user.clone());

        ctxt.insert("service_host".into(), json!(service_host));
        ctxt.insert("service_port".into(), json!(service_port));
        ctxt.insert("service_protocol".into(), json!(rel.service_protocol));
        ctxt.insert("auth_host".into(), json!(auth_host));
        ctxt.insert("auth_port".into(), json!(auth_port));
        ctxt.insert("auth_protocol".into(), json!(rel.auth_protocol));
        ctxt.insert("admin_tenant_name".into(), json!(tenant));
        ctxt.insert("admin_user".into(), json!(admin_user));
        ctxt.insert("admin_password".into(), json!(password));
        ctxt.insert("signing_dir".into(), json!(format!("/var/cache/{}", self.service)));
        ctxt.insert("region".into(), json!(state.config.region));
        Ok(ctxt)
    }
}

/// neutron-server settings derived from charm options
#[derive(Debug, Clone, Default)]
pub struct NeutronCcContext;

impl ContextProvider for NeutronCcContext {
    fn name(&self) -> &'static str {
        "neutron-cc"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let config = &state.config;
        let mut ctxt = Map::new();

        ctxt.insert("neutron_plugin".into(), json!(config.neutron_plugin));
        if let Some(driver) = core_plugin(&config.neutron_plugin) {
            ctxt.insert("core_plugin".into(), json!(driver));
        }
        ctxt.insert(
            "neutron_security_groups".into(),
            json!(config.neutron_security_groups),
        );
        ctxt.insert("l2_population".into(), json!(config.l2_population));
        ctxt.insert(
            "overlay_network_type".into(),
            json!(config.overlay_network_type),
        );
        ctxt.insert("enable_dvr".into(), json!(config.enable_dvr));
        ctxt.insert("enable_l3ha".into(), json!(config.enable_l3ha));
        ctxt.insert("debug".into(), json!(config.debug));
        ctxt.insert("verbose".into(), json!(config.verbose));

        let public_port = api_port("neutron-server").unwrap_or(NEUTRON_API_PORT);
        ctxt.insert(
            "neutron_bind_port".into(),
            json!(determine_api_port(public_port, config.https())),
        );
        Ok(ctxt)
    }
}

/// Apache HTTPS frontend endpoints, present only when SSL is configured
#[derive(Debug, Clone, Default)]
pub struct ApacheSslContext;

impl ContextProvider for ApacheSslContext {
    fn name(&self) -> &'static str {
        "apache-ssl"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["https"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        if !state.config.https() {
            return Ok(ctxt);
        }

        let address = &state.unit.private_address;
        let ext_port = api_port("neutron-server").unwrap_or(NEUTRON_API_PORT);
        let int_port = determine_apache_port(ext_port);

        ctxt.insert("namespace".into(), json!("neutron"));
        ctxt.insert("ext_ports".into(), json!([ext_port]));
        ctxt.insert(
            "endpoints".into(),
            json!([{
                "address": address,
                "ext": ext_port,
                "int": int_port,
                "cert": format!("/etc/apache2/ssl/neutron/cert_{}", address),
                "key": format!("/etc/apache2/ssl/neutron/key_{}", address),
            }]),
        );
        Ok(ctxt)
    }
}

/// haproxy frontends for neutron-server
#[derive(Debug, Clone, Default)]
pub struct NeutronHaProxyContext;

impl ContextProvider for NeutronHaProxyContext {
    fn name(&self) -> &'static str {
        "neutron-haproxy"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let public_port = api_port("neutron-server").unwrap_or(NEUTRON_API_PORT);
        let mut ctxt = Map::new();
        ctxt.insert(
            "service_ports".into(),
            json!({
                "neutron-server": [public_port, determine_apache_port(public_port)],
            }),
        );
        ctxt.insert(
            "neutron_bind_port".into(),
            json!(determine_api_port(public_port, state.config.https())),
        );
        Ok(ctxt)
    }
}
