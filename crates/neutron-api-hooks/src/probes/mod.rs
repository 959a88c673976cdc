//! Readiness and router feature probes against the live neutron API
//!
//! Probes are polled by hooks that simply try again later, so every failure
//! is logged and reported as `false` instead of being raised.

mod client;

pub use client::{HttpNeutronClient, KeystoneConnector};

use crate::charm::NeutronApi;
use crate::contexts::IdentityServiceContext;
use anyhow::Result;
use neutron_api_core::{ContextFragment, ContextProvider};
use serde_json::Value;
use tracing::{info, warn};

/// A router record as returned by the API
pub type Router = serde_json::Map<String, Value>;

/// Admin credentials for the neutron API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub auth_url: String,
    pub region: String,
}

impl Credentials {
    /// Credentials from an identity-service context fragment
    pub fn from_identity(identity: &ContextFragment) -> Option<Self> {
        let field = |key: &str| -> Option<String> {
            match identity.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        Some(Self {
            username: field("admin_user")?,
            password: field("admin_password")?,
            tenant_name: field("admin_tenant_name")?,
            auth_url: format!(
                "{}://{}:{}/v2.0",
                field("auth_protocol")?,
                field("auth_host")?,
                field("auth_port")?
            ),
            region: field("region")?,
        })
    }
}

/// The subset of the neutron API the probes use
pub trait NeutronClient {
    fn list_routers(&self) -> Result<Vec<Router>>;
}

/// Builds an authenticated API client
pub trait ClientConnector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn NeutronClient>>;
}

/// JSON truthiness of a router attribute
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl NeutronApi {
    /// An API client authenticated as the neutron service user, if the
    /// identity-service relation is complete
    pub fn get_neutron_client(&self) -> Option<Box<dyn NeutronClient>> {
        let identity = match IdentityServiceContext::default().produce(self.state()) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Identity context failed: {:#}", e);
                return None;
            }
        };
        let Some(credentials) = Credentials::from_identity(&identity) else {
            info!("Unable to check resources at this time");
            return None;
        };

        match self.connector().connect(&credentials) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Could not connect to neutron: {:#}", e);
                None
            }
        }
    }

    /// Whether any router has a truthy value for `feature`
    pub fn router_feature_present(&self, feature: &str) -> bool {
        let Some(client) = self.get_neutron_client() else {
            info!("No neutron client, cannot check for {} routers", feature);
            return false;
        };
        match client.list_routers() {
            Ok(routers) => routers
                .iter()
                .any(|router| router.get(feature).is_some_and(truthy)),
            Err(e) => {
                warn!("Listing routers failed: {:#}", e);
                false
            }
        }
    }

    /// Whether any HA router exists
    pub fn l3ha_router_present(&self) -> bool {
        self.router_feature_present("ha")
    }

    /// Whether any distributed router exists
    pub fn dvr_router_present(&self) -> bool {
        self.router_feature_present("distributed")
    }

    /// Whether the neutron API answers a simple query
    pub fn neutron_ready(&self) -> bool {
        let Some(client) = self.get_neutron_client() else {
            info!("No neutron client, neutron not ready");
            return false;
        };
        match client.list_routers() {
            Ok(_) => {
                info!("neutron client ready");
                true
            }
            Err(e) => {
                info!("neutron query failed, neutron not ready: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("yes")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!([])));
    }

    #[test]
    fn test_credentials_from_identity() {
        let identity = json!({
            "admin_user": "neutron",
            "admin_password": "secret",
            "admin_tenant_name": "services",
            "auth_protocol": "https",
            "auth_host": "keystone",
            "auth_port": 35357,
            "region": "RegionOne",
        });
        let credentials = Credentials::from_identity(identity.as_object().unwrap()).unwrap();
        assert_eq!(credentials.auth_url, "https://keystone:35357/v2.0");
        assert_eq!(credentials.tenant_name, "services");

        assert!(Credentials::from_identity(&ContextFragment::new()).is_none());
    }
}
