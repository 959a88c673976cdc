//! Relation data visible to the unit during a hook

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All relations the charm consumes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Relations {
    pub amqp: Option<AmqpRelation>,
    pub shared_db: Option<SharedDbRelation>,
    pub pgsql_db: Option<PgsqlDbRelation>,
    pub identity_service: Option<IdentityServiceRelation>,
    pub zeromq_configuration: Option<ZeroMqRelation>,
    /// Peer units on the cluster relation
    pub cluster: Vec<PeerUnit>,
}

/// RabbitMQ broker settings from the amqp relation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmqpRelation {
    pub hostname: Option<String>,
    pub password: Option<String>,
    pub ssl_port: Option<u16>,
    pub ssl_ca: Option<String>,
    pub ha_queues: bool,
}

/// MySQL settings from the shared-db relation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SharedDbRelation {
    pub db_host: Option<String>,
    pub password: Option<String>,
    /// Passwords for prefixed database requests, keyed by prefix
    pub passwords: BTreeMap<String, String>,
}

/// PostgreSQL settings from the pgsql-db relation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PgsqlDbRelation {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

/// Keystone settings from the identity-service relation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityServiceRelation {
    pub service_host: Option<String>,
    pub service_port: Option<u16>,
    pub service_protocol: String,
    pub auth_host: Option<String>,
    pub auth_port: Option<u16>,
    pub auth_protocol: String,
    pub service_tenant: Option<String>,
    pub service_username: Option<String>,
    pub service_password: Option<String>,
}

impl Default for IdentityServiceRelation {
    fn default() -> Self {
        Self {
            service_host: None,
            service_port: None,
            service_protocol: "http".to_string(),
            auth_host: None,
            auth_port: None,
            auth_protocol: "http".to_string(),
            service_tenant: None,
            service_username: None,
            service_password: None,
        }
    }
}

/// ZeroMQ matchmaker settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZeroMqRelation {
    pub host: Option<String>,
    pub nonce: Option<String>,
}

/// A peer unit on the cluster relation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerUnit {
    pub name: String,
    pub private_address: String,
}

/// Identity of the unit running the hook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitInfo {
    pub name: String,
    pub private_address: String,
}

impl Default for UnitInfo {
    fn default() -> Self {
        Self {
            name: "neutron-api/0".to_string(),
            private_address: "127.0.0.1".to_string(),
        }
    }
}
