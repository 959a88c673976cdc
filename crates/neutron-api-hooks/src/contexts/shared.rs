//! Context providers shared by OpenStack API services

use anyhow::Result;
use neutron_api_core::{ContextFragment, ContextProvider, HookState};
use serde_json::{json, Map, Value};

/// RabbitMQ connection settings from the amqp relation
#[derive(Debug, Clone, Default)]
pub struct AmqpContext {
    /// Directory the broker CA is placed in when SSL is used
    pub ssl_dir: Option<String>,
}

impl AmqpContext {
    pub fn new(ssl_dir: impl Into<String>) -> Self {
        Self {
            ssl_dir: Some(ssl_dir.into()),
        }
    }
}

impl ContextProvider for AmqpContext {
    fn name(&self) -> &'static str {
        "amqp"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["amqp"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        let Some(amqp) = &state.relations.amqp else {
            return Ok(ctxt);
        };
        let (Some(host), Some(password)) = (&amqp.hostname, &amqp.password) else {
            return Ok(ctxt);
        };

        ctxt.insert("rabbitmq_host".into(), json!(host));
        ctxt.insert("rabbitmq_user".into(), json!(state.config.rabbit_user));
        ctxt.insert("rabbitmq_password".into(), json!(password));
        ctxt.insert(
            "rabbitmq_virtual_host".into(),
            json!(state.config.rabbit_vhost),
        );
        if amqp.ha_queues {
            ctxt.insert("rabbitmq_ha_queues".into(), json!(true));
        }
        if let Some(port) = amqp.ssl_port {
            ctxt.insert("rabbit_ssl_port".into(), json!(port));
            if let (Some(_), Some(dir)) = (&amqp.ssl_ca, &self.ssl_dir) {
                ctxt.insert(
                    "rabbit_ssl_ca".into(),
                    json!(format!("{}/rabbit-client-ca.pem", dir)),
                );
            }
        }
        Ok(ctxt)
    }
}

/// MySQL connection settings from the shared-db relation
#[derive(Debug, Clone)]
pub struct SharedDbContext {
    pub user: String,
    pub database: String,
    pub ssl_dir: Option<String>,
    /// Prefix for multi-database requests; selects a prefixed password
    pub relation_prefix: Option<String>,
}

impl SharedDbContext {
    pub fn new(user: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            database: database.into(),
            ssl_dir: None,
            relation_prefix: None,
        }
    }

    pub fn with_ssl_dir(mut self, ssl_dir: impl Into<String>) -> Self {
        self.ssl_dir = Some(ssl_dir.into());
        self
    }

    pub fn with_relation_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.relation_prefix = Some(prefix.into());
        self
    }
}

impl ContextProvider for SharedDbContext {
    fn name(&self) -> &'static str {
        "shared-db"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["shared-db"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        let Some(db) = &state.relations.shared_db else {
            return Ok(ctxt);
        };

        let password = match &self.relation_prefix {
            Some(prefix) => db.passwords.get(prefix),
            None => db.password.as_ref(),
        };
        let (Some(host), Some(password)) = (&db.db_host, password) else {
            return Ok(ctxt);
        };

        ctxt.insert("database_host".into(), json!(host));
        ctxt.insert("database".into(), json!(self.database));
        ctxt.insert("database_user".into(), json!(self.user));
        ctxt.insert("database_password".into(), json!(password));
        ctxt.insert("database_type".into(), json!("mysql"));
        Ok(ctxt)
    }
}

/// PostgreSQL connection settings from the pgsql-db relation
#[derive(Debug, Clone)]
pub struct PostgresqlDbContext {
    pub database: String,
}

impl PostgresqlDbContext {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }
}

impl ContextProvider for PostgresqlDbContext {
    fn name(&self) -> &'static str {
        "pgsql-db"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["pgsql-db"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        let Some(db) = &state.relations.pgsql_db else {
            return Ok(ctxt);
        };
        let (Some(host), Some(user), Some(password)) = (&db.host, &db.user, &db.password)
        else {
            return Ok(ctxt);
        };

        ctxt.insert("database_host".into(), json!(host));
        ctxt.insert(
            "database".into(),
            json!(db.database.as_deref().unwrap_or(&self.database)),
        );
        ctxt.insert("database_user".into(), json!(user));
        ctxt.insert("database_password".into(), json!(password));
        ctxt.insert("database_type".into(), json!("postgresql"));
        Ok(ctxt)
    }
}

/// Whether services log to syslog
#[derive(Debug, Clone, Default)]
pub struct SyslogContext;

impl ContextProvider for SyslogContext {
    fn name(&self) -> &'static str {
        "syslog"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        ctxt.insert("use_syslog".into(), json!(state.config.use_syslog));
        Ok(ctxt)
    }
}

/// ZeroMQ matchmaker settings
#[derive(Debug, Clone, Default)]
pub struct ZeroMqContext;

impl ContextProvider for ZeroMqContext {
    fn name(&self) -> &'static str {
        "zeromq"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["zeromq-configuration"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        if let Some(zmq) = &state.relations.zeromq_configuration {
            if let (Some(host), Some(nonce)) = (&zmq.host, &zmq.nonce) {
                ctxt.insert("zmq_host".into(), json!(host));
                ctxt.insert("zmq_nonce".into(), json!(nonce));
            }
        }
        Ok(ctxt)
    }
}

/// Enables notifications when a message bus is related
#[derive(Debug, Clone, Default)]
pub struct NotificationDriverContext;

impl ContextProvider for NotificationDriverContext {
    fn name(&self) -> &'static str {
        "notification-driver"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let enabled = state.relations.amqp.is_some();
        let mut ctxt = Map::new();
        ctxt.insert(
            "notifications".into(),
            json!(if enabled { "True" } else { "False" }),
        );
        Ok(ctxt)
    }
}

/// Address services bind to
#[derive(Debug, Clone, Default)]
pub struct BindHostContext;

impl ContextProvider for BindHostContext {
    fn name(&self) -> &'static str {
        "bind-host"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let bind_host = if state.config.prefer_ipv6 {
            "::"
        } else {
            "0.0.0.0"
        };
        let mut ctxt = Map::new();
        ctxt.insert("bind_host".into(), json!(bind_host));
        Ok(ctxt)
    }
}

/// API worker count scaled by CPU count
#[derive(Debug, Clone, Default)]
pub struct WorkerConfigContext;

impl WorkerConfigContext {
    fn num_cpus() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl ContextProvider for WorkerConfigContext {
    fn name(&self) -> &'static str {
        "worker-config"
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let workers = (Self::num_cpus() as f64 * state.config.worker_multiplier) as u64;
        let mut ctxt = Map::new();
        ctxt.insert("workers".into(), json!(workers.max(1)));
        Ok(ctxt)
    }
}

/// HAProxy backends from the local unit and its cluster peers
#[derive(Debug, Clone, Default)]
pub struct HaProxyContext {
    /// Render the frontend even without peers
    pub singlenode_mode: bool,
}

impl HaProxyContext {
    pub fn new(singlenode_mode: bool) -> Self {
        Self { singlenode_mode }
    }
}

impl ContextProvider for HaProxyContext {
    fn name(&self) -> &'static str {
        "haproxy"
    }

    fn interfaces(&self) -> &'static [&'static str] {
        &["cluster"]
    }

    fn produce(&self, state: &HookState) -> Result<ContextFragment> {
        let mut ctxt = Map::new();
        let peers = &state.relations.cluster;
        if peers.is_empty() && !self.singlenode_mode {
            return Ok(ctxt);
        }

        let mut units = Map::new();
        units.insert(
            state.unit.name.replace('/', "-"),
            json!(state.unit.private_address),
        );
        for peer in peers {
            units.insert(peer.name.replace('/', "-"), json!(peer.private_address));
        }

        let (local_host, haproxy_host) = if state.config.prefer_ipv6 {
            ("ip6-localhost", "::")
        } else {
            ("127.0.0.1", "0.0.0.0")
        };

        ctxt.insert("units".into(), Value::Object(units));
        ctxt.insert("local_host".into(), json!(local_host));
        ctxt.insert("haproxy_host".into(), json!(haproxy_host));
        ctxt.insert("stat_port".into(), json!(":8888"));
        Ok(ctxt)
    }
}
