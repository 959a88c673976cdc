//! Context providers feeding the config templates
//!
//! `shared` holds providers common to OpenStack API charms; `neutron`
//! holds the neutron-server specific ones. Each produces a fragment of the
//! data a single template render call receives.

mod neutron;
mod shared;

pub use neutron::{
    determine_apache_port, determine_api_port, ApacheSslContext, IdentityServiceContext,
    NeutronCcContext, NeutronHaProxyContext,
};
pub use shared::{
    AmqpContext, BindHostContext, HaProxyContext, NotificationDriverContext, PostgresqlDbContext,
    SharedDbContext, SyslogContext, WorkerConfigContext, ZeroMqContext,
};
