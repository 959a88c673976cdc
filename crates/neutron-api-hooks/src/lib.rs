//! Hook logic for the neutron-api charm
//!
//! This crate handles:
//! - Resource map construction (config file -> services and contexts)
//! - Package, port and service derivation
//! - Config registration and release-aware template rendering
//! - OpenStack release upgrades with database migration
//! - Readiness and router feature probes against the live API
//! - Installing neutron from source

pub mod charm;
pub mod constants;
pub mod contexts;
pub mod database;
pub mod error;
pub mod git_install;
pub mod host;
pub mod ipv6;
pub mod packages;
pub mod plugins;
pub mod probes;
pub mod renderer;
pub mod resource_map;
pub mod upgrade;

pub use charm::NeutronApi;
pub use error::HookError;
pub use git_install::{GitSourceInstaller, ProjectsConfig, SourceInstaller};
pub use host::{Apt, CommandRunner, DuctRunner, Host, Invocation, PackageManager, SystemHost};
pub use plugins::{PluginDescriptor, PluginRegistry, PluginResolver};
pub use probes::{ClientConnector, Credentials, KeystoneConnector, NeutronClient, Router};
pub use renderer::{ConfigRenderer, Renderer};
pub use resource_map::{ResourceEntry, ResourceMap, RestartMap};
