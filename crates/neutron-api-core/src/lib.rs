//! # neutron-api-core
//!
//! Core library for the neutron-api charm providing:
//! - Hook state loading (charm options, relation data, unit identity)
//! - Ordered OpenStack release and Ubuntu series types
//! - Install source parsing
//! - The context provider interface consumed by the config renderer

pub mod config;
pub mod context;
pub mod error;
pub mod release;
pub mod types;

pub use config::HookState;
pub use context::{ContextFragment, ContextHandle, ContextProvider};
pub use error::{Error, Result};
pub use release::{InstallSource, OpenStackRelease, UbuntuSeries};
