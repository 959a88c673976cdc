//! Type definitions for charm options and relation data

mod charm_config;
mod relations;

pub use charm_config::*;
pub use relations::*;
