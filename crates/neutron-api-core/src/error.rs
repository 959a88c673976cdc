//! Error types for neutron-api-core

use thiserror::Error;

/// Result type alias using neutron-api-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the neutron-api charm
#[derive(Error, Debug)]
pub enum Error {
    /// Hook state file not found
    #[error("Hook state file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid hook state or charm option
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Release codename outside the known OpenStack sequence
    #[error("Unknown OpenStack release: {name}")]
    UnknownRelease { name: String },

    /// Series codename outside the known Ubuntu sequence
    #[error("Unknown Ubuntu series: {name}")]
    UnknownSeries { name: String },

    /// Install source string that cannot be interpreted
    #[error("Unsupported install source: {source_spec}")]
    UnknownSource { source_spec: String },

    /// No default OpenStack release for a distro install on this series
    #[error("Could not derive openstack release for this Ubuntu release: {series}")]
    NoDistroRelease { series: String },

    /// Neutron plugin without a registered descriptor
    #[error("Unknown neutron plugin: {plugin}")]
    UnknownPlugin { plugin: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown release error
    pub fn unknown_release(name: impl Into<String>) -> Self {
        Self::UnknownRelease { name: name.into() }
    }

    /// Create an unknown series error
    pub fn unknown_series(name: impl Into<String>) -> Self {
        Self::UnknownSeries { name: name.into() }
    }

    /// Create an unknown install source error
    pub fn unknown_source(source_spec: impl Into<String>) -> Self {
        Self::UnknownSource {
            source_spec: source_spec.into(),
        }
    }

    /// Create an unknown plugin error
    pub fn unknown_plugin(plugin: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            plugin: plugin.into(),
        }
    }
}
