//! Error types for hook operations

use thiserror::Error;

/// Failures raised by hook operations
#[derive(Error, Debug)]
pub enum HookError {
    /// A source-install blacklisted package was not in the computed set.
    ///
    /// The package lists changed without the blacklist being updated.
    #[error("Blacklisted package {package} is not in the package set")]
    BlacklistInvariant { package: String },

    /// Feature not available on this Ubuntu series
    #[error("{feature} is not supported on Ubuntu {series}; requires {minimum} or later")]
    UnsupportedSeries {
        feature: String,
        series: String,
        minimum: String,
    },

    /// External command exited non-zero
    #[error("Command `{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Project missing from the source-install projects YAML
    #[error("Project {project} is not listed in the repositories")]
    MissingProject { project: String },

    /// Target release could not be derived from the install source
    #[error("Could not derive an OpenStack release from install source {source_spec}")]
    UnresolvedRelease { source_spec: String },
}
