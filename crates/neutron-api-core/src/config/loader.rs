//! Hook state file loading and parsing
//!
//! The hook state is a snapshot of everything a hook may consult: the
//! charm options, relation data and the unit's own identity.

use crate::error::{Error, Result};
use crate::types::{CharmConfig, Relations, UnitInfo};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Environment variable naming the hook state file
pub const STATE_ENV_VAR: &str = "NEUTRON_API_STATE";

/// State file names to search for
const STATE_FILE_NAMES: &[&str] = &["hook-state.yaml", "hook-state.yml"];

/// Snapshot of the hook environment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HookState {
    /// Charm options
    pub config: CharmConfig,

    /// Relation data
    pub relations: Relations,

    /// The unit running the hook
    pub unit: UnitInfo,
}

impl HookState {
    /// Parse hook state from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Load hook state from the specified path, the environment, or by search
    pub fn load(path: Option<&Utf8Path>) -> Result<(Self, Utf8PathBuf)> {
        let path = match path {
            Some(p) => p.to_owned(),
            None => match std::env::var(STATE_ENV_VAR) {
                Ok(p) if !p.is_empty() => Utf8PathBuf::from(p),
                _ => Self::find_state()?,
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        tracing::debug!("Loaded hook state from {}", path);

        Ok((Self::from_yaml(&content)?, path))
    }

    /// Find a state file in the current directory or its parents
    fn find_state() -> Result<Utf8PathBuf> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in STATE_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    return Ok(path);
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(STATE_FILE_NAMES.join(" or ")))
    }
}
