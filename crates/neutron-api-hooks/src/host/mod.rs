//! System collaborators: command execution, filesystem and accounts, apt
//!
//! Every side effect of a hook goes through one of the traits in this
//! module so hooks can be exercised against a scratch root and recorded
//! commands.

mod apt;
mod system;

pub use apt::{Apt, PackageManager};
pub use system::{Host, SystemHost};

use crate::error::HookError;
use anyhow::{Context, Result};
use std::fmt;
use tracing::debug;

/// A command line plus extra environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Start a command line for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands to completion
pub trait CommandRunner: Send + Sync {
    /// Run the command and return its trimmed stdout.
    ///
    /// A non-zero exit status is an error.
    fn run(&self, invocation: &Invocation) -> Result<String>;
}

/// Blocking command runner backed by duct
#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

impl CommandRunner for DuctRunner {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        debug!("Running: {}", invocation);

        let mut expression = duct::cmd(invocation.program.as_str(), invocation.args.iter())
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        for (key, value) in &invocation.env {
            expression = expression.env(key, value);
        }

        let output = expression
            .run()
            .with_context(|| format!("Failed to execute {}", invocation.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(HookError::CommandFailed {
                command: invocation.to_string(),
                code: output.status.code(),
                stderr,
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
