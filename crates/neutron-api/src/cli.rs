//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// neutron-api - hook tooling for deploying and upgrading neutron-server
#[derive(Parser, Debug)]
#[command(name = "neutron-api")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the hook state snapshot
    #[arg(short, long, global = true, env = "NEUTRON_API_STATE")]
    pub state: Option<Utf8PathBuf>,

    /// Directory holding the charm templates
    #[arg(short, long, global = true, default_value = "templates")]
    pub templates: Utf8PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Options shared by every subcommand
    pub fn global(&self) -> GlobalArgs {
        GlobalArgs {
            state: self.state.clone(),
            templates: self.templates.clone(),
        }
    }
}

/// Where to find the hook state and templates
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub state: Option<Utf8PathBuf>,
    pub templates: Utf8PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the packages to install
    Packages(PackagesArgs),

    /// List the ports to open
    Ports(ListArgs),

    /// List the managed services
    Services(ListArgs),

    /// Show which services restart when each config file changes
    RestartMap(ListArgs),

    /// Show the config files with their services and contexts
    ResourceMap(ListArgs),

    /// List the message bus topics
    Topics(ListArgs),

    /// Print the keystone CA certificate, base64 encoded
    CaCert,

    /// Render config files
    Render(RenderArgs),

    /// Install packages from the configured origin
    Install,

    /// Upgrade to the release of the configured origin
    Upgrade,

    /// Prepare the unit for IPv6
    #[command(name = "setup-ipv6")]
    SetupIpv6,

    /// Install neutron from source
    GitInstall(GitInstallArgs),

    /// Check that the neutron API answers
    Ready,

    /// Check whether any router has a feature enabled
    RouterFeature(RouterFeatureArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PackagesArgs {
    /// Install source to derive packages for, instead of openstack-origin
    #[arg(long)]
    pub source: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Config file to render; all registered files when omitted
    pub path: Option<String>,

    /// Release to render templates for, instead of the installed one
    #[arg(short, long)]
    pub release: Option<String>,

    /// Print the rendered content instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct GitInstallArgs {
    /// Projects file to install from, instead of openstack-origin-git
    #[arg(short, long)]
    pub projects: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct RouterFeatureArgs {
    /// Router attribute to look for: ha, distributed or any other key
    pub feature: String,
}
