//! neutron-api CLI - hook tooling for the neutron-api charm
//!
//! Each subcommand loads the hook state snapshot and runs one charm
//! operation against the local unit.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let global = cli.global();
    match cli.command {
        Commands::Packages(args) => commands::inspect::packages(args, &global),
        Commands::Ports(args) => commands::inspect::ports(args, &global),
        Commands::Services(args) => commands::inspect::services(args, &global),
        Commands::RestartMap(args) => commands::inspect::restart_map(args, &global),
        Commands::ResourceMap(args) => commands::inspect::resource_map(args, &global),
        Commands::Topics(args) => commands::inspect::topics(args),
        Commands::CaCert => commands::inspect::ca_cert(&global),
        Commands::Render(args) => commands::render::run(args, &global),
        Commands::Install => commands::lifecycle::install(&global),
        Commands::Upgrade => commands::lifecycle::upgrade(&global),
        Commands::SetupIpv6 => commands::lifecycle::setup_ipv6(&global),
        Commands::GitInstall(args) => commands::lifecycle::git_install(args, &global),
        Commands::Ready => commands::probe::ready(&global),
        Commands::RouterFeature(args) => commands::probe::router_feature(args, &global),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
