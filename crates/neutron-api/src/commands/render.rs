//! Render command

use anyhow::{Context, Result};
use neutron_api_core::OpenStackRelease;
use neutron_api_hooks::Renderer;
use owo_colors::OwoColorize;

use super::load_charm;
use crate::cli::{GlobalArgs, RenderArgs};
use crate::output;

pub fn run(args: RenderArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let release = args
        .release
        .as_deref()
        .map(|r| r.parse::<OpenStackRelease>())
        .transpose()
        .context("Invalid --release")?;
    let renderer = charm.register_configs(release)?;

    let paths = match &args.path {
        Some(path) => vec![path.clone()],
        None => renderer.registered(),
    };

    if args.dry_run {
        for path in &paths {
            println!("{}", format!("# {}", path).bold());
            println!("{}", renderer.render(path)?);
        }
        return Ok(());
    }

    if args.path.is_some() {
        for path in &paths {
            renderer.write(path)?;
        }
        output::success(&format!("Rendered {} for {}", paths.join(", "), renderer.release()));
        return Ok(());
    }

    let restarted = charm.config_changed(&renderer)?;
    output::success(&format!(
        "Rendered {} config files for {}",
        paths.len(),
        renderer.release()
    ));
    if !restarted.is_empty() {
        output::kv("Restarted", &restarted.join(", "));
    }

    let complete = renderer.complete_contexts()?;
    if !complete.is_empty() {
        let complete: Vec<_> = complete.into_iter().collect();
        output::kv("Complete relations", &complete.join(", "));
    }
    Ok(())
}
