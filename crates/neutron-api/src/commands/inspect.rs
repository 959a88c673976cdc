//! Read-only views of what the charm manages

use anyhow::Result;
use neutron_api_hooks::constants::get_topics;
use serde_json::json;

use super::load_charm;
use crate::cli::{GlobalArgs, ListArgs, PackagesArgs};
use crate::output;

pub fn packages(args: PackagesArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let packages = charm.determine_packages(args.source.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
    } else {
        output::header("Packages");
        for package in &packages {
            output::item(package);
        }
    }
    Ok(())
}

pub fn ports(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let ports = charm.determine_ports()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
    } else {
        output::header("Ports");
        for port in &ports {
            output::item(&port.to_string());
        }
    }
    Ok(())
}

pub fn services(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let services = charm.services()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&services)?);
    } else {
        output::header("Services");
        for service in &services {
            output::item(service);
        }
    }
    Ok(())
}

pub fn restart_map(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let restart_map = charm.restart_map()?;

    if args.json {
        let entries: Vec<_> = restart_map
            .iter()
            .map(|(path, services)| json!({"path": path, "services": services}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        output::header("Restart map");
        for (path, services) in &restart_map {
            output::kv(path, &services.join(", "));
        }
    }
    Ok(())
}

pub fn resource_map(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    let map = charm.resource_map()?;

    if args.json {
        let entries: Vec<_> = map
            .iter()
            .map(|(path, entry)| {
                let contexts: Vec<_> = entry.contexts.iter().map(|c| c.name()).collect();
                json!({"path": path, "services": entry.services, "contexts": contexts})
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (path, entry) in map.iter() {
            output::header(path);
            output::kv("Services", &entry.services.join(", "));
            let contexts: Vec<_> = entry.contexts.iter().map(|c| c.name()).collect();
            output::kv("Contexts", &contexts.join(", "));
        }
    }
    Ok(())
}

pub fn topics(args: ListArgs) -> Result<()> {
    let topics = get_topics();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&topics)?);
    } else {
        for topic in topics {
            println!("{}", topic);
        }
    }
    Ok(())
}

pub fn ca_cert(global: &GlobalArgs) -> Result<()> {
    let charm = load_charm(global)?;
    match charm.keystone_ca_cert_b64()? {
        Some(cert) => println!("{}", cert),
        None => output::warning("No keystone CA certificate installed"),
    }
    Ok(())
}
