//! Release-aware config rendering
//!
//! Templates are looked up by the config file's name only, first in the
//! directory of the bound release and then in each older release directory,
//! falling back to the top of the templates directory. The full config path
//! plays no part, so two registered files sharing a name share a template.
//! A template for icehouse keeps being used for juno until a juno-specific
//! one is added.

use crate::charm::NeutronApi;
use crate::host::Host;
use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use neutron_api_core::{ContextHandle, HookState, OpenStackRelease};
use std::collections::BTreeSet;
use std::sync::Arc;
use tera::Tera;
use tracing::{debug, info};

/// Writes registered config files for a bound release
pub trait Renderer {
    /// Register a config file and the contexts rendering it
    fn register(&mut self, path: &str, contexts: Vec<ContextHandle>);

    /// Re-bind to another release for subsequent writes
    fn set_release(&mut self, release: OpenStackRelease);

    fn release(&self) -> OpenStackRelease;

    /// Registered paths in registration order
    fn registered(&self) -> Vec<String>;

    /// Render and write one registered file
    fn write(&self, path: &str) -> Result<()>;

    /// Render and write every registered file
    fn write_all(&self) -> Result<()> {
        for path in self.registered() {
            self.write(&path)?;
        }
        Ok(())
    }
}

/// Tera-backed renderer writing through the host
pub struct ConfigRenderer {
    templates_dir: Utf8PathBuf,
    release: OpenStackRelease,
    state: HookState,
    host: Arc<dyn Host>,
    configs: Vec<(String, Vec<ContextHandle>)>,
}

impl ConfigRenderer {
    pub fn new(
        templates_dir: impl Into<Utf8PathBuf>,
        release: OpenStackRelease,
        state: HookState,
        host: Arc<dyn Host>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            release,
            state,
            host,
            configs: Vec::new(),
        }
    }

    fn contexts(&self, path: &str) -> Result<&[ContextHandle]> {
        self.configs
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, contexts)| contexts.as_slice())
            .ok_or_else(|| anyhow!("Config file {} is not registered", path))
    }

    /// Template file for a config path under the bound release
    pub fn template_path(&self, path: &str) -> Result<Utf8PathBuf> {
        let name = Utf8Path::new(path)
            .file_name()
            .ok_or_else(|| anyhow!("Config path {} has no file name", path))?;

        for release in self.release.and_older() {
            let candidate = self.templates_dir.join(release.as_str()).join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        let candidate = self.templates_dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        Err(anyhow!(
            "No template for {} in {} for release {}",
            name,
            self.templates_dir,
            self.release
        ))
    }

    /// Merged context fragments of a registered path, in registration order
    pub fn context(&self, path: &str) -> Result<tera::Context> {
        let mut context = tera::Context::new();
        for provider in self.contexts(path)? {
            let fragment = provider
                .produce(&self.state)
                .with_context(|| format!("Context {} failed", provider.name()))?;
            for (key, value) in fragment {
                context.insert(key, &value);
            }
        }
        Ok(context)
    }

    /// Render a registered path without writing it
    pub fn render(&self, path: &str) -> Result<String> {
        let template = self.template_path(path)?;
        debug!("Rendering {} from {}", path, template);
        render_file(&template, &self.context(path)?)
    }

    /// Interfaces whose contexts all produced data
    pub fn complete_contexts(&self) -> Result<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        let mut incomplete = BTreeSet::new();
        for (_, contexts) in &self.configs {
            for provider in contexts {
                if provider.interfaces().is_empty() {
                    continue;
                }
                let empty = provider.produce(&self.state)?.is_empty();
                for interface in provider.interfaces() {
                    seen.insert(interface.to_string());
                    if empty {
                        incomplete.insert(interface.to_string());
                    }
                }
            }
        }
        Ok(seen.difference(&incomplete).cloned().collect())
    }
}

impl Renderer for ConfigRenderer {
    fn register(&mut self, path: &str, contexts: Vec<ContextHandle>) {
        match self.configs.iter_mut().find(|(p, _)| p == path) {
            Some((_, existing)) => *existing = contexts,
            None => self.configs.push((path.to_string(), contexts)),
        }
    }

    fn set_release(&mut self, release: OpenStackRelease) {
        info!("Rendering templates for {}", release);
        self.release = release;
    }

    fn release(&self) -> OpenStackRelease {
        self.release
    }

    fn registered(&self) -> Vec<String> {
        self.configs.iter().map(|(p, _)| p.clone()).collect()
    }

    fn write(&self, path: &str) -> Result<()> {
        let content = self.render(path)?;
        info!("Writing {}", path);
        self.host
            .write(Utf8Path::new(path), content.as_bytes())
            .with_context(|| format!("Failed to write {}", path))
    }
}

/// Render a template file with an explicit context
pub fn render_file(template: &Utf8Path, context: &tera::Context) -> Result<String> {
    let source = std::fs::read_to_string(template)
        .with_context(|| format!("Failed to read template {}", template))?;
    let mut tera = Tera::default();
    tera.add_raw_template(template.as_str(), &source)
        .with_context(|| format!("Invalid template {}", template))?;
    tera.render(template.as_str(), context)
        .with_context(|| format!("Failed to render {}", template))
}

impl NeutronApi {
    /// Renderer bound to `release`, or the installed release, with every
    /// resource map entry registered
    pub fn register_configs(&self, release: Option<OpenStackRelease>) -> Result<ConfigRenderer> {
        let release = match release {
            Some(release) => release,
            None => self.os_release("neutron-server")?,
        };

        let mut renderer = ConfigRenderer::new(
            self.templates_dir(),
            release,
            self.state().clone(),
            self.host().clone(),
        );
        for (path, entry) in self.resource_map()?.iter() {
            renderer.register(path, entry.contexts.clone());
        }
        Ok(renderer)
    }

    /// Render a named template from the templates directory and write it
    pub fn render_template(
        &self,
        source: &str,
        target: &Utf8Path,
        context: &tera::Context,
        perms: u32,
    ) -> Result<()> {
        let content = render_file(&self.templates_dir().join(source), context)?;
        self.host()
            .write_file(target, content.as_bytes(), "root", "root", perms)
            .with_context(|| format!("Failed to write {}", target))
    }
}
