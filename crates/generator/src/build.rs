//! Build orchestration.
//!
//! One call per build: fetch every page, synthesize the renderers, register
//! everything with the site builder.

use pagegen_core::config::SiteConfig;
use pagegen_core::{Error, Result, SynthesisMode, TypeNaming};
use pagegen_source::{QueryEngine, fetch_collection, fetch_pages};
use std::time::Instant;
use tracing::info;

use crate::fragments::ComponentRegistry;
use crate::registrar::{PageActions, RegisteredKind, register_collection, register_pages};
use crate::synthesizer::Synthesizer;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Pages rendered from a synthesized renderer.
    pub dynamic_pages: usize,

    /// Pages using a named static template.
    pub static_pages: usize,

    /// Pages registered from collections.
    pub collection_pages: usize,

    /// Known components.
    pub components: usize,

    /// Whether the aggregated fragment file was rewritten.
    pub fragments_written: bool,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildStats {
    pub fn total_pages(&self) -> usize {
        self.dynamic_pages + self.static_pages + self.collection_pages
    }
}

/// Load the component registry, checking the components folder exists first
pub fn load_registry(config: &SiteConfig) -> Result<ComponentRegistry> {
    let dir = config.components_dir();
    if !dir.is_dir() {
        return Err(Error::InvalidData(format!(
            "components folder not found: {}",
            dir.display()
        )));
    }
    ComponentRegistry::load(&dir, TypeNaming::from_config(config))
}

/// Reload the registry and rewrite the aggregated fragment file
pub fn refresh_fragments(config: &SiteConfig) -> Result<(ComponentRegistry, bool)> {
    let registry = load_registry(config)?;
    let written = registry.write_aggregate(&config.fragments_file(), &config.pages.content_types)?;
    Ok((registry, written))
}

/// Run a full build: fragments, pages, collections
pub async fn run_build(
    config: &SiteConfig,
    engine: &dyn QueryEngine,
    actions: &dyn PageActions,
    mode: SynthesisMode,
) -> Result<BuildStats> {
    let start = Instant::now();
    let mut stats = BuildStats::default();

    info!(root = %config.root.display(), ?mode, "starting build");

    tokio::fs::create_dir_all(config.cache_dir()).await?;

    let (registry, fragments_written) = refresh_fragments(config)?;
    stats.components = registry.len();
    stats.fragments_written = fragments_written;

    let synthesizer = Synthesizer::from_config(config, &registry, mode)?;

    let pages = fetch_pages(engine, config).await?;
    for kind in register_pages(config, &synthesizer, actions, &pages).await? {
        match kind {
            RegisteredKind::Dynamic => stats.dynamic_pages += 1,
            RegisteredKind::Static => stats.static_pages += 1,
        }
    }

    let naming = registry.naming();
    for collection in &config.collections {
        let nodes = fetch_collection(engine, naming, &collection.content_type).await?;
        stats.collection_pages +=
            register_collection(config, actions, &collection.template, &nodes).await?;
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        dynamic_pages = stats.dynamic_pages,
        static_pages = stats.static_pages,
        collection_pages = stats.collection_pages,
        duration_ms = stats.duration_ms,
        "build complete"
    );
    Ok(stats)
}
