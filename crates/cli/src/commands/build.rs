use anyhow::{Context, Result};
use pagegen_core::SynthesisMode;
use pagegen_core::config::SiteConfig;
use pagegen_generator::{BuildStats, run_build};
use pagegen_source::HttpQueryEngine;
use std::path::PathBuf;
use tracing::info;

use super::load_config;
use crate::manifest::PageManifest;

/// Generate page renderers and the page manifest for a site
pub async fn run(path: PathBuf, all_components: bool) -> Result<()> {
    let mode = if all_components {
        SynthesisMode::AllComponents
    } else {
        SynthesisMode::Minimal
    };

    println!("🔨 Generating pages...");
    println!("   Site: {}", path.display());
    println!();

    let config = load_config(&path)?;
    println!("✓ Loaded: {}", config.root.join(pagegen_core::config::CONFIG_FILE).display());
    println!("  Endpoint: {}", config.source.endpoint);
    println!("  Content types: {}", config.pages.content_types.join(", "));
    println!();

    let stats = build_once(&config, mode).await?;
    print_stats(&config, &stats);

    Ok(())
}

/// One full build against the configured endpoint, writing the page manifest
pub async fn build_once(config: &SiteConfig, mode: SynthesisMode) -> Result<BuildStats> {
    let engine = HttpQueryEngine::new(config.source.endpoint.clone())
        .context("Failed to create GraphQL client")?;
    let manifest = PageManifest::new();

    let stats = run_build(config, &engine, &manifest, mode)
        .await
        .context("Build failed")?;

    let written = manifest
        .write(&config.manifest_file())
        .await
        .context("Failed to write page manifest")?;
    info!(path = %written.display(), pages = manifest.len().await, "wrote page manifest");

    Ok(stats)
}

pub fn print_stats(config: &SiteConfig, stats: &BuildStats) {
    println!("✅ Build complete!");
    println!("   Components: {}", stats.components);
    println!("   Generated renderers: {}", stats.dynamic_pages);
    println!("   Static template pages: {}", stats.static_pages);
    println!("   Collection pages: {}", stats.collection_pages);
    if stats.fragments_written {
        println!("   Fragments: {}", config.fragments_file().display());
    } else {
        println!("   Fragments: unchanged");
    }
    println!("   Manifest: {}", config.manifest_file().display());
    println!("   Time: {}ms", stats.duration_ms);
    println!();
}
