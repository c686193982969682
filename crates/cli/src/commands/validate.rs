use anyhow::{Context, Result};
use pagegen_core::TypeNaming;
use pagegen_generator::{Skeleton, load_registry, registrar::resolve_static_template};
use std::path::PathBuf;

use super::load_config;

/// Check a site's configuration, component fragments, skeleton and templates
/// without contacting the CMS
pub async fn run(path: PathBuf) -> Result<()> {
    println!("Validating site at: {}", path.display());

    let config = load_config(&path)?;
    println!("✓ pagegen.toml valid");
    println!("  Content types: {}", config.pages.content_types.join(", "));

    let registry = load_registry(&config).context("Failed to load components")?;
    println!("✓ {} component(s) with fragment files", registry.len());
    let naming = TypeNaming::from_config(&config);
    for name in registry.names() {
        for content_type in &config.pages.content_types {
            println!("  {} → {}", name, naming.component_type(content_type, name));
        }
    }

    Skeleton::load(&config.skeleton_file()).context("Invalid renderer skeleton")?;
    println!("✓ Skeleton: {}", config.skeleton_file().display());

    for collection in &config.collections {
        let template = resolve_static_template(&config, &collection.template)
            .with_context(|| format!("Collection '{}'", collection.content_type))?;
        println!("✓ Collection {}: {}", collection.content_type, template.display());
    }

    Ok(())
}
