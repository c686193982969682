pub mod build;
pub mod develop;
pub mod init;
pub mod validate;

use anyhow::{Context, Result};
use pagegen_core::config::{CONFIG_FILE, SiteConfig};
use pagegen_core::parse_site_toml;
use std::path::Path;

/// Overrides `source.endpoint` from pagegen.toml
pub const ENDPOINT_ENV: &str = "PAGEGEN_GRAPHQL_URL";

/// Load pagegen.toml from a site directory, applying the endpoint override
pub fn load_config(path: &Path) -> Result<SiteConfig> {
    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }
    if !path.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'pagegen init {}' first",
            CONFIG_FILE,
            path.display(),
            path.display()
        );
    }

    let config = parse_site_toml(path).with_context(|| format!("Failed to parse {}", CONFIG_FILE))?;

    Ok(match std::env::var(ENDPOINT_ENV) {
        Ok(endpoint) if !endpoint.trim().is_empty() => config.with_endpoint(endpoint),
        _ => config,
    })
}
