//! Template Synthesizer.
//!
//! Writes one renderer per page that imports, dispatches to and queries only
//! the components that page needs.

use pagegen_core::config::SiteConfig;
use pagegen_core::{RendererArtifact, Result, SynthesisMode};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fragments::ComponentRegistry;
use crate::skeleton::{RendererSections, Skeleton, relative_path};
use crate::text::indent_lines;

/// What to synthesize for one page
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub database_id: i64,
    pub content_type: &'a str,
    pub slug: &'a str,
    /// Unique, sorted component names used on the page
    pub components: &'a [String],
}

pub struct Synthesizer<'a> {
    registry: &'a ComponentRegistry,
    skeleton: Skeleton,
    cache_dir: PathBuf,
    component_import_base: String,
    extension: String,
    mode: SynthesisMode,
}

impl<'a> Synthesizer<'a> {
    /// Prepare a synthesizer from an already parsed skeleton.
    ///
    /// Import paths in the skeleton are rewritten for the cache directory.
    pub fn new(
        config: &SiteConfig,
        registry: &'a ComponentRegistry,
        skeleton: Skeleton,
        mode: SynthesisMode,
    ) -> Self {
        let cache = &config.paths.cache;
        let skeleton_base = config
            .paths
            .skeleton
            .parent()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""));

        Self {
            registry,
            skeleton: skeleton.with_import_base(&relative_path(cache, skeleton_base)),
            cache_dir: config.cache_dir(),
            component_import_base: relative_path(cache, &config.paths.components),
            extension: config.renderer_extension().to_string(),
            mode,
        }
    }

    /// Load the skeleton named by the configuration and prepare a synthesizer
    pub fn from_config(
        config: &SiteConfig,
        registry: &'a ComponentRegistry,
        mode: SynthesisMode,
    ) -> Result<Self> {
        let skeleton = Skeleton::load(&config.skeleton_file())?;
        Ok(Self::new(config, registry, skeleton, mode))
    }

    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    /// Cache file for a page: `<slug>-<databaseId>`, since slugs repeat across a page hierarchy
    pub fn output_path(&self, slug: &str, database_id: i64) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{}.{}", slug, database_id, self.extension))
    }

    /// Components the renderer will import for a page, sorted
    pub fn selected_components(&self, requested: &[String]) -> Vec<String> {
        match self.mode {
            SynthesisMode::AllComponents => self.registry.names().map(str::to_string).collect(),
            SynthesisMode::Minimal => requested
                .iter()
                .filter(|name| {
                    let known = self.registry.contains(name);
                    if !known {
                        warn!(component = %name, "no fragment file for component, it will render as not found");
                    }
                    known
                })
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Generated code for each skeleton slot
    pub fn sections(&self, request: &SynthesisRequest<'_>, components: &[String]) -> RendererSections {
        let naming = self.registry.naming();
        let single = naming.single_field(request.content_type);

        let imports = components
            .iter()
            .map(|name| format!("import {name} from '{}/{name}'", self.component_import_base))
            .collect::<Vec<_>>()
            .join("\n");

        let data = format!(
            "const data = pageProps.data.{single}\nconst componentInstances = data?.{group}?.{field} || []",
            group = naming.field_group_name(),
            field = naming.field_name(),
        );

        let dispatch = components
            .iter()
            .map(|name| {
                format!(
                    "if (component.name === '{name}') {{\n  return <{name} {{...component.data}} key={{index}} />\n}}"
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut selections = vec!["__typename".to_string()];
        selections.extend(
            components
                .iter()
                .map(|name| self.registry.reference_fragment(request.content_type, name)),
        );
        let query = format!(
            "export const query = graphql`\n  query {ct}Query{id}($id: String!) {{\n    {single}(id: {{ eq: $id }}) {{\n      title\n      {group} {{\n        {field} {{\n{selections}\n        }}\n      }}\n    }}\n  }}\n`",
            ct = request.content_type,
            id = request.database_id,
            group = naming.field_group_name(),
            field = naming.field_name(),
            selections = indent_lines(&selections.join("\n"), "          "),
        );

        RendererSections {
            imports,
            data,
            dispatch,
            query,
        }
    }

    /// Renderer source for a page, with the components it imports
    pub fn render(&self, request: &SynthesisRequest<'_>) -> (String, Vec<String>) {
        let components = self.selected_components(request.components);
        let sections = self.sections(request, &components);
        (self.skeleton.instantiate(&sections), components)
    }

    /// Render a page's renderer and write it to the cache directory
    pub async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<RendererArtifact> {
        let (source, components) = self.render(&request);
        let path = self.output_path(request.slug, request.database_id);

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&path, source).await?;
        debug!(
            path = %path.display(),
            components = components.len(),
            "wrote page renderer"
        );

        Ok(RendererArtifact {
            path,
            slug: request.slug.to_string(),
            database_id: request.database_id,
            components,
        })
    }
}
