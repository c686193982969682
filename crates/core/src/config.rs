use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the site configuration, looked up at the site root
pub const CONFIG_FILE: &str = "pagegen.toml";

/// Raw TOML configuration structure
/// This matches the pagegen.toml file structure exactly
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    source: RawSource,
    pages: RawPages,
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    develop: RawDevelop,
    #[serde(default)]
    collections: Vec<RawCollection>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    endpoint: String,
    #[serde(default)]
    type_prefix: String,
}

#[derive(Debug, Deserialize)]
struct RawPages {
    content_types: Vec<String>,
    field_group_name: String,
    field_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    components: Option<String>,
    skeleton: Option<String>,
    templates: Option<String>,
    cache: Option<String>,
    fragments: Option<String>,
    manifest: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDevelop {
    refresh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    content_type: String,
    template: String,
}

/// Complete, validated site configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    /// Site root; every path in `paths` is relative to it
    pub root: PathBuf,
    pub source: SourceConfig,
    pub pages: PagesConfig,
    pub paths: PathsConfig,
    pub develop: DevelopConfig,
    pub collections: Vec<CollectionConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub endpoint: String,
    pub type_prefix: String,
}

/// Which content types become pages and where their component list lives
#[derive(Debug, Clone, PartialEq)]
pub struct PagesConfig {
    pub content_types: Vec<String>,
    pub field_group_name: String,
    pub field_name: String,
}

/// Site-relative paths
#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub components: PathBuf,
    pub skeleton: PathBuf,
    pub templates: PathBuf,
    pub cache: PathBuf,
    pub fragments: PathBuf,
    pub manifest: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            components: PathBuf::from("src/components/page"),
            skeleton: PathBuf::from("src/templates/page.js"),
            templates: PathBuf::from("src/templates"),
            cache: PathBuf::from(".cache/page-templates"),
            fragments: PathBuf::from("src/fragments/component-fragments.js"),
            manifest: PathBuf::from(".cache/pages.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DevelopConfig {
    pub refresh_url: String,
}

impl Default for DevelopConfig {
    fn default() -> Self {
        Self {
            refresh_url: "http://localhost:8000/__refresh".to_string(),
        }
    }
}

/// A content type whose nodes all share one static template
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    pub content_type: String,
    pub template: String,
}

impl SiteConfig {
    pub fn components_dir(&self) -> PathBuf {
        self.root.join(&self.paths.components)
    }

    pub fn skeleton_file(&self) -> PathBuf {
        self.root.join(&self.paths.skeleton)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.paths.templates)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.paths.cache)
    }

    pub fn fragments_file(&self) -> PathBuf {
        self.root.join(&self.paths.fragments)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(&self.paths.manifest)
    }

    /// Extension shared by the skeleton, static templates and generated renderers
    pub fn renderer_extension(&self) -> &str {
        self.paths
            .skeleton
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("js")
    }

    /// Path of a static template file by its slug
    pub fn template_file(&self, slug: &str) -> PathBuf {
        self.templates_dir()
            .join(format!("{}.{}", slug, self.renderer_extension()))
    }

    /// Copy of this configuration with a different query endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.source.endpoint = endpoint.into();
        self
    }
}

/// Parse pagegen.toml from a site root directory
pub fn parse_site_toml<P: AsRef<Path>>(root: P) -> Result<SiteConfig> {
    let root = root.as_ref();
    let content = fs::read_to_string(root.join(CONFIG_FILE))?;
    parse_site_toml_str(&content, root)
}

/// Parse pagegen.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str, root: &Path) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.source.endpoint.trim().is_empty() {
        return Err(Error::ConfigParse("source.endpoint must not be empty".to_string()));
    }
    if !raw.source.type_prefix.is_empty() {
        validate_identifier(&raw.source.type_prefix, "source.type_prefix")?;
    }

    if raw.pages.content_types.is_empty() {
        return Err(Error::ConfigParse(
            "pages.content_types must list at least one content type".to_string(),
        ));
    }
    for content_type in &raw.pages.content_types {
        validate_identifier(content_type, "pages.content_types")?;
    }
    validate_identifier(&raw.pages.field_group_name, "pages.field_group_name")?;
    validate_identifier(&raw.pages.field_name, "pages.field_name")?;

    let defaults = PathsConfig::default();
    let path_or_default = |value: Option<String>, field: &str, default: PathBuf| match value {
        Some(p) => validate_path(&p, field),
        None => Ok(default),
    };

    let paths = PathsConfig {
        components: path_or_default(raw.paths.components, "paths.components", defaults.components)?,
        skeleton: path_or_default(raw.paths.skeleton, "paths.skeleton", defaults.skeleton)?,
        templates: path_or_default(raw.paths.templates, "paths.templates", defaults.templates)?,
        cache: path_or_default(raw.paths.cache, "paths.cache", defaults.cache)?,
        fragments: path_or_default(raw.paths.fragments, "paths.fragments", defaults.fragments)?,
        manifest: path_or_default(raw.paths.manifest, "paths.manifest", defaults.manifest)?,
    };

    if paths.skeleton.extension().is_none() {
        return Err(Error::ConfigParse(format!(
            "paths.skeleton '{}' needs a file extension",
            paths.skeleton.display()
        )));
    }

    let collections = raw
        .collections
        .into_iter()
        .map(|c| {
            validate_identifier(&c.content_type, "collections.content_type")?;
            if c.template.trim().is_empty() {
                return Err(Error::ConfigParse(
                    "Empty template in 'collections.template' field".to_string(),
                ));
            }
            validate_path(&c.template, "collections.template")?;
            Ok(CollectionConfig {
                content_type: c.content_type,
                template: c.template,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SiteConfig {
        root: root.to_path_buf(),
        source: SourceConfig {
            endpoint: raw.source.endpoint,
            type_prefix: raw.source.type_prefix,
        },
        pages: PagesConfig {
            content_types: raw.pages.content_types,
            field_group_name: raw.pages.field_group_name,
            field_name: raw.pages.field_name,
        },
        paths,
        develop: DevelopConfig {
            refresh_url: raw
                .develop
                .refresh_url
                .unwrap_or_else(|| DevelopConfig::default().refresh_url),
        },
        collections,
    })
}

/// Validate and convert a path string to PathBuf.
///
/// Generated files are written below these paths, so they must stay inside
/// the site root. Rejects:
/// - Absolute paths (starting with `/` or Windows drive letters)
/// - Paths containing parent directory references (`..`)
/// - Empty paths
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use paths relative to the site root.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}

/// GraphQL names: a letter or underscore, then letters, digits or underscores
fn validate_identifier(name: &str, field_name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::ConfigParse(format!(
            "'{}' in '{}' is not a valid GraphQL name",
            name, field_name
        )))
    }
}
