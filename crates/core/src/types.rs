use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Template name that marks a page as built from its flexible component list
pub const DEFAULT_TEMPLATE: &str = "Default";

/// A content record fetched from the CMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    pub id: String,
    pub database_id: i64,
    pub node_type: String,
    pub slug: String,
    pub uri: String,
    pub title: String,
    pub template_name: String,
    /// Configured content type this page was fetched for
    pub content_type: String,
    pub components: Vec<ComponentInstance>,
}

impl ContentPage {
    /// Whether this page is rendered from its component list rather than a named template
    pub fn uses_default_template(&self) -> bool {
        self.template_name == DEFAULT_TEMPLATE
    }

    /// Distinct component names used on this page, sorted alphabetically.
    ///
    /// A component used several times is listed once, since it only needs to
    /// be imported once.
    pub fn unique_component_names(&self) -> Vec<String> {
        self.components
            .iter()
            .map(|c| c.type_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// One block in a page's flexible content list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    /// Component name, e.g. `Banner`
    pub type_name: String,
    /// Raw polymorphic `__typename`
    pub typename: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Field selection for one known component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub name: String,
    pub fields: String,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, fields: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into(),
        }
    }
}

/// A generated per-page renderer file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererArtifact {
    pub path: PathBuf,
    pub slug: String,
    pub database_id: i64,
    /// Components imported by the file, sorted
    pub components: Vec<String>,
}

/// Which components a synthesized renderer imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisMode {
    /// Only the components the page uses
    #[default]
    Minimal,
    /// Every known component, so pages can gain components without a restart
    AllComponents,
}

/// Routing context handed to the page-creation action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A single page-creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRegistration {
    pub path: String,
    pub component: PathBuf,
    pub context: PageContext,
}

/// Get a file-name-safe slug from a template name ("Team Grid" -> "team-grid")
pub fn slugify_template_name(name: &str) -> String {
    name.to_lowercase().replace(char::is_whitespace, "-")
}
