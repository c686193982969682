//! GraphQL type and field names derived from the site configuration.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::config::SiteConfig;

/// Maps content types and component names onto the schema the CMS exposes.
///
/// With an empty type prefix, field group `pageComponents` and field
/// `pageComponents`, a `Banner` on `Page` has the polymorphic type
/// `Page_PageComponents_PageComponents_Banner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNaming {
    type_prefix: String,
    field_group_name: String,
    field_name: String,
}

impl TypeNaming {
    pub fn new(
        type_prefix: impl Into<String>,
        field_group_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            field_group_name: field_group_name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.source.type_prefix.clone(),
            config.pages.field_group_name.clone(),
            config.pages.field_name.clone(),
        )
    }

    pub fn field_group_name(&self) -> &str {
        &self.field_group_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Schema type of a content node, e.g. `WpPage`
    pub fn node_type(&self, content_type: &str) -> String {
        format!("{}{}", self.type_prefix, content_type)
    }

    /// Root field listing all nodes of a content type, e.g. `allWpPage`
    pub fn list_field(&self, content_type: &str) -> String {
        format!("all{}", self.node_type(content_type))
    }

    /// Root field fetching one node by id, e.g. `wpPage`
    pub fn single_field(&self, content_type: &str) -> String {
        self.node_type(content_type).to_lower_camel_case()
    }

    pub fn component_type_prefix(&self, content_type: &str) -> String {
        format!(
            "{}_{}_{}_",
            self.node_type(content_type),
            self.field_group_name.to_upper_camel_case(),
            self.field_name.to_upper_camel_case()
        )
    }

    /// Polymorphic type of a component on a content type
    pub fn component_type(&self, content_type: &str, component: &str) -> String {
        format!("{}{}", self.component_type_prefix(content_type), component)
    }

    /// Component name for a `__typename`.
    ///
    /// Falls back to the last `_` segment when the known prefix does not
    /// match, which is what the renderer does at runtime.
    pub fn component_name(&self, content_type: &str, typename: &str) -> String {
        let prefix = self.component_type_prefix(content_type);
        match typename.strip_prefix(&prefix) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => typename.rsplit('_').next().unwrap_or(typename).to_string(),
        }
    }

    /// Named fragment holding a component's fields, e.g. `PageBannerFields`
    pub fn fragment_name(&self, content_type: &str, component: &str) -> String {
        format!("{}{}Fields", content_type, component)
    }
}
