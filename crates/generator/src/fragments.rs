//! Fragment Registry.
//!
//! Every component folder carries a `<Name>.graphql` file holding the field
//! selection its renderer needs. The registry turns those files into an
//! immutable table and renders the GraphQL fragments built from it.

use pagegen_core::{ComponentDescriptor, Error, Result, TypeNaming};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::scanner::list_subdirectories;
use crate::text::{dedent, indent_lines};

/// Extension of a component's field-selection file
pub const FRAGMENT_EXTENSION: &str = "graphql";

const AGGREGATE_HEADER: &str = "// Generated by pagegen from the component fragment files. Do not edit.\nimport { graphql } from 'gatsby'\n";

/// Path of the field-selection file of component `name`
pub fn descriptor_path(components_dir: &Path, name: &str) -> PathBuf {
    components_dir
        .join(name)
        .join(format!("{}.{}", name, FRAGMENT_EXTENSION))
}

/// Known components, keyed and ordered by name
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRegistry {
    naming: TypeNaming,
    descriptors: BTreeMap<String, ComponentDescriptor>,
}

impl ComponentRegistry {
    /// Build a registry from descriptors declared in code
    pub fn from_descriptors(
        naming: TypeNaming,
        descriptors: impl IntoIterator<Item = ComponentDescriptor>,
    ) -> Self {
        Self {
            naming,
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// Scan `components_dir` and read every component's field-selection file.
    ///
    /// Always reads from disk, so an edited file is picked up by the next load.
    pub fn load(components_dir: &Path, naming: TypeNaming) -> Result<Self> {
        let mut descriptors = Vec::new();
        for name in list_subdirectories(components_dir)? {
            let path = descriptor_path(components_dir, &name);
            if !path.is_file() {
                return Err(Error::MissingDescriptor {
                    component: name,
                    path,
                });
            }
            let fields = dedent(&fs::read_to_string(&path)?);
            debug!(component = %name, "loaded fragment fields");
            descriptors.push(ComponentDescriptor::new(name, fields));
        }

        info!(
            count = descriptors.len(),
            dir = %components_dir.display(),
            "loaded component registry"
        );
        Ok(Self::from_descriptors(naming, descriptors))
    }

    pub fn naming(&self) -> &TypeNaming {
        &self.naming
    }

    /// Component names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.descriptors.get(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Inline selection pulling a component's named fragment into a parent selection
    pub fn reference_fragment(&self, content_type: &str, component: &str) -> String {
        format!(
            "... on {} {{ ...{} }}",
            self.naming.component_type(content_type, component),
            self.naming.fragment_name(content_type, component)
        )
    }

    /// `fragment <Name> on <Type> { <fields> }` for a known component
    pub fn named_fragment_definition(&self, content_type: &str, component: &str) -> Option<String> {
        let descriptor = self.descriptors.get(component)?;
        Some(format!(
            "fragment {} on {} {{\n{}\n}}",
            self.naming.fragment_name(content_type, component),
            self.naming.component_type(content_type, component),
            indent_lines(&descriptor.fields, "  ")
        ))
    }

    /// Module defining one named fragment per (content type, known component).
    ///
    /// Content types keep the given order and components are sorted, so
    /// unchanged inputs give byte-identical output.
    pub fn aggregate(&self, content_types: &[String]) -> String {
        let definitions: Vec<String> = content_types
            .iter()
            .flat_map(|content_type| {
                self.names()
                    .filter_map(move |name| self.named_fragment_definition(content_type, name))
            })
            .map(|definition| indent_lines(&definition, "  "))
            .collect();

        format!(
            "{}\nexport const componentFragments = graphql`\n{}\n`\n",
            AGGREGATE_HEADER,
            definitions.join("\n\n")
        )
    }

    /// Write the aggregated fragments to `path`, leaving an up-to-date file untouched.
    ///
    /// Returns whether the file was written.
    pub fn write_aggregate(&self, path: &Path, content_types: &[String]) -> Result<bool> {
        let content = self.aggregate(content_types);

        if let Ok(existing) = fs::read_to_string(path)
            && existing == content
        {
            debug!(path = %path.display(), "fragment file unchanged");
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!(path = %path.display(), "wrote aggregated fragments");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn naming() -> TypeNaming {
        TypeNaming::new("", "pageComponents", "pageComponents")
    }

    fn registry() -> ComponentRegistry {
        ComponentRegistry::from_descriptors(
            naming(),
            vec![
                ComponentDescriptor::new("GenericContent", "content"),
                ComponentDescriptor::new("Banner", "title\ndescription"),
            ],
        )
    }

    fn write_component(dir: &Path, name: &str, fields: &str) {
        fs::create_dir_all(dir.join(name)).unwrap();
        fs::write(descriptor_path(dir, name), fields).unwrap();
    }

    #[test]
    fn test_reference_fragment() {
        assert_eq!(
            registry().reference_fragment("Page", "Banner"),
            "... on Page_PageComponents_PageComponents_Banner { ...PageBannerFields }"
        );
    }

    #[test]
    fn test_named_fragment_definition() {
        assert_eq!(
            registry().named_fragment_definition("Page", "Banner").unwrap(),
            "fragment PageBannerFields on Page_PageComponents_PageComponents_Banner {\n  title\n  description\n}"
        );
        assert!(registry().named_fragment_definition("Page", "Missing").is_none());
    }

    #[test]
    fn test_aggregate_has_one_definition_per_pair() {
        let out = registry().aggregate(&["Page".to_string(), "Project".to_string()]);
        assert_eq!(out.matches("fragment ").count(), 4);
        for name in [
            "PageBannerFields",
            "PageGenericContentFields",
            "ProjectBannerFields",
            "ProjectGenericContentFields",
        ] {
            assert_eq!(out.matches(&format!("fragment {} on", name)).count(), 1);
        }
        // content types in configured order, components sorted
        let page_banner = out.find("PageBannerFields").unwrap();
        let page_generic = out.find("PageGenericContentFields").unwrap();
        let project_banner = out.find("ProjectBannerFields").unwrap();
        assert!(page_banner < page_generic && page_generic < project_banner);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let types = vec!["Page".to_string()];
        let reversed = ComponentRegistry::from_descriptors(
            naming(),
            vec![
                ComponentDescriptor::new("Banner", "title\ndescription"),
                ComponentDescriptor::new("GenericContent", "content"),
            ],
        );
        assert_eq!(registry().aggregate(&types), reversed.aggregate(&types));
    }

    #[test]
    fn test_load_reads_fragment_files() {
        let dir = TempDir::new().unwrap();
        write_component(dir.path(), "Banner", "\n  title\n  description\n");
        write_component(dir.path(), "GenericContent", "content\n");

        let loaded = ComponentRegistry::load(dir.path(), naming()).unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["Banner", "GenericContent"]);
        assert_eq!(loaded.get("Banner").unwrap().fields, "title\ndescription");
        assert_eq!(loaded, registry());
    }

    #[test]
    fn test_load_fails_on_missing_fragment_file() {
        let dir = TempDir::new().unwrap();
        write_component(dir.path(), "Banner", "title");
        fs::create_dir(dir.path().join("Gallery")).unwrap();

        let err = ComponentRegistry::load(dir.path(), naming()).unwrap_err();
        match err {
            Error::MissingDescriptor { component, path } => {
                assert_eq!(component, "Gallery");
                assert!(path.ends_with("Gallery/Gallery.graphql"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_accepts_mixed_whitespace_indent() {
        let dir = TempDir::new().unwrap();
        write_component(dir.path(), "Banner", " title\n\u{a0}description\n");

        let loaded = ComponentRegistry::load(dir.path(), naming()).unwrap();
        assert_eq!(loaded.get("Banner").unwrap().fields, " title\n\u{a0}description");
    }

    #[test]
    fn test_load_observes_changed_file() {
        let dir = TempDir::new().unwrap();
        write_component(dir.path(), "Banner", "title");
        let first = ComponentRegistry::load(dir.path(), naming()).unwrap();

        write_component(dir.path(), "Banner", "title\nsubtitle");
        let second = ComponentRegistry::load(dir.path(), naming()).unwrap();

        assert_eq!(first.get("Banner").unwrap().fields, "title");
        assert_eq!(second.get("Banner").unwrap().fields, "title\nsubtitle");
    }

    #[test]
    fn test_write_aggregate_skips_unchanged_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("src/fragments/component-fragments.js");
        let types = vec!["Page".to_string()];

        assert!(registry().write_aggregate(&path, &types).unwrap());
        let first = fs::read_to_string(&path).unwrap();
        assert!(!registry().write_aggregate(&path, &types).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }
}
