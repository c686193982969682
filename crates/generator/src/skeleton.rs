//! Renderer skeleton.
//!
//! The skeleton is the generic page renderer, with four lines reserved for
//! generated code:
//!
//! ```text
//! // @slot(imports)
//! // @slot(data)
//! // @slot(dispatch)
//! // @slot(query)
//! ```
//!
//! Parsing checks that each slot appears exactly once and alone on its line,
//! so a skeleton edit that breaks a marker fails the build instead of
//! producing a renderer with code missing.

use pagegen_core::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::text::indent_lines;

const SLOT_OPEN: &str = "// @slot(";
const SLOT_MARKER: &str = "@slot(";

/// A reserved line in the skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Component import statements
    Imports,
    /// Binding of the page data and its component list
    Data,
    /// Branches mapping a component instance to its renderer
    Dispatch,
    /// The page query
    Query,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Imports, Slot::Data, Slot::Dispatch, Slot::Query];

    pub fn name(self) -> &'static str {
        match self {
            Slot::Imports => "imports",
            Slot::Data => "data",
            Slot::Dispatch => "dispatch",
            Slot::Query => "query",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Slot::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{})", SLOT_OPEN, self.name())
    }
}

/// Generated code for each slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererSections {
    pub imports: String,
    pub data: String,
    pub dispatch: String,
    pub query: String,
}

impl RendererSections {
    pub fn section(&self, slot: Slot) -> &str {
        match slot {
            Slot::Imports => &self.imports,
            Slot::Data => &self.data,
            Slot::Dispatch => &self.dispatch,
            Slot::Query => &self.query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot {
        slot: Slot,
        indent: String,
        newline: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    path: PathBuf,
    segments: Vec<Segment>,
}

impl Skeleton {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::skeleton(path, format!("cannot read skeleton: {}", e)))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut seen = Vec::new();
        let mut pending = String::new();

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let newline = line.ends_with('\n');
            let content = line.trim_end_matches(['\n', '\r']);
            let trimmed = content.trim();

            if !trimmed.contains(SLOT_MARKER) {
                pending.push_str(line);
                continue;
            }

            let line_no = index + 1;
            let name = trimmed
                .strip_prefix(SLOT_OPEN)
                .and_then(|rest| rest.strip_suffix(')'))
                .ok_or_else(|| {
                    Error::skeleton(
                        path,
                        format!("line {}: slot marker must be alone on its line", line_no),
                    )
                })?;
            let slot = Slot::from_name(name).ok_or_else(|| {
                Error::skeleton(path, format!("line {}: unknown slot '{}'", line_no, name))
            })?;
            if seen.contains(&slot) {
                return Err(Error::skeleton(
                    path,
                    format!("line {}: slot '{}' appears more than once", line_no, name),
                ));
            }
            seen.push(slot);

            if !pending.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut pending)));
            }
            let indent_len = content.len() - content.trim_start().len();
            segments.push(Segment::Slot {
                slot,
                indent: content[..indent_len].to_string(),
                newline,
            });
        }
        if !pending.is_empty() {
            segments.push(Segment::Text(pending));
        }

        let missing: Vec<&str> = Slot::ALL
            .iter()
            .filter(|s| !seen.contains(s))
            .map(|s| s.name())
            .collect();
        if !missing.is_empty() {
            return Err(Error::skeleton(
                path,
                format!("missing slot(s): {}", missing.join(", ")),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            segments,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point the skeleton's parent-relative imports (`from '../x'`) at `base`.
    ///
    /// Generated renderers live in another directory than the skeleton, so
    /// `base` is the skeleton's parent directory as seen from there.
    pub fn with_import_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        for segment in &mut self.segments {
            if let Segment::Text(text) = segment {
                let mut rewritten = text.clone();
                for keyword in ["from", "import"] {
                    for quote in ['\'', '"'] {
                        rewritten = rewritten.replace(
                            &format!("{} {}../", keyword, quote),
                            &format!("{} {}{}/", keyword, quote, base),
                        );
                    }
                }
                *text = rewritten;
            }
        }
        self
    }

    /// Render the skeleton with every slot line replaced by its section
    pub fn instantiate(&self, sections: &RendererSections) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot {
                    slot,
                    indent,
                    newline,
                } => {
                    out.push_str(&indent_lines(sections.section(*slot), indent));
                    if *newline {
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}

/// Relative path from directory `from` to directory `to`, both relative to
/// the same root, written with `/` separators for use in import statements.
pub fn relative_path(from: &Path, to: &Path) -> String {
    fn parts(path: &Path) -> Vec<String> {
        path.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    let from = parts(from);
    let to = parts(to);
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut segments: Vec<String> = vec!["..".to_string(); from.len() - common];
    segments.extend(to[common..].iter().cloned());

    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKELETON: &str = "import React from 'react'
import SEO from '../components/structural/seo'
import { graphql } from 'gatsby'

// @slot(imports)

const PageTemplate = pageProps => {
  // @slot(data)
  return (
    <>
      {componentInstances.map((component, index) => {
        // @slot(dispatch)
        return <div>Error: The component {component.name} was not found</div>
      })}
    </>
  )
}

export default PageTemplate

// @slot(query)
";

    fn sections() -> RendererSections {
        RendererSections {
            imports: "import Banner from '../../src/components/page/Banner'".to_string(),
            data: "const data = pageProps.data.page\nconst componentInstances = []".to_string(),
            dispatch: "if (component.name === 'Banner') {\n  return <Banner />\n}".to_string(),
            query: "export const query = 1".to_string(),
        }
    }

    #[test]
    fn test_instantiate_replaces_each_slot_line() {
        let skeleton = Skeleton::parse(Path::new("page.js"), SKELETON).unwrap();
        let out = skeleton.instantiate(&sections());

        assert!(!out.contains("@slot("));
        assert!(out.contains("\nimport Banner from '../../src/components/page/Banner'\n"));
        assert!(out.contains("\n  const data = pageProps.data.page\n  const componentInstances = []\n  return ("));
        assert!(out.contains("\n        if (component.name === 'Banner') {\n          return <Banner />\n        }\n        return <div>"));
        assert!(out.ends_with("\nexport const query = 1\n"));
    }

    #[test]
    fn test_empty_sections_leave_blank_lines() {
        let skeleton = Skeleton::parse(Path::new("page.js"), SKELETON).unwrap();
        let out = skeleton.instantiate(&RendererSections::default());
        assert_eq!(out.lines().count(), SKELETON.lines().count());
        assert!(out.contains("export default PageTemplate"));
    }

    #[test]
    fn test_import_base_rewrites_parent_imports() {
        let skeleton = Skeleton::parse(Path::new("page.js"), SKELETON)
            .unwrap()
            .with_import_base("../../src");
        let out = skeleton.instantiate(&RendererSections::default());
        assert!(out.contains("import SEO from '../../src/components/structural/seo'"));
        assert!(out.contains("import React from 'react'"));
    }

    #[test]
    fn test_parse_rejects_missing_slot() {
        let text = SKELETON.replace("// @slot(query)\n", "");
        let err = Skeleton::parse(Path::new("page.js"), &text).unwrap_err();
        assert!(err.to_string().contains("missing slot(s): query"));
    }

    #[test]
    fn test_parse_rejects_duplicate_slot() {
        let text = format!("{}// @slot(imports)\n", SKELETON);
        let err = Skeleton::parse(Path::new("page.js"), &text).unwrap_err();
        assert!(err.to_string().contains("appears more than once"));
    }

    #[test]
    fn test_parse_rejects_unknown_slot() {
        let text = SKELETON.replace("@slot(data)", "@slot(props)");
        let err = Skeleton::parse(Path::new("page.js"), &text).unwrap_err();
        assert!(err.to_string().contains("unknown slot 'props'"));
    }

    #[test]
    fn test_parse_rejects_marker_sharing_a_line() {
        let text = SKELETON.replace("// @slot(imports)", "const x = 1 // @slot(imports)");
        let err = Skeleton::parse(Path::new("page.js"), &text).unwrap_err();
        assert!(err.to_string().contains("alone on its line"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Skeleton::load(Path::new("/nonexistent/page.js")).unwrap_err();
        assert!(matches!(err, Error::Skeleton { .. }));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new(".cache/page-templates"), Path::new("src")),
            "../../src"
        );
        assert_eq!(
            relative_path(Path::new(".cache/page-templates"), Path::new("src/components/page")),
            "../../src/components/page"
        );
        assert_eq!(relative_path(Path::new("build"), Path::new("")), "..");
        assert_eq!(relative_path(Path::new("src/a"), Path::new("src/b")), "../b");
        assert_eq!(relative_path(Path::new("src"), Path::new("src")), ".");
        assert_eq!(relative_path(Path::new("./out"), Path::new("./src")), "../src");
    }
}
