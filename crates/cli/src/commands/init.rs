use anyhow::{Context, Result};
use pagegen_core::config::CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ENDPOINT: &str = "http://www.content.local/graphql";

const PAGE_SKELETON: &str = r#"// Generic page renderer. pagegen copies this file once per page into
// .cache/page-templates and fills each @slot line with generated code.

import React from 'react'
import { graphql } from 'gatsby'
import SEO from '../components/structural/seo'

// @slot(imports)

const PageTemplate = pageProps => {
  // @slot(data)
  const components = componentInstances.map(component => ({
    name: component.__typename.split('_').pop(),
    data: component,
  }))
  return (
    <>
      <SEO title={data.title} />
      {components.map((component, index) => {
        // @slot(dispatch)
        return <div key={index}>Error: The component {component.name} was not found</div>
      })}
    </>
  )
}

export default PageTemplate

// @slot(query)
"#;

const POST_TEMPLATE: &str = r#"import React from 'react'
import { graphql } from 'gatsby'
import SEO from '../components/structural/seo'

const PostTemplate = pageProps => {
  const post = pageProps.data.post
  return (
    <>
      <SEO title={post.title} />
      <article>
        <h1>{post.title}</h1>
        <p>Published on {post.date}</p>
      </article>
    </>
  )
}

export default PostTemplate

export const query = graphql`
  query PostQuery($id: String!) {
    post(id: { eq: $id }) {
      title
      date
    }
  }
`
"#;

const SEO_COMPONENT: &str = r#"import React from 'react'

const SEO = ({ title }) => <title>{title}</title>

export default SEO
"#;

/// (name, renderer, field selection)
const STARTER_COMPONENTS: &[(&str, &str, &str)] = &[
    (
        "Banner",
        r#"import React from 'react'

const Banner = ({ title, description }) => {
  return (
    <section id="banner">
      <h1>{title}</h1>
      <p>{description}</p>
    </section>
  )
}

export default Banner
"#,
        "title\ndescription\n",
    ),
    (
        "GenericContent",
        r#"import React from 'react'

const GenericContent = ({ content }) => {
  return (
    <section id="generic-content">
      <div>{content}</div>
    </section>
  )
}

export default GenericContent
"#,
        "content\n",
    ),
];

/// Escape a string for safe inclusion in a TOML basic string
///
/// Handles the required escape sequences for TOML basic strings:
/// - Backslash (\\) -> \\\\
/// - Quote (\") -> \\\"
/// - Newline, carriage return and tab
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Scaffold a new site with a configuration, a renderer skeleton, starter
/// components and a post template.
///
/// # Errors
///
/// Returns an error if pagegen.toml already exists in the directory or a
/// file cannot be written.
pub async fn run(path: PathBuf, endpoint: Option<String>) -> Result<()> {
    println!("📁 Initializing site at: {}", path.display());

    if path.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "{} already exists in {}",
            CONFIG_FILE,
            path.display()
        );
    }

    let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    scaffold(&path, &endpoint)?;

    println!("   ✓ Created {}", CONFIG_FILE);
    println!("   ✓ Created src/templates/page.js (renderer skeleton)");
    println!("   ✓ Created src/templates/post.js");
    for (name, _, _) in STARTER_COMPONENTS {
        println!("   ✓ Created component {}", name);
    }
    println!();
    println!("Next steps:");
    println!("   1. Point [source] endpoint at your CMS GraphQL API");
    println!("   2. pagegen validate {}", path.display());
    println!("   3. pagegen build {}", path.display());

    Ok(())
}

pub(crate) fn scaffold(base: &Path, endpoint: &str) -> Result<()> {
    let templates = base.join("src/templates");
    let components = base.join("src/components/page");
    let structural = base.join("src/components/structural");
    for dir in [&templates, &components, &structural] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    fs::write(base.join(CONFIG_FILE), generate_config(endpoint))
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;
    fs::write(templates.join("page.js"), PAGE_SKELETON)?;
    fs::write(templates.join("post.js"), POST_TEMPLATE)?;
    fs::write(structural.join("seo.js"), SEO_COMPONENT)?;

    for (name, renderer, fields) in STARTER_COMPONENTS {
        let dir = components.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("index.js"), format!("export {{ default }} from './{}'\n", name))?;
        fs::write(dir.join(format!("{}.js", name)), renderer)?;
        fs::write(pagegen_generator::descriptor_path(&components, name), fields)?;
    }

    Ok(())
}

fn generate_config(endpoint: &str) -> String {
    format!(
        r#"# pagegen site configuration

[source]
# GraphQL endpoint of the CMS (PAGEGEN_GRAPHQL_URL overrides it)
endpoint = "{}"
# Prefix the schema puts before content type names, e.g. "Wp"
type_prefix = ""

[pages]
# Content types that get one generated renderer per page
content_types = ["Page"]
# Field group and flexible content field holding each page's components
field_group_name = "pageComponents"
field_name = "pageComponents"

[paths]
components = "src/components/page"
skeleton = "src/templates/page.js"
templates = "src/templates"
cache = ".cache/page-templates"
fragments = "src/fragments/component-fragments.js"
manifest = ".cache/pages.json"

[develop]
refresh_url = "http://localhost:8000/__refresh"

[[collections]]
content_type = "Post"
template = "post"
"#,
        toml_escape_string(endpoint)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegen_core::{TypeNaming, parse_site_toml};
    use pagegen_generator::{ComponentRegistry, Skeleton, registrar::resolve_static_template};
    use tempfile::TempDir;

    #[test]
    fn test_toml_escape_string() {
        assert_eq!(toml_escape_string(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(toml_escape_string("x\ny"), "x\\ny");
    }

    #[test]
    fn test_scaffold_produces_a_valid_site() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path(), "http://cms.example.com/graphql").unwrap();

        let config = parse_site_toml(dir.path()).unwrap();
        assert_eq!(config.source.endpoint, "http://cms.example.com/graphql");

        let registry =
            ComponentRegistry::load(&config.components_dir(), TypeNaming::from_config(&config))
                .unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["Banner", "GenericContent"]
        );

        Skeleton::load(&config.skeleton_file()).unwrap();
        resolve_static_template(&config, "post").unwrap();
    }

    #[test]
    fn test_generated_config_escapes_endpoint() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path(), "http://cms/\"graphql\"").unwrap();
        let config = parse_site_toml(dir.path()).unwrap();
        assert_eq!(config.source.endpoint, "http://cms/\"graphql\"");
    }

    #[tokio::test]
    async fn test_run_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let err = run(dir.path().to_path_buf(), None).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
