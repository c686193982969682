//! Content Fetcher.
//!
//! Discovers every page of the configured content types together with the
//! `__typename` of each component on it. Field bodies are not requested here:
//! each page's own renderer query selects them later.

use pagegen_core::config::SiteConfig;
use pagegen_core::{ComponentInstance, ContentPage, DEFAULT_TEMPLATE, Error, Result, TypeNaming};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{QueryEngine, QueryResponse};

/// Node of a collection content type
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionNode {
    pub id: String,
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    database_id: i64,
    #[serde(default)]
    node_type: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    template: Option<RawTemplate>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTemplate {
    #[serde(default)]
    template_name: Option<String>,
}

/// Combined query listing every page of every configured content type
pub fn build_pages_query(config: &SiteConfig) -> String {
    let naming = TypeNaming::from_config(config);
    let selections: Vec<String> = config
        .pages
        .content_types
        .iter()
        .map(|content_type| {
            format!(
                r#"  {list} {{
    nodes {{
      id
      databaseId
      nodeType
      slug
      uri
      title
      template {{
        templateName
      }}
      {group} {{
        {field} {{
          __typename
        }}
      }}
    }}
  }}"#,
                list = naming.list_field(content_type),
                group = naming.field_group_name(),
                field = naming.field_name(),
            )
        })
        .collect();

    format!(
        "query GetAllPagesWithComponents {{\n{}\n}}\n",
        selections.join("\n")
    )
}

/// Query listing every node of a collection content type
pub fn build_collection_query(naming: &TypeNaming, content_type: &str) -> String {
    format!(
        "query GetAll{ct}Nodes {{\n  {list} {{\n    nodes {{\n      id\n      uri\n      title\n    }}\n  }}\n}}\n",
        ct = content_type,
        list = naming.list_field(content_type),
    )
}

/// Fetch all pages of the configured content types.
///
/// Pages come back in content-type declaration order, then in the order the
/// engine returned them.
pub async fn fetch_pages(engine: &dyn QueryEngine, config: &SiteConfig) -> Result<Vec<ContentPage>> {
    let naming = TypeNaming::from_config(config);
    let query = build_pages_query(config);
    let data = execute_checked(engine, &query).await?;

    let mut pages = Vec::new();
    for content_type in &config.pages.content_types {
        let nodes = nodes_of(&data, &naming.list_field(content_type))?;
        for node in nodes {
            let raw: RawNode = serde_json::from_value(node.clone())?;
            pages.push(to_content_page(raw, content_type, &naming)?);
        }
    }

    info!(count = pages.len(), "fetched content pages");
    Ok(pages)
}

/// Fetch every node of one collection content type
pub async fn fetch_collection(
    engine: &dyn QueryEngine,
    naming: &TypeNaming,
    content_type: &str,
) -> Result<Vec<CollectionNode>> {
    let query = build_collection_query(naming, content_type);
    let data = execute_checked(engine, &query).await?;

    nodes_of(&data, &naming.list_field(content_type))?
        .iter()
        .map(|node| serde_json::from_value(node.clone()).map_err(Error::from))
        .collect()
}

/// Execute a query, failing on any reported GraphQL error
async fn execute_checked(engine: &dyn QueryEngine, query: &str) -> Result<serde_json::Value> {
    let QueryResponse { data, errors } = engine.execute(query).await?;

    if !errors.is_empty() {
        for err in &errors {
            error!(message = %err.message, path = ?err.path, "GraphQL error");
        }
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        return Err(Error::Query(messages.join("; ")));
    }

    data.ok_or_else(|| Error::Query("response contained no data".to_string()))
}

fn nodes_of<'a>(data: &'a serde_json::Value, list_field: &str) -> Result<&'a Vec<serde_json::Value>> {
    data.get(list_field)
        .and_then(|list| list.get("nodes"))
        .and_then(|nodes| nodes.as_array())
        .ok_or_else(|| Error::InvalidData(format!("response has no '{}.nodes' list", list_field)))
}

fn to_content_page(raw: RawNode, content_type: &str, naming: &TypeNaming) -> Result<ContentPage> {
    let uri = raw.uri.ok_or_else(|| {
        Error::InvalidData(format!("{} node {} has no uri", content_type, raw.database_id))
    })?;

    // A page that never had components saved returns null rather than []
    let components = raw
        .rest
        .get(naming.field_group_name())
        .and_then(|group| group.get(naming.field_name()))
        .and_then(|list| list.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|component| {
                    let typename = component.get("__typename")?.as_str()?;
                    Some(ComponentInstance {
                        type_name: naming.component_name(content_type, typename),
                        typename: typename.to_string(),
                        data: component.clone(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let template_name = raw
        .template
        .and_then(|t| t.template_name)
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    debug!(content_type, database_id = raw.database_id, %template_name, "parsed page node");

    Ok(ContentPage {
        id: raw.id,
        database_id: raw.database_id,
        node_type: raw.node_type.unwrap_or_else(|| content_type.to_string()),
        slug: raw.slug.unwrap_or_default(),
        uri,
        title: raw.title.unwrap_or_default(),
        template_name,
        content_type: content_type.to_string(),
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphQlError;
    use async_trait::async_trait;
    use pagegen_core::parse_site_toml_str;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    struct CannedEngine {
        response: QueryResponse,
        queries: Mutex<Vec<String>>,
    }

    impl CannedEngine {
        fn new(response: QueryResponse) -> Self {
            Self {
                response,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryEngine for CannedEngine {
        async fn execute(&self, query: &str) -> Result<QueryResponse> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.response.clone())
        }
    }

    fn config() -> SiteConfig {
        parse_site_toml_str(
            r#"
[source]
endpoint = "http://cms/graphql"

[pages]
content_types = ["Page", "Project"]
field_group_name = "pageComponents"
field_name = "pageComponents"
"#,
            Path::new("."),
        )
        .unwrap()
    }

    fn node(id: i64, slug: &str, template: &str, types: &[&str]) -> serde_json::Value {
        let components: Vec<_> = types.iter().map(|t| json!({ "__typename": t })).collect();
        json!({
            "id": format!("node-{}", id),
            "databaseId": id,
            "nodeType": "Page",
            "slug": slug,
            "uri": format!("/{}/", slug),
            "title": slug.to_uppercase(),
            "template": { "templateName": template },
            "pageComponents": { "pageComponents": components }
        })
    }

    #[test]
    fn test_build_pages_query_selects_typename_only() {
        let query = build_pages_query(&config());
        assert!(query.starts_with("query GetAllPagesWithComponents {"));
        assert!(query.contains("allPage {"));
        assert!(query.contains("allProject {"));
        assert!(query.contains("pageComponents {\n        pageComponents {\n          __typename\n        }"));
        assert!(query.contains("templateName"));
        assert!(!query.contains("..."));
    }

    #[test]
    fn test_build_collection_query() {
        let naming = TypeNaming::new("Wp", "pageComponents", "pageComponents");
        let query = build_collection_query(&naming, "Post");
        assert!(query.contains("allWpPost {"));
        assert!(query.contains("uri"));
    }

    #[tokio::test]
    async fn test_fetch_pages_merges_in_declaration_order() {
        let engine = CannedEngine::new(QueryResponse {
            data: Some(json!({
                "allProject": { "nodes": [node(7, "alpha", "Default", &[])] },
                "allPage": { "nodes": [
                    node(2, "home", "Default", &[
                        "Page_PageComponents_PageComponents_Banner",
                        "Page_PageComponents_PageComponents_Banner",
                    ]),
                    node(3, "team", "Team Grid", &[]),
                ]}
            })),
            errors: vec![],
        });

        let pages = fetch_pages(&engine, &config()).await.unwrap();
        let ids: Vec<i64> = pages.iter().map(|p| p.database_id).collect();
        assert_eq!(ids, vec![2, 3, 7]);
        assert_eq!(pages[0].components.len(), 2);
        assert_eq!(pages[0].components[0].type_name, "Banner");
        assert_eq!(pages[0].unique_component_names(), vec!["Banner"]);
        assert_eq!(pages[1].template_name, "Team Grid");
        assert_eq!(pages[1].title, "TEAM");
        assert_eq!(pages[2].content_type, "Project");
        assert_eq!(engine.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_pages_null_components_is_empty() {
        let engine = CannedEngine::new(QueryResponse {
            data: Some(json!({
                "allPage": { "nodes": [{
                    "id": "a", "databaseId": 1, "slug": "x", "uri": "/x/",
                    "template": null,
                    "pageComponents": { "pageComponents": null }
                }]},
                "allProject": { "nodes": [] }
            })),
            errors: vec![],
        });

        let pages = fetch_pages(&engine, &config()).await.unwrap();
        assert!(pages[0].components.is_empty());
        assert_eq!(pages[0].template_name, DEFAULT_TEMPLATE);
        assert_eq!(pages[0].node_type, "Page");
    }

    #[tokio::test]
    async fn test_fetch_pages_fails_on_graphql_errors() {
        let engine = CannedEngine::new(QueryResponse {
            data: Some(json!({ "allPage": { "nodes": [] }, "allProject": { "nodes": [] } })),
            errors: vec![GraphQlError {
                message: "Cannot query field \"allProject\"".to_string(),
                path: None,
            }],
        });

        let err = fetch_pages(&engine, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert!(err.to_string().contains("allProject"));
    }

    #[tokio::test]
    async fn test_fetch_pages_missing_list_is_invalid_data() {
        let engine = CannedEngine::new(QueryResponse {
            data: Some(json!({ "allPage": { "nodes": [] } })),
            errors: vec![],
        });

        let err = fetch_pages(&engine, &config()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_fetch_collection() {
        let engine = CannedEngine::new(QueryResponse {
            data: Some(json!({ "allPost": { "nodes": [
                { "id": "p1", "uri": "/news/one/", "title": "One" },
                { "id": "p2", "uri": "/news/two/", "title": null }
            ]}})),
            errors: vec![],
        });
        let naming = TypeNaming::new("", "pageComponents", "pageComponents");

        let nodes = fetch_collection(&engine, &naming, "Post").await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].uri, "/news/one/");
        assert_eq!(nodes[1].title, None);
    }
}
