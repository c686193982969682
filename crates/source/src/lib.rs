// Content source: GraphQL query engine and the page fetcher built on it

pub mod fetch;
pub mod graphql;

use async_trait::async_trait;
use pagegen_core::Result;
use serde::{Deserialize, Serialize};

pub use fetch::{
    CollectionNode, build_collection_query, build_pages_query, fetch_collection, fetch_pages,
};
pub use graphql::HttpQueryEngine;

/// A GraphQL error entry as reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
}

/// Response of one query execution.
///
/// Reported errors are data, not faults: an engine that answered with
/// `errors` still returns `Ok`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl QueryResponse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn execute(&self, query: &str) -> Result<QueryResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_without_errors_field() {
        let resp: QueryResponse = serde_json::from_str(r#"{"data":{"a":1}}"#).unwrap();
        assert!(!resp.has_errors());
        assert_eq!(resp.data, Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_response_with_errors_and_null_data() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{"data":null,"errors":[{"message":"Cannot query field","path":["allPage"]}]}"#,
        )
        .unwrap();
        assert!(resp.has_errors());
        assert!(resp.data.is_none());
        assert_eq!(resp.errors[0].message, "Cannot query field");
    }
}
