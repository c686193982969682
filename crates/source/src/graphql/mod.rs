// GraphQL over HTTP

use async_trait::async_trait;
use pagegen_core::{Error, Result};
use serde::Serialize;
use tracing::debug;

use crate::{QueryEngine, QueryResponse};

/// Query engine that POSTs queries to a GraphQL endpoint
pub struct HttpQueryEngine {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

impl HttpQueryEngine {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn execute(&self, query: &str) -> Result<QueryResponse> {
        debug!(endpoint = %self.endpoint, bytes = query.len(), "executing GraphQL query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        // GraphQL servers often answer errors with a non-2xx status and a
        // regular error body, so try the body before looking at the status.
        match serde_json::from_str::<QueryResponse>(&body) {
            Ok(parsed) if parsed.data.is_some() || parsed.has_errors() => Ok(parsed),
            _ if !status.is_success() => Err(Error::Transport(format!(
                "{} answered with status {}",
                self.endpoint, status
            ))),
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(Error::Transport(format!(
                "invalid GraphQL response from {}: {}",
                self.endpoint, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_body() {
        let body = serde_json::to_string(&QueryRequest { query: "{ a }" }).unwrap();
        assert_eq!(body, r#"{"query":"{ a }"}"#);
    }

    #[test]
    fn test_new_keeps_endpoint() {
        let engine = HttpQueryEngine::new("http://www.content.local/graphql").unwrap();
        assert_eq!(engine.endpoint(), "http://www.content.local/graphql");
    }
}
