//! Graph store clients

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::error::{GraphError, GraphResult};
use crate::query::GraphQuery;

/// One result row, keyed by column name
pub type GraphRow = Map<String, Value>;

/// Executes parameterised statements against a graph database
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, query: &GraphQuery) -> GraphResult<Vec<GraphRow>>;
}

/// Neo4j client using the HTTP transactional endpoint (one auto-committed transaction per statement)
pub struct Neo4jHttpStore {
    client: Client,
    commit_url: String,
    credentials: Option<(String, String)>,
}

impl Neo4jHttpStore {
    pub fn new(
        base_url: &str,
        database: &str,
        credentials: Option<(String, String)>,
    ) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            commit_url: commit_url(base_url, database),
            credentials,
        })
    }
}

fn commit_url(base_url: &str, database: &str) -> String {
    format!("{}/db/{}/tx/commit", base_url.trim_end_matches('/'), database)
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

fn parse_commit_response(body: CommitResponse) -> GraphResult<Vec<GraphRow>> {
    if let Some(error) = body.errors.into_iter().next() {
        return Err(GraphError::Query {
            code: error.code,
            message: error.message,
        });
    }

    let result = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GraphError::UnexpectedResponse("no statement result".to_string()))?;

    Ok(result
        .data
        .into_iter()
        .map(|data| result.columns.iter().cloned().zip(data.row).collect())
        .collect())
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    #[tracing::instrument(skip(self, query), fields(db.system = "neo4j"))]
    async fn run(&self, query: &GraphQuery) -> GraphResult<Vec<GraphRow>> {
        let start = std::time::Instant::now();
        let body = json!({
            "statements": [{
                "statement": query.statement,
                "parameters": query.parameters,
            }]
        });

        let mut request = self.client.post(&self.commit_url).json(&body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GraphError::Http(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let body: CommitResponse = response
            .json()
            .await
            .map_err(|e| GraphError::UnexpectedResponse(e.to_string()))?;

        let rows = parse_commit_response(body)?;

        tracing::debug!(
            rows = rows.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Graph statement committed"
        );

        Ok(rows)
    }
}
