//! Document graph seam used by the pipeline

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};
use crate::query::GraphQuery;
use crate::store::{GraphRow, GraphStore};

/// Writes rendering results onto document and page records.
///
/// Page records are keyed by (document, page number): recording twice for the
/// same page updates one record and keeps its identifier.
#[async_trait]
pub trait DocumentGraph: Send + Sync {
    /// Set the thumbnail property on the document record
    async fn set_document_thumbnail(&self, uuid: &str, thumbnail: &str) -> GraphResult<()>;

    /// Create or update the page record and set its thumbnail. Returns the page record identifier.
    async fn record_page_thumbnail(&self, uuid: &str, page: u32, thumbnail: &str)
        -> GraphResult<String>;

    /// Create or update the page record and set its image. Returns the page record identifier.
    async fn record_page_image(&self, uuid: &str, page: u32, image: &str) -> GraphResult<String>;

    /// Copy the document thumbnail to directly linked records without one.
    /// Returns how many records were updated.
    async fn propagate_thumbnail(&self, uuid: &str) -> GraphResult<u64>;
}

/// `DocumentGraph` over a Cypher-speaking store
pub struct CypherGraph<S: GraphStore + ?Sized> {
    store: Arc<S>,
}

impl<S: GraphStore + ?Sized> CypherGraph<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn page_uuid(&self, uuid: &str, query: GraphQuery) -> GraphResult<String> {
        let rows = self.store.run(&query).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::NotFound(format!("document {}", uuid)))?;
        string_column(&row, "uuid")
    }
}

fn string_column(row: &GraphRow, column: &str) -> GraphResult<String> {
    match row.get(column) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(GraphError::UnexpectedResponse(format!(
            "column '{}' is not a string: {:?}",
            column, other
        ))),
    }
}

fn count_column(rows: &[GraphRow], column: &str) -> GraphResult<u64> {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(Value::as_u64)
        .ok_or_else(|| GraphError::UnexpectedResponse(format!("missing count column '{}'", column)))
}

#[async_trait]
impl<S: GraphStore + ?Sized> DocumentGraph for CypherGraph<S> {
    async fn set_document_thumbnail(&self, uuid: &str, thumbnail: &str) -> GraphResult<()> {
        let rows = self
            .store
            .run(&GraphQuery::set_document_thumbnail(uuid, thumbnail))
            .await?;

        if count_column(&rows, "matched")? == 0 {
            tracing::warn!(message_id = %uuid, "No document record matched; thumbnail not recorded");
        }
        Ok(())
    }

    async fn record_page_thumbnail(
        &self,
        uuid: &str,
        page: u32,
        thumbnail: &str,
    ) -> GraphResult<String> {
        let candidate = Uuid::new_v4().to_string();
        self.page_uuid(
            uuid,
            GraphQuery::record_page_thumbnail(uuid, page, &candidate, thumbnail),
        )
        .await
    }

    async fn record_page_image(&self, uuid: &str, page: u32, image: &str) -> GraphResult<String> {
        let candidate = Uuid::new_v4().to_string();
        self.page_uuid(uuid, GraphQuery::record_page_image(uuid, page, &candidate, image))
            .await
    }

    async fn propagate_thumbnail(&self, uuid: &str) -> GraphResult<u64> {
        let rows = self
            .store
            .run(&GraphQuery::propagate_thumbnail(uuid))
            .await?;
        count_column(&rows, "updated")
    }
}
