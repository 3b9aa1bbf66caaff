//! Cypher statements issued by the pipeline
//!
//! Every value is passed as a parameter; statements are constant strings.

use serde::Serialize;
use serde_json::{json, Map, Value};

const SET_DOCUMENT_THUMBNAIL: &str = "MATCH (f:Card {Uuid: $uuid}) \
     SET f.Thumbnail = $thumbnail \
     RETURN count(f) AS matched";

const RECORD_PAGE_THUMBNAIL: &str = "MATCH (f:Card {Uuid: $uuid}) \
     MERGE (f)-[:HAS_PAGE]->(p:Card:Page {PageNumber: $pageNumber}) \
     ON CREATE SET p.Uuid = $pageUuid \
     SET p.Thumbnail = $thumbnail \
     RETURN p.Uuid AS uuid";

const RECORD_PAGE_IMAGE: &str = "MATCH (f:Card {Uuid: $uuid}) \
     MERGE (f)-[:HAS_PAGE]->(p:Card:Page {PageNumber: $pageNumber}) \
     ON CREATE SET p.Uuid = $pageUuid \
     SET p.Image = $image \
     RETURN p.Uuid AS uuid";

const PROPAGATE_THUMBNAIL: &str = "MATCH (f:Card {Uuid: $uuid})-[]-(c:Card) \
     WHERE f.Thumbnail IS NOT NULL AND c.Thumbnail IS NULL AND NOT c:Page \
     WITH DISTINCT f, c \
     SET c.Thumbnail = f.Thumbnail \
     RETURN count(DISTINCT c) AS updated";

/// A parameterised Cypher statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQuery {
    pub statement: &'static str,
    pub parameters: Map<String, Value>,
}

impl GraphQuery {
    fn new(statement: &'static str, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            statement,
            parameters,
        }
    }

    pub fn set_document_thumbnail(uuid: &str, thumbnail: &str) -> Self {
        Self::new(
            SET_DOCUMENT_THUMBNAIL,
            json!({ "uuid": uuid, "thumbnail": thumbnail }),
        )
    }

    /// Merge the page record and set its thumbnail. `page_uuid` is only used when the page is created.
    pub fn record_page_thumbnail(uuid: &str, page: u32, page_uuid: &str, thumbnail: &str) -> Self {
        Self::new(
            RECORD_PAGE_THUMBNAIL,
            json!({
                "uuid": uuid,
                "pageNumber": page,
                "pageUuid": page_uuid,
                "thumbnail": thumbnail,
            }),
        )
    }

    pub fn record_page_image(uuid: &str, page: u32, page_uuid: &str, image: &str) -> Self {
        Self::new(
            RECORD_PAGE_IMAGE,
            json!({
                "uuid": uuid,
                "pageNumber": page,
                "pageUuid": page_uuid,
                "image": image,
            }),
        )
    }

    pub fn propagate_thumbnail(uuid: &str) -> Self {
        Self::new(PROPAGATE_THUMBNAIL, json!({ "uuid": uuid }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_thumbnail_is_parameterised() {
        let query = GraphQuery::set_document_thumbnail("d1", "miniofiles/file-artifacts/d1/thumbnail.png");
        assert!(query.statement.contains("SET f.Thumbnail = $thumbnail"));
        assert_eq!(query.parameters["uuid"], "d1");
        assert_eq!(
            query.parameters["thumbnail"],
            "miniofiles/file-artifacts/d1/thumbnail.png"
        );
    }

    #[test]
    fn page_queries_merge_on_page_number() {
        let query = GraphQuery::record_page_image("d1", 4, "p-new", "lib/img.png");
        assert!(query.statement.contains("MERGE (f)-[:HAS_PAGE]->(p:Card:Page {PageNumber: $pageNumber})"));
        assert!(query.statement.contains("ON CREATE SET p.Uuid = $pageUuid"));
        assert_eq!(query.parameters["pageNumber"], 4);
        assert_eq!(query.parameters["pageUuid"], "p-new");
    }

    #[test]
    fn propagation_never_overwrites() {
        let query = GraphQuery::propagate_thumbnail("d1");
        assert!(query.statement.contains("c.Thumbnail IS NULL"));
        assert!(query.statement.contains("NOT c:Page"));
        // A record linked by several relationships counts once.
        assert!(query.statement.contains("WITH DISTINCT f, c"));
        assert!(query.statement.contains("RETURN count(DISTINCT c) AS updated"));
    }
}
