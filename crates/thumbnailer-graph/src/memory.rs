//! In-process document graph
//!
//! Used when no graph database is configured, and by tests. Follows the same
//! rules as the Cypher statements: pages are created once per (document,
//! page number), and propagation only fills records that have no thumbnail.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};
use crate::recorder::DocumentGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRecord {
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub page: Option<u32>,
}

#[derive(Default)]
struct State {
    records: HashMap<String, MemoryRecord>,
    /// (document, page number) -> page record id
    pages: HashMap<(String, u32), String>,
    links: HashMap<String, HashSet<String>>,
}

impl State {
    fn page_record(&mut self, uuid: &str, page: u32) -> GraphResult<&mut MemoryRecord> {
        if !self.records.contains_key(uuid) {
            return Err(GraphError::NotFound(format!("document {}", uuid)));
        }

        let page_id = self
            .pages
            .entry((uuid.to_string(), page))
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        Ok(self.records.entry(page_id).or_insert_with(|| MemoryRecord {
            page: Some(page),
            ..MemoryRecord::default()
        }))
    }

    fn page_id(&self, uuid: &str, page: u32) -> Option<String> {
        self.pages.get(&(uuid.to_string(), page)).cloned()
    }
}

#[derive(Default)]
pub struct MemoryGraph {
    state: Mutex<State>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&self, uuid: &str, thumbnail: Option<&str>) {
        let mut state = self.lock();
        state.records.insert(
            uuid.to_string(),
            MemoryRecord {
                thumbnail: thumbnail.map(str::to_string),
                ..MemoryRecord::default()
            },
        );
    }

    /// Link two records in both directions
    pub fn link(&self, a: &str, b: &str) {
        let mut state = self.lock();
        state.links.entry(a.to_string()).or_default().insert(b.to_string());
        state.links.entry(b.to_string()).or_default().insert(a.to_string());
    }

    pub fn record(&self, uuid: &str) -> Option<MemoryRecord> {
        self.lock().records.get(uuid).cloned()
    }

    pub fn thumbnail(&self, uuid: &str) -> Option<String> {
        self.record(uuid).and_then(|record| record.thumbnail)
    }

    pub fn page(&self, uuid: &str, page: u32) -> Option<(String, MemoryRecord)> {
        let state = self.lock();
        let id = state.page_id(uuid, page)?;
        let record = state.records.get(&id)?.clone();
        Some((id, record))
    }

    pub fn page_count(&self, uuid: &str) -> usize {
        self.lock().pages.keys().filter(|(doc, _)| doc == uuid).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentGraph for MemoryGraph {
    async fn set_document_thumbnail(&self, uuid: &str, thumbnail: &str) -> GraphResult<()> {
        let mut state = self.lock();
        match state.records.get_mut(uuid) {
            Some(record) => record.thumbnail = Some(thumbnail.to_string()),
            None => {
                tracing::warn!(message_id = %uuid, "No document record matched; thumbnail not recorded")
            }
        }
        Ok(())
    }

    async fn record_page_thumbnail(
        &self,
        uuid: &str,
        page: u32,
        thumbnail: &str,
    ) -> GraphResult<String> {
        let mut state = self.lock();
        state.page_record(uuid, page)?.thumbnail = Some(thumbnail.to_string());
        state
            .page_id(uuid, page)
            .ok_or_else(|| GraphError::NotFound(format!("page {} of {}", page, uuid)))
    }

    async fn record_page_image(&self, uuid: &str, page: u32, image: &str) -> GraphResult<String> {
        let mut state = self.lock();
        state.page_record(uuid, page)?.image = Some(image.to_string());
        state
            .page_id(uuid, page)
            .ok_or_else(|| GraphError::NotFound(format!("page {} of {}", page, uuid)))
    }

    async fn propagate_thumbnail(&self, uuid: &str) -> GraphResult<u64> {
        let mut state = self.lock();
        let Some(thumbnail) = state.records.get(uuid).and_then(|r| r.thumbnail.clone()) else {
            return Ok(0);
        };

        let linked: Vec<String> = state
            .links
            .get(uuid)
            .map(|links| links.iter().cloned().collect())
            .unwrap_or_default();

        let mut updated = 0;
        for id in linked {
            if let Some(record) = state.records.get_mut(&id) {
                if record.page.is_none() && record.thumbnail.is_none() {
                    record.thumbnail = Some(thumbnail.clone());
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }
}
