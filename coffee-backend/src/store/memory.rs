//! In-process fallback store: named collections held as insertion-ordered lists.
//!
//! Used when no external database is configured or reachable. Nothing here
//! survives a restart.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::document::{ensure_id, Document, Filter};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_one(&self, collection: &str, mut doc: Document) -> String {
        let id = ensure_id(&mut doc);
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        id
    }

    pub fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Vec<String> {
        let mut collections = self.collections.write();
        let list = collections.entry(collection.to_string()).or_default();
        docs.into_iter()
            .map(|mut doc| {
                let id = ensure_id(&mut doc);
                list.push(doc);
                id
            })
            .collect()
    }

    pub fn find(&self, collection: &str, filter: &Filter, limit: Option<usize>) -> Vec<Document> {
        let collections = self.collections.read();
        let Some(list) = collections.get(collection) else {
            return Vec::new();
        };
        list.iter()
            .filter(|doc| filter.matches(doc))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn find_one(&self, collection: &str, filter: &Filter) -> Option<Document> {
        self.collections
            .read()
            .get(collection)
            .and_then(|list| list.iter().find(|doc| filter.matches(doc)).cloned())
    }

    pub fn count_documents(&self, collection: &str, filter: &Filter) -> u64 {
        let collections = self.collections.read();
        match collections.get(collection) {
            Some(list) if filter.is_empty() => list.len() as u64,
            Some(list) => list.iter().filter(|doc| filter.matches(doc)).count() as u64,
            None => 0,
        }
    }
}
