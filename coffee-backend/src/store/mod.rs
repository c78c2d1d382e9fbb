//! Collection storage behind one interface.
//!
//! The backend is chosen once at startup: the SQLite database when it is
//! configured and opens, the in-memory store otherwise. Handlers only ever see
//! `Collection` and `Cursor`.

pub mod document;
pub mod memory;
pub mod sqlite;

use std::fmt;

pub use document::{from_document, to_document, Document, Filter};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::Config;

pub const MENU: &str = "menu";
pub const ORDERS: &str = "orders";
pub const STATUS_CHECKS: &str = "status_checks";

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serialization(serde_json::Error),
    InvalidDocument(String),
    Closed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "Database error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::InvalidDocument(msg) => write!(f, "Invalid document: {}", msg),
            StoreError::Closed => write!(f, "Database connection is closed"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e)
    }
}

pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    /// Pick the backend from configuration. Falls back to memory with a
    /// warning when the database is not configured or fails to open.
    pub fn connect(config: &Config) -> Self {
        let (Some(url), Some(db_name)) = (&config.database_url, &config.db_name) else {
            log::warn!("DATABASE_URL/DB_NAME not set, using in-memory storage");
            return Store::Memory(MemoryStore::new());
        };

        match SqliteStore::open(url, db_name) {
            Ok(store) => {
                log::info!("Using SQLite database '{}' at {}", db_name, url);
                Store::Sqlite(store)
            }
            Err(e) => {
                log::warn!("Database not available: {}, using in-memory storage", e);
                Store::Memory(MemoryStore::new())
            }
        }
    }

    pub fn in_memory() -> Self {
        Store::Memory(MemoryStore::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }

    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection {
            store: self,
            name: name.to_string(),
        }
    }

    /// Release the database connection, if one was opened.
    pub fn close(&self) {
        if let Store::Sqlite(db) = self {
            db.close();
            log::info!("Database connection closed");
        }
    }
}

/// Handle on one named collection.
#[derive(Clone)]
pub struct Collection<'a> {
    store: &'a Store,
    name: String,
}

impl<'a> Collection<'a> {
    pub fn insert_one(&self, doc: Document) -> Result<String, StoreError> {
        match self.store {
            Store::Memory(m) => Ok(m.insert_one(&self.name, doc)),
            Store::Sqlite(s) => s.insert_one(&self.name, doc),
        }
    }

    pub fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<String>, StoreError> {
        match self.store {
            Store::Memory(m) => Ok(m.insert_many(&self.name, docs)),
            Store::Sqlite(s) => s.insert_many(&self.name, docs),
        }
    }

    /// Lazy: nothing is read until `Cursor::to_list`.
    pub fn find(&self, filter: Filter) -> Cursor<'a> {
        Cursor {
            collection: self.clone(),
            filter,
        }
    }

    pub fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        match self.store {
            Store::Memory(m) => Ok(m.find_one(&self.name, filter)),
            Store::Sqlite(s) => s.find_one(&self.name, filter),
        }
    }

    pub fn count_documents(&self, filter: &Filter) -> Result<u64, StoreError> {
        match self.store {
            Store::Memory(m) => Ok(m.count_documents(&self.name, filter)),
            Store::Sqlite(s) => s.count_documents(&self.name, filter),
        }
    }
}

pub struct Cursor<'a> {
    collection: Collection<'a>,
    filter: Filter,
}

impl Cursor<'_> {
    /// Collect matches in insertion order, truncated to `limit` when given.
    pub fn to_list(self, limit: Option<usize>) -> Result<Vec<Document>, StoreError> {
        let Cursor { collection, filter } = self;
        match collection.store {
            Store::Memory(m) => Ok(m.find(&collection.name, &filter, limit)),
            Store::Sqlite(s) => s.find(&collection.name, &filter, limit),
        }
    }
}
