//! SQLite document store: the external database backend.

use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};
use serde_json::Value;

use super::document::{ensure_id, Document, Filter};
use super::StoreError;

pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
    db_name: String,
}

impl SqliteStore {
    /// Open (or create) the database at `url`. Accepts a bare path, a
    /// `sqlite://` URL or `:memory:`.
    pub fn open(url: &str, db_name: &str) -> Result<Self, StoreError> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self {
            conn: Mutex::new(Some(conn)),
            db_name: db_name.to_string(),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS documents (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    db_name TEXT NOT NULL,
                    collection TEXT NOT NULL,
                    doc_id TEXT NOT NULL,
                    body TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_documents_collection
                 ON documents(db_name, collection, seq)",
                [],
            )?;
            Ok(())
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;
        f(conn)
    }

    pub fn insert_one(&self, collection: &str, mut doc: Document) -> Result<String, StoreError> {
        let id = ensure_id(&mut doc);
        let body = serde_json::to_string(&doc)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (db_name, collection, doc_id, body) VALUES (?1, ?2, ?3, ?4)",
                params![self.db_name, collection, id, body],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> Result<Vec<String>, StoreError> {
        let mut rows = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let id = ensure_id(&mut doc);
            rows.push((id, serde_json::to_string(&doc)?));
        }

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO documents (db_name, collection, doc_id, body) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (id, body) in &rows {
                    stmt.execute(params![self.db_name, collection, id, body])?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        Ok(rows.into_iter().map(|(id, _)| id).collect())
    }

    pub fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let bodies = self.scan(collection, filter)?;
        let mut docs = Vec::new();
        for body in bodies {
            if limit.is_some_and(|n| docs.len() >= n) {
                break;
            }
            let doc = parse_body(&body)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    pub fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, filter, Some(1))?.into_iter().next())
    }

    pub fn count_documents(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return self.with_conn(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE db_name = ?1 AND collection = ?2",
                    params![self.db_name, collection],
                    |r| r.get(0),
                )?;
                Ok(count as u64)
            });
        }
        Ok(self.find(collection, filter, None)?.len() as u64)
    }

    /// Drop the connection. Later operations fail with `StoreError::Closed`.
    pub fn close(&self) {
        if let Some(conn) = self.conn.lock().take() {
            if let Err((_, e)) = conn.close() {
                log::warn!("Error closing database connection: {}", e);
            }
        }
    }

    /// Fetch candidate bodies in insertion order, narrowing by the scalar
    /// fields of `filter` that SQLite can compare directly.
    fn scan(&self, collection: &str, filter: &Filter) -> Result<Vec<String>, StoreError> {
        let mut sql = String::from(
            "SELECT body FROM documents WHERE db_name = ?1 AND collection = ?2",
        );
        let mut values: Vec<SqlValue> = vec![
            SqlValue::Text(self.db_name.clone()),
            SqlValue::Text(collection.to_string()),
        ];

        for (field, value) in filter.fields() {
            let Some(bound) = pushdown_value(field, value) else {
                continue;
            };
            values.push(SqlValue::Text(format!("$.{}", field)));
            let path_idx = values.len();
            values.push(bound);
            sql.push_str(&format!(
                " AND json_extract(body, ?{}) = ?{}",
                path_idx,
                path_idx + 1
            ));
        }
        sql.push_str(" ORDER BY seq");

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let bodies = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(bodies)
        })
    }
}

/// SQL value for a filter field that can be pushed into the query, if any.
fn pushdown_value(field: &str, value: &Value) -> Option<SqlValue> {
    let simple_field = !field.is_empty()
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !simple_field {
        return None;
    }
    match value {
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        _ => None,
    }
}

fn parse_body(body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument(
            "stored body is not a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn open() -> SqliteStore {
        SqliteStore::open(":memory:", "coffee_test").unwrap()
    }

    #[test]
    fn test_insert_and_find_in_order() {
        let store = open();
        store.insert_one("menu", doc(json!({"id": "a", "price": 4.5}))).unwrap();
        let ids = store
            .insert_many(
                "menu",
                vec![doc(json!({"id": "b", "price": 4})), doc(json!({"price": 5}))],
            )
            .unwrap();
        assert_eq!(ids[0], "b");
        assert_eq!(ids.len(), 2);

        let all = store.find("menu", &Filter::all(), None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0]["id"], "a");
        assert_eq!(all[2]["id"], ids[1].as_str());
    }

    #[test]
    fn test_filter_pushdown_matches_bools_and_numbers() {
        let store = open();
        store
            .insert_one("menu", doc(json!({"id": "1", "available": true, "price": 4.0})))
            .unwrap();
        store
            .insert_one("menu", doc(json!({"id": "2", "available": false, "price": 4.0})))
            .unwrap();
        store
            .insert_one("menu", doc(json!({"id": "3", "available": true, "price": 5.0})))
            .unwrap();

        let available = store
            .find("menu", &Filter::all().eq("available", true), None)
            .unwrap();
        assert_eq!(available.len(), 2);

        let cheap = store
            .find("menu", &Filter::all().eq("available", true).eq("price", 4), None)
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0]["id"], "1");
    }

    #[test]
    fn test_absent_field_does_not_match() {
        let store = open();
        store.insert_one("menu", doc(json!({"id": "1"}))).unwrap();
        assert!(store
            .find_one("menu", &Filter::all().eq("available", true))
            .unwrap()
            .is_none());
        assert!(store
            .find_one("menu", &Filter::all().eq("available", Value::Null))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_collections_and_databases_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coffee.db");
        let path = path.to_str().unwrap();

        let shop = SqliteStore::open(path, "shop").unwrap();
        let other = SqliteStore::open(path, "other").unwrap();
        shop.insert_one("orders", doc(json!({"id": "o1"}))).unwrap();
        shop.insert_one("menu", doc(json!({"id": "m1"}))).unwrap();

        assert_eq!(shop.count_documents("orders", &Filter::all()).unwrap(), 1);
        assert_eq!(other.count_documents("orders", &Filter::all()).unwrap(), 0);
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coffee.db");
        let url = format!("sqlite://{}", path.display());

        let store = SqliteStore::open(&url, "shop").unwrap();
        store.insert_one("orders", doc(json!({"id": "o1", "quantity": 2}))).unwrap();
        store.close();

        let reopened = SqliteStore::open(&url, "shop").unwrap();
        let order = reopened
            .find_one("orders", &Filter::all().eq("id", "o1"))
            .unwrap()
            .unwrap();
        assert_eq!(order["quantity"], 2);
    }

    #[test]
    fn test_closed_store_errors() {
        let store = open();
        store.close();
        assert!(matches!(
            store.insert_one("menu", Document::new()),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_count_with_filter_and_limit() {
        let store = open();
        for i in 0..4 {
            let name = if i < 3 { "a" } else { "b" };
            store
                .insert_one("status_checks", doc(json!({"client_name": name})))
                .unwrap();
        }
        assert_eq!(
            store
                .count_documents("status_checks", &Filter::all().eq("client_name", "a"))
                .unwrap(),
            3
        );
        assert_eq!(
            store
                .find("status_checks", &Filter::all(), Some(2))
                .unwrap()
                .len(),
            2
        );
    }
}
