//! Implements the `Store` trait using in-memory data.

use crate::model::{Identity, RecordType};
use crate::store::{
    check_field, compare_values, encode, Direction, Document, Fields, Query, Store, RECORDS,
};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// The uid of the identity that owns the demo data.
pub const DEMO_UID: &str = "demo-farmer";

/// An implementation of the `Store` trait that keeps every collection in memory. Clones share the
/// same data, so a clone can be handed to several tasks to act as one database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a season of sample records owned by `DEMO_UID`.
    pub fn with_demo_data() -> Result<Self> {
        let store = Self::new();
        {
            let mut collections = store.lock()?;
            let records = collections.entry(RECORDS.to_string()).or_default();
            for (ix, fields) in load_csv(DEMO_RECORDS)?.into_iter().enumerate() {
                records.push(Document::new(format!("demo-{:03}", ix + 1), fields));
            }
        }
        Ok(store)
    }

    /// The identity that owns the demo data.
    pub fn demo_identity() -> Identity {
        Identity {
            uid: DEMO_UID.to_string(),
            email: "demo@farmerledger.test".to_string(),
            display_name: Some("Demo Farmer".to_string()),
            photo_url: None,
        }
    }

    /// All documents in `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .lock()?
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .lock()
            .map_err(|_| anyhow!("The in-memory store lock is poisoned"))
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn query_scoped(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        for filter in &query.filters {
            check_field(&filter.field)?;
        }
        if let Some(order_by) = &query.order_by {
            check_field(&order_by.field)?;
        }

        let collections = self.lock()?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<Document> = docs
            .iter()
            .filter(|doc| {
                query.filters.iter().all(|f| match doc.get(&f.field) {
                    Some(v) => f.op.accepts(compare_values(v, &f.value)),
                    None => false,
                })
            })
            .filter(|doc| match &query.order_by {
                Some(order_by) => doc.get(&order_by.field).is_some(),
                None => true,
            })
            .cloned()
            .collect();
        drop(collections);

        if let Some(order_by) = &query.order_by {
            // sort_by is stable, so ties keep insertion order in both directions
            found.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order_by.field).unwrap_or(&Value::Null),
                    b.get(&order_by.field).unwrap_or(&Value::Null),
                );
                match order_by.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .lock()?
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == id))
            .cloned())
    }
}

/// Parses the demo CSV into record documents owned by `DEMO_UID`.
fn load_csv(csv_data: &str) -> Result<Vec<Fields>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read a demo record")?;
        let field = |ix: usize| record.get(ix).unwrap_or_default().trim();

        let record_type = RecordType::from_str(field(0))
            .map_err(|e| anyhow!("Bad demo record type '{}': {e}", field(0)))?;
        let date = NaiveDate::parse_from_str(field(3), "%Y-%m-%d")
            .with_context(|| format!("Bad demo record date '{}'", field(3)))?;
        let created_at = date.and_time(NaiveTime::MIN).and_utc();

        let mut fields = encode(&json!({
            "userId": DEMO_UID,
            "type": record_type,
            "amount": field(1),
            "category": field(2),
            "date": date,
            "createdAt": created_at,
        }))?;
        if !field(4).is_empty() {
            fields.insert("description".into(), Value::String(field(4).to_string()));
        }
        rows.push(fields);
    }
    Ok(rows)
}

/// Demo records.
const DEMO_RECORDS: &str = r##"type,amount,category,date,description
expense,3500,Seeds,2025-02-03,Maize seed for the long rains
expense,6200,Fertilizer,2025-02-10,DAP 2 bags
expense,1800,Labor,2025-02-14,Planting help
income,2400,Livestock Sales,2025-02-20,Two goats
expense,950,Feed,2025-03-01,
expense,4500,Equipment,2025-03-08,Knapsack sprayer
income,1200,Services,2025-03-15,Ploughing for neighbour
expense,2100,Labor,2025-04-02,Weeding
income,18500,Harvest Sales,2025-07-21,Maize 20 bags to the cooperative
income,3200,Harvest Sales,2025-07-30,Beans at the local market
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::store::Op;

    async fn store_with(docs: &[Value]) -> MemoryStore {
        let store = MemoryStore::new();
        for doc in docs {
            store.insert("things", encode(doc).unwrap()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store.insert("c", Fields::new()).await.unwrap();
        let b = store.insert("c", Fields::new()).await.unwrap();
        assert_ne!(a, b);
        assert!(store.get("c", &a).await.unwrap().is_some());
        assert!(store.get("c", "nope").await.unwrap().is_none());
        assert!(store.get("other", &a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_equals() {
        let store = store_with(&[
            json!({"title": "a", "n": 1}),
            json!({"title": "b", "n": 2}),
            json!({"title": "a", "n": 3}),
        ])
        .await;
        let found = store.query_equals("things", "title", json!("a")).await.unwrap();
        let ns: Vec<_> = found.iter().map(|d| d.get("n").cloned().unwrap()).collect();
        assert_eq!(ns, vec![json!(1), json!(3)]);
        assert!(store
            .query_equals("missing", "title", json!("a"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_query_scoped_order_and_limit() {
        let store = store_with(&[
            json!({"u": "x", "date": "2025-01-05", "n": 1}),
            json!({"u": "x", "date": "2025-01-09", "n": 2}),
            json!({"u": "y", "date": "2025-01-20", "n": 3}),
            json!({"u": "x", "date": "2025-01-05", "n": 4}),
            json!({"u": "x", "date": "2025-01-01", "n": 5}),
        ])
        .await;
        let query = Query::new()
            .filter("u", Op::Eq, "x")
            .order_by("date", Direction::Desc)
            .limit(3);
        let found = store.query_scoped("things", &query).await.unwrap();
        let ns: Vec<_> = found.iter().map(|d| d.get("n").cloned().unwrap()).collect();
        // ties keep insertion order
        assert_eq!(ns, vec![json!(2), json!(1), json!(4)]);
    }

    #[tokio::test]
    async fn test_query_scoped_range_filter() {
        let store = store_with(&[json!({"n": 1}), json!({"n": 5}), json!({"m": 9})]).await;
        let found = store
            .query_scoped("things", &Query::new().filter("n", Op::Gt, 2))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("n"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_query_rejects_bad_field_names() {
        let store = MemoryStore::new();
        let query = Query::new().order_by("a.b", Direction::Asc);
        assert!(store.query_scoped("things", &query).await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.insert("c", Fields::new()).await.unwrap();
        assert_eq!(store.documents("c").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_demo_data_decodes() {
        let store = MemoryStore::with_demo_data().unwrap();
        let docs = store
            .query_equals(RECORDS, "userId", json!(DEMO_UID))
            .await
            .unwrap();
        assert_eq!(docs.len(), 10);
        let records: Vec<Record> = docs.iter().map(|d| d.decode().unwrap()).collect();
        assert!(records.iter().all(|r| r.amount.is_positive()));
        assert_eq!(records[4].description, None);
    }
}
