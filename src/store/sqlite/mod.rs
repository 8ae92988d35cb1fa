//! Implements the `Store` trait with JSON documents kept in a SQLite file.
//!
//! Every document is one row of the `documents` table: the collection name, the store-assigned
//! id, and the document body as JSON text. Filters and ordering are evaluated by SQLite with
//! `json_extract`, so only the matching documents are read back.

mod migrations;

use crate::store::{check_field, Direction, Document, Fields, Query, Store};
use crate::Result;
use anyhow::{bail, Context};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::query::Query as SqlQuery;
use sqlx::{Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

const MAX_CONNECTIONS: u32 = 4;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path` with the current schema
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A store already exists at '{}'", path.display());
        }
        let store = Self::connect(path, true).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Brings its schema up to date
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!(
                "The store is missing at '{}', run 'ledger init' first",
                path.display()
            );
        }
        let store = Self::connect(path, false).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .context("Failed to parse SQLite connection string")?
            .create_if_missing(create);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open the store at '{}'", path.display()))?;
        debug!("Opened store at {}", path.display());
        Ok(Self { pool })
    }

    async fn migrate(&self) -> Result<()> {
        migrations::bootstrap(&self.pool).await?;
        let current = migrations::version(&self.pool).await?;
        migrations::run(&self.pool, current, migrations::CURRENT_VERSION).await
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(&fields).context("Unable to serialize document")?;
        sqlx::query("INSERT INTO documents (id, collection, body) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(collection)
            .bind(body)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert into '{collection}'"))?;
        trace!("Inserted {id} into {collection}");
        Ok(id)
    }

    async fn query_scoped(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let sql = select_sql(query)?;
        trace!("{sql}");

        let mut q = sqlx::query(&sql).bind(collection);
        for filter in &query.filters {
            q = bind_value(q, &filter.value);
        }
        if let Some(limit) = query.limit {
            q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query '{collection}'"))?;
        rows.iter().map(to_document).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read '{id}' from '{collection}'"))?;
        row.as_ref().map(to_document).transpose()
    }
}

/// Builds the SELECT for `query`. Binds, in order: the collection, one value per filter, then
/// the limit if there is one.
fn select_sql(query: &Query) -> Result<String> {
    let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
    for filter in &query.filters {
        check_field(&filter.field)?;
        sql.push_str(&format!(
            " AND json_extract(body, '$.{}') {} ?",
            filter.field,
            filter.op.sql()
        ));
    }

    let mut order = String::from(" ORDER BY ");
    if let Some(order_by) = &query.order_by {
        check_field(&order_by.field)?;
        let direction = match order_by.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        // Documents without the ordering field are left out of ordered queries
        sql.push_str(&format!(
            " AND json_type(body, '$.{}') IS NOT NULL",
            order_by.field
        ));
        order.push_str(&format!(
            "json_extract(body, '$.{}') {direction}, ",
            order_by.field
        ));
    }
    order.push_str("seq ASC");
    sql.push_str(&order);

    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }
    Ok(sql)
}

fn bind_value<'q>(
    q: SqlQuery<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> SqlQuery<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => q.bind(Option::<String>::None),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => q.bind(i),
            None => q.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => q.bind(s.clone()),
        other => q.bind(other.to_string()),
    }
}

fn to_document(row: &SqliteRow) -> Result<Document> {
    let id: String = row.try_get("id").context("Document row has no id")?;
    let body: String = row.try_get("body").context("Document row has no body")?;
    match serde_json::from_str(&body)
        .with_context(|| format!("Document '{id}' is not valid JSON"))?
    {
        Value::Object(fields) => Ok(Document::new(id, fields)),
        _ => bail!("Document '{id}' is not a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{encode, Op};
    use serde_json::json;
    use tempfile::TempDir;

    async fn new_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::init(dir.path().join("ledger.sqlite"))
            .await
            .unwrap();
        (dir, store)
    }

    async fn insert_all(store: &SqliteStore, docs: &[Value]) {
        for doc in docs {
            store.insert("things", encode(doc).unwrap()).await.unwrap();
        }
    }

    fn ns(docs: &[Document]) -> Vec<Value> {
        docs.iter().map(|d| d.get("n").cloned().unwrap()).collect()
    }

    #[test]
    fn test_select_sql() {
        let query = Query::new()
            .filter("userId", Op::Eq, "u")
            .order_by("date", Direction::Desc)
            .limit(5);
        assert_eq!(
            select_sql(&query).unwrap(),
            "SELECT id, body FROM documents WHERE collection = ? \
             AND json_extract(body, '$.userId') = ? \
             AND json_type(body, '$.date') IS NOT NULL \
             ORDER BY json_extract(body, '$.date') DESC, seq ASC LIMIT ?"
        );
        assert_eq!(
            select_sql(&Query::new()).unwrap(),
            "SELECT id, body FROM documents WHERE collection = ? ORDER BY seq ASC"
        );
    }

    #[test]
    fn test_select_sql_rejects_injection() {
        let query = Query::new().filter("x') = 1 OR ('", Op::Eq, 1);
        assert!(select_sql(&query).is_err());
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.sqlite");
        SqliteStore::init(&path).await.unwrap();
        assert!(SqliteStore::init(&path).await.is_err());
        assert!(SqliteStore::load(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_requires_file() {
        let dir = TempDir::new().unwrap();
        assert!(SqliteStore::load(dir.path().join("nope.sqlite")).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_dir, store) = new_store().await;
        let id = store
            .insert("things", encode(&json!({"title": "a", "n": 1})).unwrap())
            .await
            .unwrap();
        let doc = store.get("things", &id).await.unwrap().unwrap();
        assert_eq!(doc.id(), id);
        assert_eq!(doc.get("title"), Some(&json!("a")));
        assert!(store.get("others", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_equals() {
        let (_dir, store) = new_store().await;
        insert_all(
            &store,
            &[
                json!({"title": "a", "n": 1}),
                json!({"title": "b", "n": 2}),
                json!({"title": "a", "n": 3}),
            ],
        )
        .await;
        let found = store
            .query_equals("things", "title", json!("a"))
            .await
            .unwrap();
        assert_eq!(ns(&found), vec![json!(1), json!(3)]);
    }

    #[tokio::test]
    async fn test_query_scoped_order_and_limit() {
        let (_dir, store) = new_store().await;
        insert_all(
            &store,
            &[
                json!({"u": "x", "date": "2025-01-05", "n": 1}),
                json!({"u": "x", "date": "2025-01-09", "n": 2}),
                json!({"u": "y", "date": "2025-01-20", "n": 3}),
                json!({"u": "x", "date": "2025-01-05", "n": 4}),
                json!({"u": "x", "n": 5}),
            ],
        )
        .await;
        let query = Query::new()
            .filter("u", Op::Eq, "x")
            .order_by("date", Direction::Desc);
        let found = store.query_scoped("things", &query).await.unwrap();
        assert_eq!(ns(&found), vec![json!(2), json!(1), json!(4)]);

        let found = store
            .query_scoped("things", &query.clone().limit(1))
            .await
            .unwrap();
        assert_eq!(ns(&found), vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_query_numeric_order() {
        let (_dir, store) = new_store().await;
        insert_all(
            &store,
            &[json!({"n": 10}), json!({"n": 2}), json!({"n": 1})],
        )
        .await;
        let found = store
            .query_scoped("things", &Query::new().order_by("n", Direction::Asc))
            .await
            .unwrap();
        assert_eq!(ns(&found), vec![json!(1), json!(2), json!(10)]);
    }
}
