//! The document store that holds records and lessons.
//!
//! The rest of the program talks to the store only through the `Store` trait: insert a document,
//! query by equality, query with filters, ordering and a limit, and fetch by id. There are two
//! implementations:
//! - `SqliteStore` keeps JSON documents in a SQLite file in the ledger home directory.
//! - `MemoryStore` keeps documents in memory. It is compiled into the production binary so that
//!   the whole app can be run, top-to-bottom, without touching the disk.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{Config, Result};
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// The collection holding income and expense records.
pub const RECORDS: &str = "records";

/// The collection holding lessons.
pub const MODULES: &str = "modules";

/// The environment variable that switches the app to the in-memory store.
const TEST_MODE_ENV: &str = "LEDGER_IN_TEST_MODE";

/// The fields of a document, without its id.
pub type Fields = serde_json::Map<String, Value>;

/// A stored document: a store-assigned id and a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the value of `field`, or `None` if the document does not have it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserializes the document into `T`. The document id is made available to `T` as an `id`
    /// field.
    pub fn decode<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .with_context(|| format!("Unable to decode document '{}'", self.id))
    }
}

/// Serializes `value` into document fields. `value` must serialize to a JSON object.
pub fn encode<T>(value: &T) -> Result<Fields>
where
    T: Serialize,
{
    match serde_json::to_value(value).context("Unable to serialize document")? {
        Value::Object(fields) => Ok(fields),
        other => bail!("A document must be a JSON object, got {other}"),
    }
}

/// Comparison operators usable in a `Filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    /// The SQL spelling of the operator.
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }

    /// Whether `ordering`, the result of comparing a field value to the filter value, passes.
    pub(crate) fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

/// A single `(field, op, value)` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Filters, ordering and limit for `Store::query_scoped`.
///
/// Documents that compare equal under `order_by` keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The operations the ledger needs from a document database.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Appends a new document to `collection` and returns its store-assigned id.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Returns every document in `collection` for which `field` equals `value`.
    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>> {
        self.query_scoped(collection, &Query::new().filter(field, Op::Eq, value))
            .await
    }

    /// Returns the documents in `collection` that pass all of the query's filters, ordered and
    /// truncated as requested.
    async fn query_scoped(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;

    /// Returns the document with `id`, if there is one.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;
}

/// Whether we are using the on-disk store or the in-memory one.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    /// `Mode::Test` when `LEDGER_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Live`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// Opens the store for `mode`.
pub async fn open(config: &Config, mode: Mode) -> Result<Arc<dyn Store>> {
    debug!("Opening the {mode:?} store");
    Ok(match mode {
        Mode::Live => Arc::new(SqliteStore::load(config.store_path()).await?),
        Mode::Test => Arc::new(MemoryStore::with_demo_data()?),
    })
}

/// Checks that `field` is a plain identifier so that it can be placed into a JSON path.
pub(crate) fn check_field(field: &str) -> Result<()> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !ok {
        bail!("'{field}' is not a valid field name");
    }
    Ok(())
}

/// A total order over JSON values used for filtering and sorting: null, then booleans, then
/// numbers, then strings, then everything else. Values of the same kind compare naturally.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
