//! Lists, filters and adds a user's income and expense records.

use crate::model::{Record, RecordDraft, RecordFilter};
use crate::store::{encode, Direction, Op, Query, Store, RECORDS};
use crate::summary::decode_records;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info};

/// Every record of `user_id`, newest date first. Records sharing a date stay in the order they
/// were added.
pub async fn load_records(store: &dyn Store, user_id: &str) -> Result<Vec<Record>> {
    let query = Query::new()
        .filter("userId", Op::Eq, user_id)
        .order_by("date", Direction::Desc);
    let docs = store.query_scoped(RECORDS, &query).await?;
    debug!("Loaded {} records for {user_id}", docs.len());
    decode_records(&docs)
}

/// The records that pass `filter`, in their original order.
pub fn apply_filter(records: &[Record], filter: RecordFilter) -> Vec<Record> {
    records
        .iter()
        .filter(|r| filter.matches(r.record_type))
        .cloned()
        .collect()
}

/// Validates `draft` and writes it as a record owned by `user_id`, dated today if it has no date.
///
/// A draft that fails validation never reaches the store; the error is a `ValidationError`.
pub async fn add_record(store: &dyn Store, user_id: &str, draft: RecordDraft) -> Result<Record> {
    add_record_at(store, user_id, draft, Local::now().date_naive(), Utc::now()).await
}

pub(crate) async fn add_record_at(
    store: &dyn Store,
    user_id: &str,
    draft: RecordDraft,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Record> {
    let new_record = draft.validate(user_id, today, now)?;
    let id = store
        .insert(RECORDS, encode(&new_record)?)
        .await
        .context("Unable to save the record")?;
    info!(
        "Added {} of {} in {}",
        new_record.record_type, new_record.amount, new_record.category
    );
    Ok(new_record.into_record(id))
}
