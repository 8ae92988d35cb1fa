//! Derives the home screen figures from a user's records.

use crate::model::{Record, Summary};
use crate::store::{Direction, Document, Op, Query, Store, RECORDS};
use crate::Result;
use anyhow::Context;
use tracing::debug;

/// How many records the home screen shows when nothing else is configured.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Loads the most recent `recent_limit` records of `user_id` along with income and expense totals
/// over all of the user's records.
///
/// The two reads are issued concurrently and are not a consistent snapshot of each other: the
/// totals come only from the full read, the recent list only from the limited one.
pub async fn load_summary(store: &dyn Store, user_id: &str, recent_limit: usize) -> Result<Summary> {
    let recent_query = Query::new()
        .filter("userId", Op::Eq, user_id)
        .order_by("date", Direction::Desc)
        .limit(recent_limit);
    let all_query = Query::new().filter("userId", Op::Eq, user_id);

    let (recent, all) = tokio::try_join!(
        store.query_scoped(RECORDS, &recent_query),
        store.query_scoped(RECORDS, &all_query),
    )?;

    let recent = decode_records(&recent)?;
    let all = decode_records(&all)?;
    debug!(
        "Loaded {} recent and {} total records for {user_id}",
        recent.len(),
        all.len()
    );
    Summary::from_records(recent, &all)
}

pub(crate) fn decode_records(docs: &[Document]) -> Result<Vec<Record>> {
    docs.iter()
        .map(|doc| doc.decode::<Record>())
        .collect::<Result<Vec<_>>>()
        .context("Unable to read records from the store")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, RecordDraft, RecordType, MAX_AMOUNT};
    use crate::records::add_record;
    use crate::store::MemoryStore;
    use crate::test::{insert_record, record};
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_totals_and_net_balance() {
        let store = MemoryStore::new();
        for r in [
            record("u1", RecordType::Income, "500", "2025-03-01"),
            record("u1", RecordType::Expense, "200", "2025-03-02"),
            record("u1", RecordType::Income, "300", "2025-03-03"),
            record("someone-else", RecordType::Income, "9999", "2025-03-04"),
        ] {
            insert_record(&store, r).await;
        }

        let summary = load_summary(&store, "u1", DEFAULT_RECENT_LIMIT).await.unwrap();
        assert_eq!(summary.total_income, amount("800"));
        assert_eq!(summary.total_expense, amount("200"));
        assert_eq!(summary.net_balance(), amount("600"));
        assert_eq!(summary.recent.len(), 3);
        assert!(summary.recent.iter().all(|r| r.user_id == "u1"));
    }

    #[tokio::test]
    async fn test_empty() {
        let store = MemoryStore::new();
        let summary = load_summary(&store, "nobody", DEFAULT_RECENT_LIMIT)
            .await
            .unwrap();
        assert!(summary.recent.is_empty());
        assert!(summary.total_income.is_zero());
        assert!(summary.total_expense.is_zero());
        assert!(summary.net_balance().is_zero());
    }

    #[tokio::test]
    async fn test_recent_is_limited_and_newest_first() {
        let store = MemoryStore::new();
        for day in 1..=8 {
            let date = format!("2025-05-{day:02}");
            insert_record(&store, record("u1", RecordType::Expense, "10", &date)).await;
        }

        let summary = load_summary(&store, "u1", DEFAULT_RECENT_LIMIT).await.unwrap();
        let dates: Vec<String> = summary.recent.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2025-05-08", "2025-05-07", "2025-05-06", "2025-05-05", "2025-05-04"]
        );
        // totals cover all eight, not only the recent window
        assert_eq!(summary.total_expense, amount("80"));
    }

    #[tokio::test]
    async fn test_negative_net_balance() {
        let store = MemoryStore::new();
        insert_record(&store, record("u1", RecordType::Income, "100.50", "2025-01-01")).await;
        insert_record(&store, record("u1", RecordType::Expense, "250", "2025-01-02")).await;
        let summary = load_summary(&store, "u1", 1).await.unwrap();
        assert_eq!(summary.recent.len(), 1);
        assert_eq!(summary.net_balance(), amount("-149.50"));
    }

    #[tokio::test]
    async fn test_overflowing_totals_are_an_error() {
        let store = MemoryStore::new();
        let huge = "79228162514264337593543950335";
        insert_record(&store, record("u1", RecordType::Income, huge, "2025-01-01")).await;
        insert_record(&store, record("u1", RecordType::Income, huge, "2025-01-02")).await;

        let err = load_summary(&store, "u1", DEFAULT_RECENT_LIMIT)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The income total is too large to compute");
    }

    #[tokio::test]
    async fn test_oversized_amounts_never_reach_the_totals() {
        let store = MemoryStore::new();
        for _ in 0..2 {
            let draft = RecordDraft {
                record_type: RecordType::Income,
                amount: "79228162514264337593543950335".into(),
                category: "Harvest Sales".into(),
                ..Default::default()
            };
            assert!(add_record(&store, "u1", draft).await.is_err());
        }
        let draft = RecordDraft {
            record_type: RecordType::Income,
            amount: "1,000,000,000".into(),
            category: "Harvest Sales".into(),
            ..Default::default()
        };
        add_record(&store, "u1", draft).await.unwrap();

        let summary = load_summary(&store, "u1", DEFAULT_RECENT_LIMIT).await.unwrap();
        assert_eq!(summary.total_income, MAX_AMOUNT);
        assert_eq!(summary.net_balance(), MAX_AMOUNT);
    }
}
