//! Provisions the catalog of lessons into the `modules` collection.
//!
//! Seeding is a check-then-insert per lesson, keyed by title. Two independent callers that
//! interleave between the check and the insert can both insert the same lesson. Callers that
//! share a `Seeder` are serialized and cannot.

use crate::model::NewModule;
use crate::store::{encode, Store, MODULES};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// What a seeding pass did with each catalog title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Makes sure every lesson in the catalog exists in `store`, inserting the missing ones.
///
/// A failure on one lesson is logged and the remaining lessons are still attempted. Nothing is
/// reported to the caller.
pub async fn ensure_seeded(store: &dyn Store) {
    let _ = seed(store).await;
}

/// Like `ensure_seeded`, but reports what happened to each title.
pub async fn seed(store: &dyn Store) -> SeedReport {
    let mut report = SeedReport::default();
    for module in CATALOG {
        let title = module.title.to_string();
        match seed_one(store, module).await {
            Ok(true) => {
                info!("Added module: {title}");
                report.added.push(title);
            }
            Ok(false) => {
                debug!("Skipped existing module: {title}");
                report.skipped.push(title);
            }
            Err(e) => {
                error!("Unable to seed module '{title}': {e:#}");
                report.failed.push(title);
            }
        }
    }
    report
}

/// Inserts `module` unless a module with the same title exists. Returns whether it was inserted.
async fn seed_one(store: &dyn Store, module: &NewModule) -> Result<bool> {
    let existing = store
        .query_equals(MODULES, "title", Value::from(module.title))
        .await?;
    if !existing.is_empty() {
        return Ok(false);
    }
    store.insert(MODULES, encode(module)?).await?;
    Ok(true)
}

/// Runs seeding through a single lock. Clones share the lock, so at most one seeding pass runs at
/// a time across all of them.
#[derive(Debug, Clone, Default)]
pub struct Seeder {
    lock: Arc<Mutex<()>>,
}

impl Seeder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ensure_seeded(&self, store: &dyn Store) {
        let _ = self.seed(store).await;
    }

    pub async fn seed(&self, store: &dyn Store) -> SeedReport {
        let _guard = self.lock.lock().await;
        seed(store).await
    }
}

/// The number of lessons in the catalog.
pub const CATALOG_LEN: usize = CATALOG.len();

/// The lessons every ledger starts with.
pub const CATALOG: &[NewModule] = &[
    NewModule {
        title: "Understanding Farm Budgeting",
        description: "Learn the basics of creating a budget for your farm to track expenses and \
            income effectively.",
        content: r#"
            ## Why Budgeting Matters
            A budget helps you plan ahead. It tells you if you have enough money to buy seeds, fertilizer, and pay for labor.

            ## Key Components
            1. **Income**: Money you expect to get from selling crops, milk, or eggs.
            2. **Expenses**: Money you spend on inputs like seeds, feed, and labor.
            3. **Profit**: Income minus Expenses.

            ## Implementation
            Start by writing down all your expected expenses for the season. Then estimate your income. Check if Income > Expenses.
        "#,
        order: 1,
    },
    NewModule {
        title: "Savings Strategies",
        description: "Discover simple ways to save money for emergencies and future investments.",
        content: r#"
            ## The Power of Saving
            Saving even a small amount regularly can build up to a large sum over time.

            ## Tips
            - **Save after harvest**: When you sell your produce, set aside a portion immediately.
            - **Use a group**: Join a savings group or cooperative.
            - **Cut unnecessary costs**: Review your expenses records to see where you can save.
        "#,
        order: 2,
    },
    NewModule {
        title: "Credit Management",
        description: "How to use loans wisely to grow your farm without getting into debt traps.",
        content: r#"
            ## Good Debt vs. Bad Debt
            - **Good Debt**: Used to buy things that make more money (e.g., better seeds, a water pump).
            - **Bad Debt**: Used for consumption or things that don't generate income.

            ## Before Borrowing
            1. Can you pay it back?
            2. What is the interest rate?
            3. What happens if crops fail?
        "#,
        order: 3,
    },
    NewModule {
        title: "Market Access",
        description: "Strategies to get the best price for your produce and reach more buyers.",
        content: r#"
            ## Understanding the Market
            - **Know your customer**: Who buys your produce? (Neighbors, local market, aggregators)
            - **Timing**: Can you sell when prices are high?

            ## Value Addition
            - Cleaning, sorting, and packaging your produce can fetch a higher price.
            - Processing (e.g., making jam from fruits) increases shelf life and value.

            ## Collective Marketing
            - Selling together with other farmers gives you bargaining power.
        "#,
        order: 4,
    },
    NewModule {
        title: "Risk Mitigation Strategies",
        description: "Protect your farm from unpredictable events like drought, pests, or price \
            drops.",
        content: r#"
            ## Types of Risk
            - **Weather**: Drought, floods, hail.
            - **Pests & Diseases**: Crop failure.
            - **Market**: Price fluctuations.

            ## Mitigation Strategies
            - **Diversification**: Plant different crops or keep livestock. If one fails, others may survive.
            - **Insurance**: Consider crop insurance if available.
            - **Emergency Fund**: Keep some savings for bad seasons.
        "#,
        order: 5,
    },
    NewModule {
        title: "Sustainable Agriculture Practices",
        description: "Farming methods that protect the environment and ensure long-term \
            productivity.",
        content: r#"
            ## Soil Health
            - **Crop Rotation**: Change crops each season to keep soil fertile.
            - **Composting**: Use farm waste to make natural fertilizer.

            ## Water Conservation
            - **Mulching**: Cover soil to keep moisture.
            - **Rainwater Harvesting**: Collect water for dry spells.

            ## Integrated Pest Management
            - Use natural predators and traps instead of just chemicals.
        "#,
        order: 6,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Module;
    use crate::store::{Document, Fields, MemoryStore, Query};
    use anyhow::bail;
    use std::collections::HashSet;

    /// Yields to the runtime after every query so that concurrent seeders interleave between the
    /// title check and the insert.
    struct YieldingStore(MemoryStore);

    #[async_trait::async_trait]
    impl Store for YieldingStore {
        async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
            self.0.insert(collection, fields).await
        }

        async fn query_scoped(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
            let found = self.0.query_scoped(collection, query).await?;
            tokio::task::yield_now().await;
            Ok(found)
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.0.get(collection, id).await
        }
    }

    /// Refuses to insert one particular title.
    struct RefusingStore {
        inner: MemoryStore,
        refuse: &'static str,
    }

    #[async_trait::async_trait]
    impl Store for RefusingStore {
        async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
            if fields.get("title") == Some(&Value::from(self.refuse)) {
                bail!("write rejected");
            }
            self.inner.insert(collection, fields).await
        }

        async fn query_scoped(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
            self.inner.query_scoped(collection, query).await
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.inner.get(collection, id).await
        }
    }

    fn titles(store: &MemoryStore) -> Vec<String> {
        store
            .documents(MODULES)
            .unwrap()
            .iter()
            .map(|d| d.decode::<Module>().unwrap().title)
            .collect()
    }

    #[test]
    fn test_catalog_titles_are_unique_and_ordered() {
        assert_eq!(CATALOG_LEN, 6);
        let unique: HashSet<_> = CATALOG.iter().map(|m| m.title).collect();
        assert_eq!(unique.len(), CATALOG_LEN);
        let orders: Vec<_> = CATALOG.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_seed_empty_store_then_again() {
        let store = MemoryStore::new();

        let first = seed(&store).await;
        assert_eq!(first.added.len(), CATALOG_LEN);
        assert!(first.skipped.is_empty());
        assert_eq!(titles(&store).len(), CATALOG_LEN);

        let second = seed(&store).await;
        assert!(second.added.is_empty());
        assert_eq!(second.skipped.len(), CATALOG_LEN);
        assert_eq!(titles(&store).len(), CATALOG_LEN);
    }

    #[tokio::test]
    async fn test_seed_only_fills_gaps() {
        let store = MemoryStore::new();
        store
            .insert(MODULES, encode(&CATALOG[2]).unwrap())
            .await
            .unwrap();
        ensure_seeded(&store).await;
        let titles = titles(&store);
        assert_eq!(titles.len(), CATALOG_LEN);
        assert_eq!(titles[0], "Credit Management");
    }

    #[tokio::test]
    async fn test_seed_failure_does_not_stop_other_items() {
        let inner = MemoryStore::new();
        let store = RefusingStore {
            inner: inner.clone(),
            refuse: "Credit Management",
        };
        let report = seed(&store).await;
        assert_eq!(report.failed, vec!["Credit Management".to_string()]);
        assert_eq!(report.added.len(), CATALOG_LEN - 1);
        assert!(!titles(&inner).contains(&"Credit Management".to_string()));
    }

    #[tokio::test]
    async fn test_independent_seeders_can_duplicate() {
        let inner = MemoryStore::new();
        let store = YieldingStore(inner.clone());
        let a = Seeder::new();
        let b = Seeder::new();
        tokio::join!(a.ensure_seeded(&store), b.ensure_seeded(&store));
        assert!(titles(&inner).len() > CATALOG_LEN);
    }

    #[tokio::test]
    async fn test_shared_seeder_never_duplicates() {
        let inner = MemoryStore::new();
        let store = YieldingStore(inner.clone());
        let seeder = Seeder::new();
        let clone = seeder.clone();
        tokio::join!(seeder.ensure_seeded(&store), clone.ensure_seeded(&store));
        let titles = titles(&inner);
        assert_eq!(titles.len(), CATALOG_LEN);
        let unique: HashSet<_> = titles.iter().collect();
        assert_eq!(unique.len(), CATALOG_LEN);
    }
}
