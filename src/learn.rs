//! The education screens: the list of lessons and a single lesson.

use crate::model::Module;
use crate::seed::Seeder;
use crate::store::{Direction, Query, Store, MODULES};
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// Seeds any missing lessons, then returns every lesson in ascending `order`.
pub async fn list_modules(store: &dyn Store, seeder: &Seeder) -> Result<Vec<Module>> {
    seeder.ensure_seeded(store).await;
    let query = Query::new().order_by("order", Direction::Asc);
    let docs = store.query_scoped(MODULES, &query).await?;
    docs.iter().map(|doc| doc.decode()).collect()
}

/// The lesson with `id`, or `None` when there is no such lesson.
pub async fn get_module(store: &dyn Store, id: &str) -> Result<Option<Module>> {
    match store.get(MODULES, id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => {
            debug!("Lesson '{id}' not found");
            Ok(None)
        }
    }
}

/// Where to go after a lesson is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    LessonList,
}

/// Marks a lesson as done. Completion is not recorded anywhere; this only sends the user back to
/// the lesson list.
pub fn finish_lesson(module: &Module) -> Navigation {
    debug!("Finished lesson '{}'", module.title);
    Navigation::LessonList
}
