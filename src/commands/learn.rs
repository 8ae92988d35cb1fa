//! Education command handlers: `ledger learn`, `ledger lesson` and `ledger seed`.

use crate::args::LessonArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::learn::{finish_lesson, get_module, list_modules, Navigation};
use crate::model::Module;
use crate::seed::SeedReport;
use crate::view::{View, ViewState};
use crate::{Ledger, Result};
use anyhow::anyhow;
use tracing::warn;

/// Handles `ledger learn`: seeds any missing lessons and lists them.
pub async fn learn(ledger: &Ledger) -> Result<Out<Vec<Module>>> {
    let _ = ledger.require_identity().await?;
    let modules = load_list(ledger).await?;
    let body = render_list(&modules);
    Ok(Out::new(format!("{} lessons", modules.len()), modules).with_body(body))
}

/// Handles `ledger lesson`: shows one lesson, or with `--done` goes back to the lesson list.
pub async fn lesson(ledger: &Ledger, args: &LessonArgs) -> Result<Out<Vec<Module>>> {
    let _ = ledger.require_identity().await?;

    let mut view = View::new("lesson");
    let module = match view.load(get_module(ledger.store(), args.id())).await {
        ViewState::Loaded(module) => module.clone(),
        ViewState::Failed(e) => return Err(anyhow!("{e}")).pub_result(ErrorType::Store),
        ViewState::Idle | ViewState::Loading => {
            return Err(anyhow!("The lesson did not load")).pub_result(ErrorType::Store)
        }
    };
    let Some(module) = module else {
        return Ok(Out::new_message("Lesson not found")
            .with_body("Lesson not found. Run 'ledger learn' to see the lessons."));
    };

    if !args.done() {
        let body = format!("# {}\n\n{}\n\n{}", module.title, module.description, module.body());
        return Ok(Out::new(module.title.clone(), vec![module]).with_body(body));
    }

    match finish_lesson(&module) {
        Navigation::LessonList => {
            let modules = load_list(ledger).await?;
            let body = render_list(&modules);
            Ok(Out::new(format!("Finished '{}'", module.title), modules).with_body(body))
        }
    }
}

/// Handles `ledger seed`: adds any missing lessons and reports what it did.
pub async fn seed(ledger: &Ledger) -> Result<Out<SeedReport>> {
    let report = ledger.seeder().seed(ledger.store()).await;
    if !report.failed.is_empty() {
        warn!("{} lessons could not be added", report.failed.len());
    }
    Ok(Out::new(
        format!(
            "Added {} lessons, {} were already present, {} failed",
            report.added.len(),
            report.skipped.len(),
            report.failed.len()
        ),
        report,
    ))
}

async fn load_list(ledger: &Ledger) -> Result<Vec<Module>> {
    let mut view = View::new("learn");
    match view
        .load(list_modules(ledger.store(), ledger.seeder()))
        .await
    {
        ViewState::Loaded(modules) => Ok(modules.clone()),
        ViewState::Failed(e) => Err(anyhow!("{e}")).pub_result(ErrorType::Store),
        ViewState::Idle | ViewState::Loading => {
            Err(anyhow!("The lessons did not load")).pub_result(ErrorType::Store)
        }
    }
}

fn render_list(modules: &[Module]) -> String {
    modules
        .iter()
        .map(|m| format!("{}. {}  [{}]\n   {}", m.order, m.title, m.id, m.description))
        .collect::<Vec<_>>()
        .join("\n")
}
