use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Greeting, Summary};
use crate::summary::load_summary;
use crate::view::{View, ViewState};
use crate::{Ledger, Result};
use anyhow::anyhow;
use serde::Serialize;

/// What the home screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct HomeScreen {
    pub greeting: Greeting,
    pub name: String,
    pub net_balance: Amount,
    pub summary: Summary,
}

/// Handles `ledger home`: the greeting, the balance card and the recent activity.
pub async fn home(ledger: &Ledger) -> Result<Out<HomeScreen>> {
    home_at(ledger, Greeting::now()).await
}

async fn home_at(ledger: &Ledger, greeting: Greeting) -> Result<Out<HomeScreen>> {
    let identity = ledger.require_identity().await?;
    let config = ledger.config();

    let mut view = View::new("home");
    let summary = match view
        .load(load_summary(ledger.store(), &identity.uid, config.recent_limit()))
        .await
    {
        ViewState::Loaded(summary) => summary.clone(),
        ViewState::Failed(e) => return Err(anyhow!("{e}")).pub_result(ErrorType::Store),
        ViewState::Idle | ViewState::Loading => {
            return Err(anyhow!("The home screen did not load")).pub_result(ErrorType::Store)
        }
    };

    let screen = HomeScreen {
        greeting,
        name: identity.short_name().to_string(),
        net_balance: summary.net_balance(),
        summary,
    };
    let body = render(&screen, config.currency());
    Ok(Out::new(
        format!("Net balance {}", screen.net_balance.format(config.currency())),
        screen,
    )
    .with_body(body))
}

fn render(screen: &HomeScreen, currency: &str) -> String {
    let summary = &screen.summary;
    let mut lines = vec![
        format!("{}, {}", screen.greeting, screen.name),
        String::new(),
        format!("Net Balance  {}", screen.net_balance.format(currency)),
        format!("Income       + {}", summary.total_income.format(currency)),
        format!("Expense      - {}", summary.total_expense.format(currency)),
        String::new(),
        "Recent Activity".to_string(),
    ];
    if summary.recent.is_empty() {
        lines.push("No records yet.".to_string());
    }
    for record in &summary.recent {
        lines.push(format!(
            "{}  {:<16}  {}",
            record.date,
            record.category_label(),
            record.signed_amount(currency)
        ));
    }
    lines.join("\n")
}
