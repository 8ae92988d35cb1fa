//! Record command handlers.
//!
//! This module provides:
//! - `records`: list the signed-in user's records, optionally filtered by type
//! - `add`: validate and save a new record

use crate::args::{AddArgs, OutputFormat, RecordsArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Record, RecordDraft, ValidationError};
use crate::records::{add_record, apply_filter, load_records};
use crate::view::{View, ViewState};
use crate::{Ledger, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use tracing::info;

const HEADERS: [&str; 5] = ["Date", "Type", "Category", "Amount", "Description"];

/// Records in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// JSON array of record objects.
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

impl Rows {
    fn render(records: &[Record], format: OutputFormat, currency: &str) -> Result<Self> {
        Ok(match format {
            OutputFormat::Json => Rows::Json(
                serde_json::to_value(records).context("Unable to serialize records")?,
            ),
            OutputFormat::Table => Rows::Table(table(records, currency)),
            OutputFormat::Csv => Rows::Csv(csv(records)?),
        })
    }
}

/// Handles `ledger records`.
pub async fn records(ledger: &Ledger, args: &RecordsArgs) -> Result<Out<Rows>> {
    let identity = ledger.require_identity().await?;

    let mut view = View::new("records");
    let all = match view.load(load_records(ledger.store(), &identity.uid)).await {
        ViewState::Loaded(records) => records.clone(),
        ViewState::Failed(e) => return Err(anyhow!("{e}")).pub_result(ErrorType::Store),
        ViewState::Idle | ViewState::Loading => {
            return Err(anyhow!("The records did not load")).pub_result(ErrorType::Store)
        }
    };

    let shown = apply_filter(&all, args.filter());
    let message = if shown.is_empty() {
        "No records found.".to_string()
    } else {
        format!("Showing {} of {} records ({})", shown.len(), all.len(), args.filter())
    };
    let rows = Rows::render(&shown, args.format(), ledger.config().currency())?;
    let body = rows.to_string();
    Ok(Out::new(message, rows).with_body(body))
}

/// Handles `ledger add`.
pub async fn add(ledger: &Ledger, args: &AddArgs) -> Result<Out<Record>> {
    let identity = ledger.require_identity().await?;
    let draft = RecordDraft {
        record_type: args.record_type(),
        amount: args.amount().to_string(),
        category: args.category().to_string(),
        date: args.date().map(str::to_string),
        description: args.description().map(str::to_string),
    };

    let record = match add_record(ledger.store(), &identity.uid, draft).await {
        Ok(record) => record,
        Err(e) if e.is::<ValidationError>() => {
            if let Some(ValidationError::CategoryRequired) = e.downcast_ref() {
                info!(
                    "Suggested {} categories: {}",
                    args.record_type(),
                    args.record_type().suggested_categories().join(", ")
                );
            }
            return Err(e).pub_result(ErrorType::Validation);
        }
        Err(e) => return Err(e).pub_result(ErrorType::Store),
    };

    let currency = ledger.config().currency();
    Ok(Out::new(
        format!(
            "Added {} {} in {} on {}",
            record.record_type,
            record.amount.format(currency),
            record.category_label(),
            record.date
        ),
        record,
    ))
}

/// A markdown table of `records`.
fn table(records: &[Record], currency: &str) -> String {
    let mut out = format!("| {} |\n", HEADERS.join(" | "));
    out.push_str(&format!("|{}\n", "---|".repeat(HEADERS.len())));
    for r in records {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            r.date,
            r.record_type,
            escape_cell(r.category_label()),
            r.signed_amount(currency),
            escape_cell(r.description().unwrap_or_default()),
        ));
    }
    out
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// CSV with a header row. Amounts are plain decimals so that the file can be re-imported.
fn csv(records: &[Record]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS).context("Unable to write CSV header")?;
    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.record_type.to_string(),
            r.category_label().to_string(),
            r.amount.to_string(),
            r.description().unwrap_or_default().to_string(),
        ])
        .context("Unable to write CSV row")?;
    }
    let bytes = wtr.into_inner().context("Unable to finish CSV output")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}
