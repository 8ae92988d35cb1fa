use crate::model::{Amount, Record, RecordType};
use crate::Result;
use anyhow::anyhow;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Totals derived from a user's records, plus the most recent few records. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub recent: Vec<Record>,
    pub total_income: Amount,
    pub total_expense: Amount,
}

impl Summary {
    /// Builds a summary with totals computed from `all` and `recent` taken as given.
    ///
    /// Fails if a total or the net balance is too large to represent.
    pub fn from_records(recent: Vec<Record>, all: &[Record]) -> Result<Self> {
        let total = |t: RecordType| -> Result<Amount> {
            all.iter()
                .filter(|r| r.record_type == t)
                .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.amount))
                .ok_or_else(|| anyhow!("The {t} total is too large to compute"))
        };
        let summary = Self {
            total_income: total(RecordType::Income)?,
            total_expense: total(RecordType::Expense)?,
            recent,
        };
        summary
            .total_income
            .checked_sub(summary.total_expense)
            .ok_or_else(|| anyhow!("The net balance is too large to compute"))?;
        Ok(summary)
    }

    /// Income minus expense. Cannot overflow for a summary built by `from_records`.
    pub fn net_balance(&self) -> Amount {
        self.total_income - self.total_expense
    }
}

/// A time-of-day greeting for the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Greeting {
    #[serde(rename = "Good Morning")]
    Morning,
    #[serde(rename = "Good Afternoon")]
    Afternoon,
    #[serde(rename = "Good Evening")]
    Evening,
}

serde_plain::derive_display_from_serialize!(Greeting);

impl Greeting {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Greeting::Morning,
            12..=17 => Greeting::Afternoon,
            _ => Greeting::Evening,
        }
    }

    pub fn now() -> Self {
        Self::for_hour(chrono::Local::now().hour())
    }
}
