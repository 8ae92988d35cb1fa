use crate::model::amount::AmountError;
use crate::model::{Amount, MAX_AMOUNT};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const INCOME_CATEGORIES: &[&str] = &["Harvest Sales", "Livestock Sales", "Services", "Other"];
const EXPENSE_CATEGORIES: &[&str] = &["Seeds", "Fertilizer", "Labor", "Equipment", "Feed", "Other"];

/// Shown in place of a blank category.
pub const GENERAL_CATEGORY: &str = "General";

/// Whether money came in or went out.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(RecordType);
serde_plain::derive_fromstr_from_deserialize!(RecordType);

impl RecordType {
    /// The categories offered when adding a record of this type.
    pub fn suggested_categories(&self) -> &'static [&'static str] {
        match self {
            RecordType::Income => INCOME_CATEGORIES,
            RecordType::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// `+` for income and `-` for expense.
    pub fn sign(&self) -> char {
        match self {
            RecordType::Income => '+',
            RecordType::Expense => '-',
        }
    }
}

/// Which records to show in the records list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordFilter {
    #[default]
    All,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(RecordFilter);
serde_plain::derive_fromstr_from_deserialize!(RecordFilter);

impl RecordFilter {
    pub fn matches(&self, record_type: RecordType) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Income => record_type == RecordType::Income,
            RecordFilter::Expense => record_type == RecordType::Expense,
        }
    }
}

impl From<RecordType> for RecordFilter {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Income => RecordFilter::Income,
            RecordType::Expense => RecordFilter::Expense,
        }
    }
}

/// A single income or expense entry as read back from the `records` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub amount: Amount,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// The category, or `General` when it is blank.
    pub fn category_label(&self) -> &str {
        if self.category.trim().is_empty() {
            GENERAL_CATEGORY
        } else {
            &self.category
        }
    }

    /// The description if there is one worth showing.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// The amount with its sign and currency, e.g. `+ KES 500.00`.
    pub fn signed_amount(&self, currency: &str) -> String {
        format!("{} {}", self.record_type.sign(), self.amount.format(currency))
    }
}

/// A validated record that has not yet been written to the store. The store assigns the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub user_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub amount: Amount,
    pub category: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    pub fn into_record(self, id: impl Into<String>) -> Record {
        Record {
            id: id.into(),
            user_id: self.user_id,
            record_type: self.record_type,
            amount: self.amount,
            category: self.category,
            date: self.date,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

/// Unvalidated input from the add-record form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub record_type: RecordType,
    pub amount: String,
    pub category: String,
    /// `YYYY-MM-DD`. Today when `None`.
    pub date: Option<String>,
    pub description: Option<String>,
}

impl RecordDraft {
    /// Checks the draft and turns it into a `NewRecord` owned by `user_id`.
    ///
    /// The amount must parse, be greater than zero and be at most `MAX_AMOUNT`. The category must
    /// not be blank and the date, if given, must be a real calendar date.
    pub fn validate(
        self,
        user_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<NewRecord, ValidationError> {
        let amount = Amount::from_str(&self.amount).map_err(|e| match e {
            AmountError::Empty => ValidationError::AmountRequired,
            AmountError::Decimal(_) => ValidationError::InvalidAmount(self.amount.clone()),
        })?;
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge(amount));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(ValidationError::CategoryRequired);
        }

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(s.to_string()))?,
        };

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(NewRecord {
            user_id: user_id.to_string(),
            record_type: self.record_type,
            amount,
            category: category.to_string(),
            date,
            description,
            created_at: now,
        })
    }
}

/// The reasons a record can be rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    AmountRequired,
    InvalidAmount(String),
    NonPositiveAmount(Amount),
    AmountTooLarge(Amount),
    CategoryRequired,
    InvalidDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::AmountRequired => f.write_str("An amount is required"),
            ValidationError::InvalidAmount(s) => write!(f, "'{s}' is not a valid amount"),
            ValidationError::NonPositiveAmount(a) => {
                write!(f, "The amount must be greater than zero, got {a}")
            }
            ValidationError::AmountTooLarge(a) => {
                write!(f, "The amount must be at most {MAX_AMOUNT}, got {a}")
            }
            ValidationError::CategoryRequired => f.write_str("A category is required"),
            ValidationError::InvalidDate(s) => {
                write!(f, "'{s}' is not a valid date, expected YYYY-MM-DD")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    fn draft(amount: &str, category: &str) -> RecordDraft {
        RecordDraft {
            record_type: RecordType::Income,
            amount: amount.to_string(),
            category: category.to_string(),
            date: Some("2025-03-01".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let rec = draft("1,500", "Harvest Sales")
            .validate("u1", today(), now())
            .unwrap();
        assert_eq!(rec.user_id, "u1");
        assert_eq!(rec.record_type, RecordType::Income);
        assert_eq!(rec.amount, Amount::from_str("1500").unwrap());
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(rec.created_at, now());
    }

    #[test]
    fn test_validate_rejects_zero_and_negative() {
        for amount in ["0", "0.00", "-20"] {
            let err = draft(amount, "Seeds").validate("u1", today(), now());
            assert!(
                matches!(err, Err(ValidationError::NonPositiveAmount(_))),
                "{amount} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_missing_amount() {
        let err = draft("  ", "Seeds").validate("u1", today(), now());
        assert_eq!(err, Err(ValidationError::AmountRequired));
        let err = draft("ten", "Seeds").validate("u1", today(), now());
        assert_eq!(err, Err(ValidationError::InvalidAmount("ten".into())));
        let err = draft("x12", "Seeds").validate("u1", today(), now());
        assert_eq!(err, Err(ValidationError::InvalidAmount("x12".into())));
    }

    #[test]
    fn test_validate_upper_bound() {
        let rec = draft("1,000,000,000", "Harvest Sales").validate("u1", today(), now());
        assert_eq!(rec.unwrap().amount, MAX_AMOUNT);
        let too_large = "79228162514264337593543950335";
        let err = draft(too_large, "Harvest Sales").validate("u1", today(), now());
        assert_eq!(
            err,
            Err(ValidationError::AmountTooLarge(
                Amount::from_str(too_large).unwrap()
            ))
        );
    }

    #[test]
    fn test_validate_rejects_missing_category() {
        let err = draft("10", " ").validate("u1", today(), now());
        assert_eq!(err, Err(ValidationError::CategoryRequired));
    }

    #[test]
    fn test_validate_date_defaults_to_today() {
        let mut d = draft("10", "Feed");
        d.date = None;
        assert_eq!(d.validate("u1", today(), now()).unwrap().date, today());
    }

    #[test]
    fn test_validate_rejects_impossible_date() {
        let mut d = draft("10", "Feed");
        d.date = Some("2025-02-30".into());
        assert_eq!(
            d.validate("u1", today(), now()),
            Err(ValidationError::InvalidDate("2025-02-30".into()))
        );
    }

    #[test]
    fn test_validate_drops_blank_description() {
        let mut d = draft("10", "Feed");
        d.description = Some("   ".into());
        assert_eq!(d.validate("u1", today(), now()).unwrap().description, None);
    }

    #[test]
    fn test_record_document_shape() {
        let rec = draft("500", "Harvest Sales")
            .validate("u1", today(), now())
            .unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["type"], "income");
        assert_eq!(json["amount"], "500");
        assert_eq!(json["date"], "2025-03-01");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_record_reads_numeric_amount_and_iso_timestamp() {
        let json = serde_json::json!({
            "id": "abc",
            "userId": "u1",
            "type": "expense",
            "amount": 200,
            "category": "",
            "date": "2025-01-02",
            "description": "",
            "createdAt": "2025-01-02T08:00:00.000Z"
        });
        let rec: Record = serde_json::from_value(json).unwrap();
        assert_eq!(rec.record_type, RecordType::Expense);
        assert_eq!(rec.category_label(), GENERAL_CATEGORY);
        assert_eq!(rec.description(), None);
        assert_eq!(rec.signed_amount("KES"), "- KES 200.00");
    }

    #[test]
    fn test_filter_matches() {
        assert!(RecordFilter::All.matches(RecordType::Income));
        assert!(RecordFilter::All.matches(RecordType::Expense));
        assert!(RecordFilter::Income.matches(RecordType::Income));
        assert!(!RecordFilter::Income.matches(RecordType::Expense));
        assert!(!RecordFilter::Expense.matches(RecordType::Income));
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!(RecordType::from_str("income").unwrap(), RecordType::Income);
        assert!(RecordType::from_str("transfer").is_err());
        assert_eq!(RecordType::default(), RecordType::Expense);
        assert_eq!(RecordType::Expense.to_string(), "expense");
    }

    #[test]
    fn test_suggested_categories() {
        assert!(RecordType::Income
            .suggested_categories()
            .contains(&"Harvest Sales"));
        assert!(RecordType::Expense
            .suggested_categories()
            .contains(&"Fertilizer"));
    }
}
