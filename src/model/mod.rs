//! Types that represent the core data model, such as `Record` and `Module`.
mod amount;
mod identity;
mod module;
mod record;
mod summary;

pub use amount::{Amount, AmountError, MAX_AMOUNT};
pub use identity::Identity;
pub use module::{Module, NewModule};
pub use record::{
    NewRecord, Record, RecordDraft, RecordFilter, RecordType, ValidationError, GENERAL_CATEGORY,
};
pub use summary::{Greeting, Summary};
