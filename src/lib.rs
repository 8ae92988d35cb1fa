//! farmer-ledger: income and expense tracking for smallholder farmers.
//!
//! The library is organised around a document store (`store`) and an authentication provider
//! (`session`). On top of those sit the derived views: the home screen summary (`summary`), the
//! records list (`records`) and the lessons (`learn`, provisioned by `seed`). `commands` wires
//! them to the `ledger` CLI.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod learn;
mod ledger;
pub mod model;
pub mod records;
pub mod seed;
pub mod session;
pub mod store;
pub mod summary;
mod utils;
pub mod view;


pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use ledger::Ledger;
pub use store::Mode;
