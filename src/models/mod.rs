//! This module defines the domain data types.

pub use account::{Account, AccountKind};
pub use category::{Category, CategoryName};
pub use transaction::{NewTransaction, Transaction, TransactionKind, parse_date};

mod account;
mod category;
mod transaction;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
