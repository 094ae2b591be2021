//! Bookkeeper is a library for keeping a personal ledger: financial
//! accounts, the transactions posted against them, and the categories used
//! to group those transactions for lookup.
//!
//! The central invariant the crate protects is balance correctness: an
//! account's balance always equals the signed sum of its active
//! transactions (credits add, debits subtract), including after a
//! transaction is rolled back.
//!
//! Persistence is abstracted behind the traits in [stores]; a SQLite
//! implementation is provided in [stores::sqlite]. The [LedgerService]
//! facade ties the stores together and is what an HTTP or CLI layer should
//! call into.

#![warn(missing_docs)]

pub mod db;
pub mod models;
pub mod stores;

mod ledger;

pub use ledger::LedgerService;

/// The errors that may occur while operating on the ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An account was created with a description that is already in use.
    ///
    /// Account descriptions are unique. The client should try again with a
    /// different description.
    #[error("an account with the given description already exists")]
    DuplicateAccount,

    /// A string that is not one of the recognised account kinds was used to
    /// create an account.
    #[error("'{0}' is not a valid account kind")]
    InvalidAccountKind(String),

    /// An operation referenced an account id or description that does not
    /// exist.
    #[error("the account could not be found")]
    AccountNotFound,

    /// A reversal or lookup referenced a transaction id that does not exist
    /// or was already rolled back.
    #[error("the transaction could not be found")]
    TransactionNotFound,

    /// A reversal referenced a transaction that exists but is owned by a
    /// different account than the one addressed.
    #[error("the transaction belongs to a different account")]
    TransactionNotInAccount,

    /// An empty string was used where a description is required.
    #[error("the description must not be empty")]
    EmptyDescription,

    /// An empty string was used to create a category name.
    #[error("a category name must not be empty")]
    EmptyCategoryName,

    /// A negative amount was used to create a transaction.
    ///
    /// Amounts are unsigned minor currency units. The direction of the
    /// balance effect is carried by the transaction kind, not the sign.
    #[error("{0} is not a valid transaction amount, amounts must not be negative")]
    NegativeAmount(i64),

    /// A string that is neither `credit` nor `debit` was used as a
    /// transaction kind.
    #[error("'{0}' is not a valid transaction kind")]
    InvalidTransactionKind(String),

    /// A date string could not be parsed as a calendar date.
    #[error("'{0}' could not be parsed as a date")]
    InvalidDate(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            // Code 2067 occurs when a UNIQUE constraint failed. The only
            // unique column written through this crate without an upsert is
            // the account description.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref description))
                if sql_error.extended_code == 2067 && description.contains("account.description") =>
            {
                Error::DuplicateAccount
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                Error::SqlError(error)
            }
        }
    }
}
