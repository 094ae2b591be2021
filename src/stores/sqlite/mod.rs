//! Contains the SQLite backed implementations of the store traits and
//! convenience constructors for a fully wired [LedgerService].

pub mod account;
pub mod category;
pub mod transaction;

pub use account::SQLiteAccountStore;
pub use category::SQLiteCategoryStore;
pub use transaction::SQLiteTransactionStore;

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{Error, LedgerService, db::initialize};

/// An alias for a [LedgerService] that uses SQLite for the backend.
pub type SqliteLedger =
    LedgerService<SQLiteAccountStore, SQLiteTransactionStore, SQLiteCategoryStore>;

/// Open the database file at `path`, creating it if necessary, and build a
/// ledger on it.
///
/// # Errors
/// Returns an error if the database cannot be opened or initialized.
pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteLedger, Error> {
    create_ledger(Connection::open(path)?)
}

/// Build a ledger on a fresh in-memory database.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn open_in_memory() -> Result<SqliteLedger, Error> {
    create_ledger(Connection::open_in_memory()?)
}

/// Creates a [LedgerService] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the
/// domain models. The three stores share `db_connection`.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn create_ledger(db_connection: Connection) -> Result<SqliteLedger, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok(LedgerService::new(
        SQLiteAccountStore::new(connection.clone()),
        SQLiteTransactionStore::new(connection.clone()),
        SQLiteCategoryStore::new(connection),
    ))
}
