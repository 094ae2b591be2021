//! Implements a SQLite backed account store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Account, AccountKind, DatabaseID},
    stores::AccountStore,
};

/// Stores accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteAccountStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteAccountStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl AccountStore for SQLiteAccountStore {
    /// Create a new account in the database with a balance of zero.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateAccount] if `description` is already in use,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, description: &str, kind: AccountKind) -> Result<Account, Error> {
        let account = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO account (description, kind, balance)
                 VALUES (?1, ?2, 0)
                 RETURNING id, description, kind, balance",
            )?
            .query_row((description, kind), Self::map_row)?;

        Ok(account)
    }

    /// Retrieve an account in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AccountNotFound] if `id` does not refer to a valid account,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Account, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, description, kind, balance FROM account WHERE id = :id")?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
                error => error.into(),
            })
    }

    /// Retrieve an account in the database by its unique `description`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AccountNotFound] if no account has `description`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get_by_description(&self, description: &str) -> Result<Account, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, description, kind, balance FROM account WHERE description = :description")?
            .query_row(&[(":description", &description)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
                error => error.into(),
            })
    }

    /// Retrieve all accounts in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error.
    fn get_all(&self) -> Result<Vec<Account>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, description, kind, balance FROM account")?
            .query_map([], Self::map_row)?
            .map(|maybe_account| maybe_account.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SQLiteAccountStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS account (
                    id INTEGER PRIMARY KEY,
                    description TEXT NOT NULL UNIQUE,
                    kind TEXT NOT NULL,
                    balance INTEGER NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteAccountStore {
    type ReturnType = Account;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Account {
            id: row.get(offset)?,
            description: row.get(offset + 1)?,
            kind: row.get(offset + 2)?,
            balance: row.get(offset + 3)?,
        })
    }
}
