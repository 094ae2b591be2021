//! Defines the account store trait.

use crate::{
    Error,
    models::{Account, AccountKind, DatabaseID},
};

/// Handles the creation and retrieval of accounts.
///
/// Implementations own the account balance: it starts at zero on creation
/// and is only ever changed through
/// [TransactionStore::post](crate::stores::TransactionStore::post) and
/// [TransactionStore::reverse](crate::stores::TransactionStore::reverse).
pub trait AccountStore {
    /// Create a new account with a balance of zero.
    ///
    /// # Errors
    /// This function will return an [Error::DuplicateAccount] if
    /// `description` is already in use by another account.
    fn create(&mut self, description: &str, kind: AccountKind) -> Result<Account, Error>;

    /// Retrieve the account with `id`.
    ///
    /// # Errors
    /// This function will return an [Error::AccountNotFound] if no account
    /// has `id`.
    fn get(&self, id: DatabaseID) -> Result<Account, Error>;

    /// Retrieve the account with `description`.
    ///
    /// # Errors
    /// This function will return an [Error::AccountNotFound] if no account
    /// has `description`.
    fn get_by_description(&self, description: &str) -> Result<Account, Error>;

    /// Retrieve all accounts in the store.
    fn get_all(&self) -> Result<Vec<Account>, Error>;
}
