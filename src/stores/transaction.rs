//! Defines the transaction store trait and the filter type for querying
//! transactions.

use time::Date;

use crate::{
    Error,
    models::{CategoryName, DatabaseID, NewTransaction, Transaction, TransactionKind},
};

/// Handles the posting, reversal and retrieval of transactions.
///
/// Posting and reversal touch both the transaction row and the owning
/// account's balance. Implementations must commit the two writes as a
/// single atomic unit: on any failure mid-operation neither write may be
/// observable.
pub trait TransactionStore {
    /// Post a new transaction and apply its balance delta to the owning
    /// account.
    ///
    /// # Errors
    /// This function will return an [Error::AccountNotFound] if the account
    /// id in `new_transaction` does not refer to a valid account.
    fn post(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Roll back the transaction with `transaction_id`: apply the inverse
    /// balance delta to the account and remove the record. Returns the
    /// removed record.
    ///
    /// A rolled back transaction is gone for good; reversing the same id a
    /// second time fails as if the transaction never existed.
    ///
    /// # Errors
    /// This function will return:
    /// - [Error::TransactionNotFound] if no active transaction has
    ///   `transaction_id`,
    /// - or [Error::TransactionNotInAccount] if the transaction exists but
    ///   is owned by an account other than `account_id`.
    fn reverse(
        &mut self,
        account_id: DatabaseID,
        transaction_id: DatabaseID,
    ) -> Result<Transaction, Error>;

    /// Retrieve the transaction with `id`.
    ///
    /// # Errors
    /// This function will return an [Error::TransactionNotFound] if no
    /// active transaction has `id`.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve all active transactions for an account, most recent date
    /// first.
    ///
    /// An unknown account id yields an empty vector.
    fn get_for_account(&self, account_id: DatabaseID) -> Result<Vec<Transaction>, Error> {
        self.get_filtered(TransactionFilter {
            account_id: Some(account_id),
            ..Default::default()
        })
    }

    /// Retrieve the active transactions matched by `filter`, most recent
    /// date first.
    fn get_filtered(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, Error>;
}

/// Defines which transactions should be fetched from
/// [TransactionStore::get_filtered].
///
/// Each present field narrows the result set by exact match and the fields
/// combine conjunctively; absent fields impose no constraint. A default
/// filter therefore matches every transaction — callers that cannot handle
/// an unbounded result should set `limit` or paginate at their boundary.
///
/// Results are always ordered by date descending, with ties broken by
/// insertion order, most recent first.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Match the transaction with this id.
    pub id: Option<DatabaseID>,
    /// Match transactions posted against this account.
    pub account_id: Option<DatabaseID>,
    /// Match transactions with exactly this description.
    pub description: Option<String>,
    /// Match transactions of exactly this amount.
    pub amount: Option<i64>,
    /// Match transactions dated exactly this day.
    pub date: Option<Date>,
    /// Match transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Match transactions with exactly this category label.
    pub category: Option<CategoryName>,
    /// Selects up to the first N (`limit`) matching transactions.
    pub limit: Option<u64>,
}
