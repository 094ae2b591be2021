//! Implements the service facade that external layers (HTTP handlers, CLI
//! clients) call into to operate on the ledger.

use time::Date;

use crate::{
    Error,
    models::{
        Account, AccountKind, Category, CategoryName, DatabaseID, NewTransaction, Transaction,
        TransactionKind,
    },
    stores::{AccountStore, CategoryStore, TransactionFilter, TransactionStore},
};

/// The number of results a category lookup returns when the caller does not
/// ask for a specific limit.
const DEFAULT_CATEGORY_RESULTS: u64 = 10;

/// Orchestrates account creation, transaction posting/reversal and query
/// filtering across the ledger's stores.
///
/// The service holds explicit store handles passed in at construction; it
/// keeps no global state. All validation of caller input happens here, so
/// store implementations can assume well-formed values.
#[derive(Debug, Clone)]
pub struct LedgerService<A, T, C> {
    account_store: A,
    transaction_store: T,
    category_store: C,
}

impl<A, T, C> LedgerService<A, T, C>
where
    A: AccountStore,
    T: TransactionStore,
    C: CategoryStore,
{
    /// Create a new `LedgerService` on top of the given stores.
    ///
    /// The stores are expected to share a backend; see
    /// [create_ledger](crate::stores::sqlite::create_ledger) for a
    /// constructor that wires up the SQLite implementations.
    pub fn new(account_store: A, transaction_store: T, category_store: C) -> Self {
        Self {
            account_store,
            transaction_store,
            category_store,
        }
    }

    /// Create a new account with a balance of zero.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::EmptyDescription] if `description` is an empty string,
    /// - or [Error::DuplicateAccount] if `description` is already in use.
    pub fn create_account(
        &mut self,
        description: &str,
        kind: AccountKind,
    ) -> Result<Account, Error> {
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let account = self.account_store.create(description, kind)?;

        tracing::info!(
            "created {} account {} '{}'",
            account.kind,
            account.id,
            account.description
        );

        Ok(account)
    }

    /// Retrieve the account with `id`, or `None` if there is no such
    /// account.
    pub fn get_account_by_id(&self, id: DatabaseID) -> Result<Option<Account>, Error> {
        match self.account_store.get(id) {
            Ok(account) => Ok(Some(account)),
            Err(Error::AccountNotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Retrieve the account with `description`, or `None` if there is no
    /// such account.
    pub fn get_account_by_description(
        &self,
        description: &str,
    ) -> Result<Option<Account>, Error> {
        match self.account_store.get_by_description(description) {
            Ok(account) => Ok(Some(account)),
            Err(Error::AccountNotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Retrieve all accounts.
    pub fn get_all_accounts(&self) -> Result<Vec<Account>, Error> {
        self.account_store.get_all()
    }

    /// Post a transaction against the account with `account_id`, updating
    /// its balance by `amount` in the direction given by `kind`.
    ///
    /// A category label is accepted without prior registration and is
    /// registered as a side effect, so posting can never fail on an unknown
    /// category.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::AccountNotFound] if `account_id` does not refer to a valid
    ///   account,
    /// - [Error::EmptyDescription] if `description` is an empty string,
    /// - or [Error::NegativeAmount] if `amount` is negative.
    pub fn post_transaction(
        &mut self,
        account_id: DatabaseID,
        date: Date,
        description: &str,
        amount: i64,
        kind: TransactionKind,
        category: Option<CategoryName>,
    ) -> Result<Transaction, Error> {
        let new_transaction =
            NewTransaction::new(account_id, date, description, amount, kind, category)?;

        // Check the account up front so a doomed post does not register the
        // category as a side effect.
        self.account_store.get(account_id)?;

        if let Some(name) = &new_transaction.category {
            self.category_store.add(name.clone())?;
        }

        let transaction = self.transaction_store.post(new_transaction)?;

        tracing::info!(
            "posted {} of {} to account {}",
            transaction.kind,
            transaction.amount,
            transaction.account_id
        );

        Ok(transaction)
    }

    /// Roll back the transaction with `transaction_id` on the account with
    /// `account_id`: the inverse balance delta is applied and the record is
    /// removed. Returns the removed record.
    ///
    /// # Errors
    /// This function will return an:
    /// - [Error::AccountNotFound] if `account_id` does not refer to a valid
    ///   account,
    /// - [Error::TransactionNotFound] if no active transaction has
    ///   `transaction_id`,
    /// - or [Error::TransactionNotInAccount] if the transaction belongs to
    ///   a different account.
    pub fn reverse_transaction(
        &mut self,
        account_id: DatabaseID,
        transaction_id: DatabaseID,
    ) -> Result<Transaction, Error> {
        self.account_store.get(account_id)?;

        let transaction = self.transaction_store.reverse(account_id, transaction_id)?;

        tracing::info!(
            "rolled back {} of {} on account {}",
            transaction.kind,
            transaction.amount,
            transaction.account_id
        );

        Ok(transaction)
    }

    /// Retrieve all active transactions for the account with `account_id`,
    /// most recent date first.
    ///
    /// An unknown account id yields an empty vector.
    pub fn get_transactions(&self, account_id: DatabaseID) -> Result<Vec<Transaction>, Error> {
        self.transaction_store.get_for_account(account_id)
    }

    /// Retrieve the active transactions matched by `filter`, most recent
    /// date first.
    ///
    /// An empty filter matches every transaction in the ledger; callers
    /// that cannot handle an unbounded result should set the filter's
    /// `limit`.
    pub fn find_transactions(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, Error> {
        self.transaction_store.get_filtered(filter)
    }

    /// Retrieve all registered categories. No ordering is guaranteed.
    pub fn get_all_categories(&self) -> Result<Vec<Category>, Error> {
        self.category_store.get_all()
    }

    /// Whether `name` is a registered category.
    pub fn is_category(&self, name: &CategoryName) -> Result<bool, Error> {
        self.category_store.contains(name)
    }

    /// Register each of `names` as a category, skipping any that already
    /// exist.
    pub fn add_categories<I>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = CategoryName>,
    {
        for name in names {
            self.category_store.add(name)?;
        }

        Ok(())
    }

    /// Retrieve the active transactions whose category is exactly `name`,
    /// most recent date first, truncated to `limit` results (10 when
    /// `None`).
    pub fn get_transactions_for_category(
        &self,
        name: &CategoryName,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, Error> {
        self.transaction_store.get_filtered(TransactionFilter {
            category: Some(name.clone()),
            limit: Some(limit.unwrap_or(DEFAULT_CATEGORY_RESULTS)),
            ..Default::default()
        })
    }
}
