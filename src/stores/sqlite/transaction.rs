//! Implements a SQLite backed transaction store.
//!
//! Posting and reversal write the transaction row and the owning account's
//! balance inside a single SQL transaction, so the ledger never exposes a
//! balance that disagrees with the recorded transaction set.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{CategoryName, DatabaseID, NewTransaction, Transaction},
    stores::{TransactionFilter, TransactionStore},
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction is owned by an
/// [Account](crate::models::Account), the account model must be set up in
/// the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Post a new transaction and apply its balance delta to the owning
    /// account.
    ///
    /// The balance update and the row insert commit together; if either
    /// fails the database is left as it was before the call.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AccountNotFound] if the account id in `new_transaction`
    ///   does not refer to a valid account,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn post(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();
        // Dropping the transaction without committing rolls it back.
        let sql_transaction = connection.unchecked_transaction()?;

        let delta = new_transaction.kind.signed(new_transaction.amount);
        let accounts_updated = sql_transaction.execute(
            "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
            (delta, new_transaction.account_id),
        )?;

        if accounts_updated == 0 {
            return Err(Error::AccountNotFound);
        }

        let category = new_transaction.category.as_ref().map(|name| name.as_ref());
        let transaction = sql_transaction
            .prepare(
                "INSERT INTO \"transaction\" (account_id, date, description, amount, kind, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id, account_id, date, description, amount, kind, category",
            )?
            .query_row(
                (
                    new_transaction.account_id,
                    new_transaction.date,
                    &new_transaction.description,
                    new_transaction.amount,
                    new_transaction.kind,
                    category,
                ),
                Self::map_row,
            )?;

        sql_transaction.commit()?;

        Ok(transaction)
    }

    /// Roll back a transaction: apply the inverse balance delta to the
    /// owning account and delete the record.
    ///
    /// The balance update and the row deletion commit together; if either
    /// fails the database is left as it was before the call.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `transaction_id` does not refer to
    ///   an active transaction,
    /// - [Error::TransactionNotInAccount] if the transaction is owned by an
    ///   account other than `account_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn reverse(
        &mut self,
        account_id: DatabaseID,
        transaction_id: DatabaseID,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();
        let sql_transaction = connection.unchecked_transaction()?;

        let record = sql_transaction
            .prepare(
                "SELECT id, account_id, date, description, amount, kind, category
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &transaction_id)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })?;

        if record.account_id != account_id {
            return Err(Error::TransactionNotInAccount);
        }

        sql_transaction.execute(
            "UPDATE account SET balance = balance - ?1 WHERE id = ?2",
            (record.kind.signed(record.amount), record.account_id),
        )?;
        sql_transaction.execute(
            "DELETE FROM \"transaction\" WHERE id = ?1",
            (transaction_id,),
        )?;

        sql_transaction.commit()?;

        Ok(record)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to an active
    ///   transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, account_id, date, description, amount, kind, category
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })
    }

    /// Query for transactions in the database.
    ///
    /// Each field present in `filter` narrows the result set by exact
    /// match; the result is ordered by date descending, then by most recent
    /// insertion.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error.
    fn get_filtered(&self, filter: TransactionFilter) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts = vec![
            "SELECT id, account_id, date, description, amount, kind, category FROM \"transaction\""
                .to_string(),
        ];
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        if let Some(id) = filter.id {
            where_clause_parts.push(format!("id = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(id));
        }

        if let Some(account_id) = filter.account_id {
            where_clause_parts.push(format!("account_id = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(account_id));
        }

        if let Some(description) = filter.description {
            where_clause_parts.push(format!("description = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(description));
        }

        if let Some(amount) = filter.amount {
            where_clause_parts.push(format!("amount = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(amount));
        }

        if let Some(date) = filter.date {
            where_clause_parts.push(format!("date = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(date.to_string()));
        }

        if let Some(kind) = filter.kind {
            where_clause_parts.push(format!("kind = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.to_string()));
        }

        if let Some(category) = filter.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.to_string()));
        }

        if !where_clause_parts.is_empty() {
            query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        }

        query_string_parts.push("ORDER BY date DESC, id DESC".to_string());

        if let Some(limit) = filter.limit {
            query_string_parts.push(format!("LIMIT {limit}"));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY,
                    account_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    description TEXT NOT NULL,
                    amount INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    category TEXT,
                    FOREIGN KEY(account_id) REFERENCES account(id)
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let category = row
            .get::<_, Option<String>>(offset + 6)?
            .map(|name| CategoryName::new_unchecked(&name));

        Ok(Transaction {
            id: row.get(offset)?,
            account_id: row.get(offset + 1)?,
            date: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            amount: row.get(offset + 4)?,
            kind: row.get(offset + 5)?,
            category,
        })
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        db::initialize,
        models::{Account, AccountKind, CategoryName, NewTransaction, Transaction, TransactionKind},
        stores::{AccountStore, TransactionFilter, TransactionStore},
    };

    use crate::stores::sqlite::SQLiteAccountStore;

    use super::SQLiteTransactionStore;

    fn get_test_stores() -> (SQLiteAccountStore, SQLiteTransactionStore) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        (
            SQLiteAccountStore::new(connection.clone()),
            SQLiteTransactionStore::new(connection),
        )
    }

    fn get_test_stores_and_account() -> (SQLiteAccountStore, SQLiteTransactionStore, Account) {
        let (mut account_store, transaction_store) = get_test_stores();
        let account = account_store
            .create("Account1", AccountKind::Checking)
            .expect("Could not create account");

        (account_store, transaction_store, account)
    }

    fn post(
        store: &mut SQLiteTransactionStore,
        account_id: i64,
        date: Date,
        description: &str,
        amount: i64,
        kind: TransactionKind,
        category: &str,
    ) -> Transaction {
        let new_transaction = NewTransaction::new(
            account_id,
            date,
            description,
            amount,
            kind,
            Some(CategoryName::new_unchecked(category)),
        )
        .unwrap();

        store
            .post(new_transaction)
            .expect("Could not post transaction")
    }

    #[test]
    fn post_returns_created_transaction() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let transaction = post(
            &mut store,
            account.id,
            date!(2015 - 12 - 31),
            "place #1",
            100,
            TransactionKind::Debit,
            "grocery",
        );

        assert!(transaction.id > 0);
        assert_eq!(transaction.account_id, account.id);
        assert_eq!(transaction.date, date!(2015 - 12 - 31));
        assert_eq!(transaction.description, "place #1");
        assert_eq!(transaction.amount, 100);
        assert_eq!(transaction.kind, TransactionKind::Debit);
        assert_eq!(
            transaction.category,
            Some(CategoryName::new_unchecked("grocery"))
        );
    }

    #[test]
    fn post_applies_signed_balance_deltas() {
        let (account_store, mut store, account) = get_test_stores_and_account();

        post(
            &mut store,
            account.id,
            date!(2015 - 12 - 31),
            "place #1",
            100,
            TransactionKind::Debit,
            "grocery",
        );
        post(
            &mut store,
            account.id,
            date!(2016 - 03 - 30),
            "place #2",
            150,
            TransactionKind::Credit,
            "grocery",
        );

        let account = account_store.get(account.id).unwrap();
        assert_eq!(account.balance, -100 + 150);
    }

    #[test]
    fn post_fails_on_unknown_account() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let new_transaction = NewTransaction::new(
            account.id + 999,
            date!(2015 - 12 - 31),
            "place #1",
            100,
            TransactionKind::Debit,
            None,
        )
        .unwrap();

        let maybe_transaction = store.post(new_transaction);

        assert_eq!(maybe_transaction, Err(Error::AccountNotFound));

        // The aborted post must not have recorded anything.
        let transactions = store.get_filtered(TransactionFilter::default()).unwrap();
        assert_eq!(transactions, []);
    }

    #[test]
    fn reverse_restores_balance_and_removes_record() {
        let (account_store, mut store, account) = get_test_stores_and_account();

        let first = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );
        post(
            &mut store,
            account.id,
            date!(2016 - 02 - 03),
            "place #2",
            10,
            TransactionKind::Credit,
            "test",
        );
        post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #3",
            100,
            TransactionKind::Debit,
            "test",
        );

        assert_eq!(account_store.get(account.id).unwrap().balance, -190);

        let removed = store
            .reverse(account.id, first.id)
            .expect("Could not reverse transaction");

        assert_eq!(removed, first);
        assert_eq!(account_store.get(account.id).unwrap().balance, -90);

        let remaining = store.get_for_account(account.id).unwrap();
        assert!(!remaining.contains(&first));
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn reverse_undoes_credit_transactions() {
        let (account_store, mut store, account) = get_test_stores_and_account();

        let transaction = post(
            &mut store,
            account.id,
            date!(2016 - 02 - 03),
            "pay day",
            250,
            TransactionKind::Credit,
            "income",
        );

        store.reverse(account.id, transaction.id).unwrap();

        assert_eq!(account_store.get(account.id).unwrap().balance, 0);
    }

    #[test]
    fn reverse_same_transaction_twice_fails() {
        let (_account_store, mut store, account) = get_test_stores_and_account();
        let transaction = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );

        store.reverse(account.id, transaction.id).unwrap();
        let second_attempt = store.reverse(account.id, transaction.id);

        assert_eq!(second_attempt, Err(Error::TransactionNotFound));
    }

    #[test]
    fn reverse_fails_on_unknown_transaction() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let result = store.reverse(account.id, 1337);

        assert_eq!(result, Err(Error::TransactionNotFound));
    }

    #[test]
    fn reverse_rejects_transaction_from_other_account() {
        let (mut account_store, mut store, account) = get_test_stores_and_account();
        let other_account = account_store
            .create("Account2", AccountKind::Savings)
            .unwrap();
        let transaction = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );

        let result = store.reverse(other_account.id, transaction.id);

        assert_eq!(result, Err(Error::TransactionNotInAccount));

        // Neither account's balance may have changed.
        assert_eq!(account_store.get(account.id).unwrap().balance, -100);
        assert_eq!(account_store.get(other_account.id).unwrap().balance, 0);
    }

    #[test]
    fn get_transaction_by_id_succeeds() {
        let (_account_store, mut store, account) = get_test_stores_and_account();
        let transaction = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );

        let selected_transaction = store.get(transaction.id);

        assert_eq!(Ok(transaction), selected_transaction);
    }

    #[test]
    fn get_transaction_fails_on_invalid_id() {
        let (_account_store, mut store, account) = get_test_stores_and_account();
        let transaction = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );

        let maybe_transaction = store.get(transaction.id + 654);

        assert_eq!(maybe_transaction, Err(Error::TransactionNotFound));
    }

    #[test]
    fn get_for_account_orders_by_date_descending() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let oldest = post(
            &mut store,
            account.id,
            date!(2015 - 03 - 01),
            "place #3",
            30,
            TransactionKind::Debit,
            "grocery",
        );
        let newest = post(
            &mut store,
            account.id,
            date!(2016 - 04 - 03),
            "place #4",
            20,
            TransactionKind::Credit,
            "grocery",
        );
        let middle = post(
            &mut store,
            account.id,
            date!(2016 - 03 - 03),
            "place #5",
            21,
            TransactionKind::Credit,
            "gas",
        );

        let got = store.get_for_account(account.id).unwrap();

        assert_eq!(got, vec![newest, middle, oldest]);
    }

    #[test]
    fn get_for_account_breaks_date_ties_by_most_recent_insertion() {
        let (_account_store, mut store, account) = get_test_stores_and_account();
        let same_date = date!(2015 - 01 - 01);

        let first = post(
            &mut store,
            account.id,
            same_date,
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );
        let second = post(
            &mut store,
            account.id,
            same_date,
            "place #2",
            100,
            TransactionKind::Debit,
            "test",
        );

        let got = store.get_for_account(account.id).unwrap();

        assert_eq!(got, vec![second, first]);
    }

    #[test]
    fn get_for_account_with_unknown_account_returns_nothing() {
        let (_account_store, mut store, account) = get_test_stores_and_account();
        post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );

        let got = store.get_for_account(account.id + 999).unwrap();

        assert_eq!(got, []);
    }

    #[test]
    fn get_filtered_with_no_fields_returns_everything() {
        let (mut account_store, mut store, account) = get_test_stores_and_account();
        let other_account = account_store
            .create("Account2", AccountKind::Savings)
            .unwrap();

        post(
            &mut store,
            account.id,
            date!(2015 - 03 - 01),
            "place #3",
            30,
            TransactionKind::Debit,
            "test",
        );
        post(
            &mut store,
            other_account.id,
            date!(2016 - 04 - 03),
            "place #4",
            20,
            TransactionKind::Credit,
            "test",
        );

        let got = store.get_filtered(TransactionFilter::default()).unwrap();

        assert_eq!(got.len(), 2);
    }

    #[test]
    fn get_filtered_combines_fields_conjunctively() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let want = post(
            &mut store,
            account.id,
            date!(2016 - 03 - 03),
            "fuel stop",
            21,
            TransactionKind::Credit,
            "gas",
        );
        // Matches the kind but not the category.
        post(
            &mut store,
            account.id,
            date!(2016 - 04 - 03),
            "place #4",
            20,
            TransactionKind::Credit,
            "grocery",
        );
        // Matches the category but not the kind.
        post(
            &mut store,
            account.id,
            date!(2016 - 05 - 03),
            "fuel stop",
            25,
            TransactionKind::Debit,
            "gas",
        );

        let got = store
            .get_filtered(TransactionFilter {
                kind: Some(TransactionKind::Credit),
                category: Some(CategoryName::new_unchecked("gas")),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(got, vec![want]);
    }

    #[test]
    fn get_filtered_by_category_matches_exactly() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let want = post(
            &mut store,
            account.id,
            date!(2015 - 03 - 01),
            "place #3",
            30,
            TransactionKind::Debit,
            "gas",
        );
        // A label sharing a prefix must not match.
        post(
            &mut store,
            account.id,
            date!(2016 - 04 - 03),
            "place #4",
            20,
            TransactionKind::Debit,
            "gas station",
        );

        let got = store
            .get_filtered(TransactionFilter {
                category: Some(CategoryName::new_unchecked("gas")),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(got, vec![want]);
    }

    #[test]
    fn get_filtered_with_limit_truncates_results() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        for i in 1..=10 {
            let date = date!(2016 - 01 - 01)
                .checked_add(time::Duration::days(i))
                .unwrap();
            post(
                &mut store,
                account.id,
                date,
                &format!("transaction #{i}"),
                i,
                TransactionKind::Debit,
                "test",
            );
        }

        let got = store
            .get_filtered(TransactionFilter {
                limit: Some(5),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(got.len(), 5, "got {} transactions, want 5", got.len());
    }

    #[test]
    fn get_filtered_by_date() {
        let (_account_store, mut store, account) = get_test_stores_and_account();

        let want = post(
            &mut store,
            account.id,
            date!(2015 - 01 - 01),
            "place #1",
            100,
            TransactionKind::Debit,
            "test",
        );
        post(
            &mut store,
            account.id,
            date!(2016 - 02 - 03),
            "place #2",
            10,
            TransactionKind::Credit,
            "test",
        );

        let got = store
            .get_filtered(TransactionFilter {
                date: Some(date!(2015 - 01 - 01)),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(got, vec![want]);
    }
}
