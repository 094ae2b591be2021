//! This file defines the `Transaction` type, the core type of the ledger,
//! and the `NewTransaction` input value used to post one.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    models::{CategoryName, DatabaseID},
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` string as a calendar date.
///
/// This is a convenience for boundary layers that receive dates as strings.
///
/// # Errors
///
/// This function will return [Error::InvalidDate] if `input` is not a valid
/// date in that format.
pub fn parse_date(input: &str) -> Result<Date, Error> {
    Date::parse(input, DATE_FORMAT).map_err(|_| Error::InvalidDate(input.to_string()))
}

/// The direction of a transaction's effect on its account's balance.
///
/// The amount of a transaction is always non-negative; the kind alone
/// decides the sign of the balance delta. The rule is uniform across
/// account kinds, so a credit increases the balance even on a credit card
/// account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money flowing into the account. Increases the balance.
    #[serde(rename = "credit")]
    Credit,
    /// Money flowing out of the account. Decreases the balance.
    #[serde(rename = "debit")]
    Debit,
}

impl TransactionKind {
    /// The lowercase wire/storage literal for the transaction kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// The signed balance delta that a transaction of this kind and
    /// `amount` applies to its account.
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.to_lowercase().as_str() {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            _ => Err(Error::InvalidTransactionKind(string.to_string())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// A single dated financial event affecting exactly one account's balance.
///
/// A transaction is never mutated after it is created; rolling one back
/// removes the record outright and restores the balance it affected. New
/// instances should be created through
/// [TransactionStore::post](crate::stores::TransactionStore::post).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The id for the transaction.
    pub id: DatabaseID,
    /// The id of the account the transaction was posted against.
    pub account_id: DatabaseID,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money moved, in minor currency units. Never negative.
    pub amount: i64,
    /// Whether the amount was credited to or debited from the account.
    pub kind: TransactionKind,
    /// The category label used to group this transaction, if any.
    pub category: Option<CategoryName>,
}

/// The validated input for posting a new transaction against an account.
///
/// Constructing one through [NewTransaction::new] rejects malformed input;
/// the ids it carries are checked against the store when the transaction is
/// posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The id of the account to post against.
    pub account_id: DatabaseID,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money moved, in minor currency units.
    pub amount: i64,
    /// Whether the amount is credited to or debited from the account.
    pub kind: TransactionKind,
    /// The category label to group the transaction under, if any.
    pub category: Option<CategoryName>,
}

impl NewTransaction {
    /// Create a validated `NewTransaction`.
    ///
    /// # Errors
    ///
    /// This function will return:
    /// - [Error::EmptyDescription] if `description` is an empty string,
    /// - or [Error::NegativeAmount] if `amount` is negative.
    pub fn new(
        account_id: DatabaseID,
        date: Date,
        description: &str,
        amount: i64,
        kind: TransactionKind,
        category: Option<CategoryName>,
    ) -> Result<Self, Error> {
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        if amount < 0 {
            return Err(Error::NegativeAmount(amount));
        }

        Ok(Self {
            account_id,
            date,
            description: description.to_string(),
            amount,
            kind,
            category,
        })
    }
}

#[cfg(test)]
mod transaction_kind_tests {
    use crate::Error;

    use super::TransactionKind;

    #[test]
    fn parse_succeeds_on_known_kinds() {
        assert_eq!("credit".parse(), Ok(TransactionKind::Credit));
        assert_eq!("debit".parse(), Ok(TransactionKind::Debit));
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!("Debit".parse(), Ok(TransactionKind::Debit));
    }

    #[test]
    fn parse_fails_on_unknown_kind() {
        let result = "withdrawal".parse::<TransactionKind>();

        assert_eq!(
            result,
            Err(Error::InvalidTransactionKind("withdrawal".to_string()))
        );
    }

    #[test]
    fn credit_increases_and_debit_decreases() {
        assert_eq!(TransactionKind::Credit.signed(150), 150);
        assert_eq!(TransactionKind::Debit.signed(100), -100);
    }
}

#[cfg(test)]
mod new_transaction_tests {
    use time::macros::date;

    use crate::{Error, models::CategoryName};

    use super::{NewTransaction, TransactionKind};

    #[test]
    fn new_fails_on_empty_description() {
        let result = NewTransaction::new(
            1,
            date!(2016 - 03 - 30),
            "",
            150,
            TransactionKind::Credit,
            None,
        );

        assert_eq!(result, Err(Error::EmptyDescription));
    }

    #[test]
    fn new_fails_on_negative_amount() {
        let result = NewTransaction::new(
            1,
            date!(2016 - 03 - 30),
            "grocery run",
            -150,
            TransactionKind::Debit,
            None,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-150)));
    }

    #[test]
    fn new_succeeds_on_valid_input() {
        let result = NewTransaction::new(
            1,
            date!(2016 - 03 - 30),
            "grocery run",
            150,
            TransactionKind::Debit,
            Some(CategoryName::new_unchecked("grocery")),
        );

        assert!(result.is_ok());
    }
}

#[cfg(test)]
mod parse_date_tests {
    use time::macros::date;

    use crate::Error;

    use super::parse_date;

    #[test]
    fn parse_succeeds_on_calendar_date() {
        assert_eq!(parse_date("2015-12-31"), Ok(date!(2015 - 12 - 31)));
    }

    #[test]
    fn parse_fails_on_malformed_input() {
        let result = parse_date("31/12/2015");

        assert_eq!(result, Err(Error::InvalidDate("31/12/2015".to_string())));
    }

    #[test]
    fn parse_fails_on_impossible_date() {
        let result = parse_date("2015-02-31");

        assert_eq!(result, Err(Error::InvalidDate("2015-02-31".to_string())));
    }
}

#[cfg(test)]
mod transaction_serde_tests {
    use time::macros::date;

    use crate::models::CategoryName;

    use super::{Transaction, TransactionKind};

    /// The boundary layer serves transactions as JSON, so the wire shape is
    /// part of the contract: dates as `YYYY-MM-DD` strings and kinds as the
    /// lowercase literals.
    #[test]
    fn transaction_serializes_with_wire_literals() {
        let transaction = Transaction {
            id: 1,
            account_id: 2,
            date: date!(2015 - 12 - 31),
            description: "place #1".to_string(),
            amount: 100,
            kind: TransactionKind::Debit,
            category: Some(CategoryName::new_unchecked("grocery")),
        };

        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(json["date"], "2015-12-31");
        assert_eq!(json["kind"], "debit");
        assert_eq!(json["category"], "grocery");
    }
}
