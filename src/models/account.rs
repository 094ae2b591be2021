//! Defines the `Account` model and the closed set of account kinds.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, models::DatabaseID};

/// The kind of bookkeeping account.
///
/// Kinds are parsed case-insensitively from their wire literals and always
/// stored as the lowercase literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// A credit card account.
    ///
    /// Note that credits still increase the balance of a credit card
    /// account. The sign rule is uniform across account kinds.
    #[serde(rename = "credit card")]
    CreditCard,
    /// An everyday checking account.
    #[serde(rename = "checking")]
    Checking,
    /// A savings account.
    #[serde(rename = "savings")]
    Savings,
}

impl AccountKind {
    /// The lowercase wire/storage literal for the account kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::CreditCard => "credit card",
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
        }
    }
}

impl FromStr for AccountKind {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.to_lowercase().as_str() {
            "credit card" => Ok(AccountKind::CreditCard),
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            _ => Err(Error::InvalidAccountKind(string.to_string())),
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// A named financial account with a running balance.
///
/// New instances should be created through
/// [AccountStore::create](crate::stores::AccountStore::create); the balance
/// is owned by the store and only ever changes through transaction posting
/// and reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: DatabaseID,
    /// The unique, human readable name of the account.
    pub description: String,
    /// The kind of account.
    pub kind: AccountKind,
    /// The running balance in minor currency units (e.g. cents).
    ///
    /// Equal to the signed sum of the account's active transactions.
    pub balance: i64,
}
