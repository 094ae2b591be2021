//! Defines the category store trait.

use crate::{
    Error,
    models::{Category, CategoryName},
};

/// Maintains the distinct set of category labels used to group
/// transactions.
pub trait CategoryStore {
    /// Register `name` as a category and return it.
    ///
    /// Adding a name that is already registered is a no-op that returns the
    /// existing category; this function never fails on duplicates.
    fn add(&mut self, name: CategoryName) -> Result<Category, Error>;

    /// Whether `name` is a registered category.
    fn contains(&self, name: &CategoryName) -> Result<bool, Error>;

    /// Retrieve all registered categories. No ordering is guaranteed.
    fn get_all(&self) -> Result<Vec<Category>, Error>;
}
