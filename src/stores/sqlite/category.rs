//! Implements a SQLite backed category store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Category, CategoryName},
    stores::CategoryStore,
};

/// Maintains the distinct set of category labels in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCategoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteCategoryStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl CategoryStore for SQLiteCategoryStore {
    /// Register a category in the database.
    ///
    /// Registering a name that already exists is a no-op that returns the
    /// existing row, so this function is safe to call without checking
    /// membership first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error.
    fn add(&mut self, name: CategoryName) -> Result<Category, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO category (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            (name.as_ref(),),
        )?;

        // The insert reports no row id on conflict, so fetch by the unique
        // name to cover both the fresh and the already-registered case.
        let category = connection
            .prepare("SELECT id, name FROM category WHERE name = :name")?
            .query_row(&[(":name", &name.as_ref())], Self::map_row)?;

        Ok(category)
    }

    /// Whether `name` is a registered category.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error.
    fn contains(&self, name: &CategoryName) -> Result<bool, Error> {
        let contains = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT EXISTS (SELECT 1 FROM category WHERE name = :name)")?
            .query_row(&[(":name", &name.as_ref())], |row| row.get(0))?;

        Ok(contains)
    }

    /// Retrieve all categories in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error.
    fn get_all(&self) -> Result<Vec<Category>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name FROM category")?
            .query_map([], Self::map_row)?
            .map(|maybe_category| maybe_category.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SQLiteCategoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS category (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteCategoryStore {
    type ReturnType = Category;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;

        let raw_name: String = row.get(offset + 1)?;
        let name = CategoryName::new_unchecked(&raw_name);

        Ok(Category { id, name })
    }
}
