use sqlx::{Any, AnyConnection};

use crate::{
    database::{self, Drivers},
    error::{Error, Result},
};

/// A wrapper around a SQLx transaction.
///
/// Every statement of a migration batch runs on one of these. It is rolled
/// back if dropped without being committed.
#[derive(Debug)]
pub struct Transaction {
    pub(crate) tx: sqlx::Transaction<'static, Any>,
    pub(crate) driver: Drivers,
}

impl Transaction {
    pub fn driver(&self) -> Drivers {
        self.driver
    }

    /// The connection the transaction runs on.
    pub fn conn(&mut self) -> &mut AnyConnection {
        &mut self.tx
    }

    /// Checks if a table exists, as seen from inside the transaction.
    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        database::table_exists(&mut *self.tx, self.driver, table).await
    }

    pub async fn table_columns(&mut self, table: &str) -> Result<Vec<String>> {
        database::table_columns(&mut *self.tx, self.driver, table).await
    }

    /// Commits the transaction.
    ///
    /// Persists all changes made during the transaction to the database.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(|e| Error::database("failed to commit transaction", e))
    }

    /// Rolls back the transaction.
    ///
    /// Reverts all changes made during the transaction. This happens automatically
    /// if the `Transaction` is dropped without being committed, but this method
    /// allows for explicit rollback.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(|e| Error::database("failed to roll back transaction", e))
    }
}
