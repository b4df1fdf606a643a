//! # Database Module
//!
//! Connection pooling, driver detection and catalog introspection for the
//! three supported engines. The catalog helpers are generic over the
//! executor so they run the same way on the pool and inside a migration
//! transaction.

// ============================================================================
// External Crate Imports
// ============================================================================

use log::debug;
use sqlx::{Any, AnyPool, Executor, Row};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    dialect::Dialect,
    error::{Error, Result},
    migration::{Migration, Migrator},
    transaction::Transaction,
};

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drivers {
    /// PostgreSQL driver
    Postgres,
    /// MySQL driver
    MySQL,
    /// SQLite driver
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL's scheme.
    ///
    /// Only schemes the SQLx `any` driver can connect with are accepted:
    /// MariaDB servers are reached through `mysql://`.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Drivers::Postgres),
            "mysql" => Ok(Drivers::MySQL),
            "sqlite" => Ok(Drivers::SQLite),
            other => Err(Error::UnknownDialect(other.to_string())),
        }
    }
}

// ============================================================================
// Database Struct
// ============================================================================

/// A pooled connection to the gateway database.
///
/// Cheap to clone: the pool is reference counted internally.
#[derive(Debug, Clone)]
pub struct Database {
    /// The underlying SQLx connection pool
    pub(crate) pool: AnyPool,
    /// The detected database driver
    pub(crate) driver: Drivers,
}

// ============================================================================
// Database Implementation
// ============================================================================

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Connects to a database using the provided connection string.
    pub async fn connect(url: &str) -> Result<Self> {
        DatabaseBuilder::new().connect(url).await
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    /// The built-in dialect matching the connection's driver.
    pub fn dialect(&self) -> Dialect {
        Dialect::for_driver(self.driver)
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Returns a migrator running `migrations` against this database.
    pub fn migrator<'a>(&'a self, migrations: &'a [Migration]) -> Migrator<'a> {
        Migrator::new(self, migrations)
    }

    /// Starts a new database transaction.
    pub async fn begin(&self) -> Result<Transaction> {
        let tx = self.pool.begin().await.map_err(|e| Error::database("failed to start transaction", e))?;
        Ok(Transaction { tx, driver: self.driver })
    }

    /// Checks if a table exists in the database.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(&self.pool, self.driver, table).await
    }

    /// Returns the current columns of a table, in catalog order.
    pub async fn get_table_columns(&self, table: &str) -> Result<Vec<String>> {
        table_columns(&self.pool, self.driver, table).await
    }

    /// Returns the current indexes of a table.
    pub async fn get_table_indexes(&self, table: &str) -> Result<Vec<String>> {
        table_indexes(&self.pool, self.driver, table).await
    }

    /// Returns every user table, sorted by name.
    pub async fn tables(&self) -> Result<Vec<String>> {
        tables(&self.pool, self.driver).await
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

/// Pool configuration applied before connecting.
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    max_connections: u32,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5 }
    }

    /// In-memory SQLite databases live per connection, so they need exactly
    /// one.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub async fn connect(self, url: &str) -> Result<Database> {
        let driver = Drivers::from_url(url)?;
        sqlx::any::install_default_drivers();

        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(url)
            .await
            .map_err(|e| Error::database("failed to connect to the database", e))?;

        debug!("connected to {:?} database (max {} connections)", driver, self.max_connections);
        Ok(Database { pool, driver })
    }
}

// ============================================================================
// Catalog Queries
// ============================================================================

pub(crate) async fn table_exists<'e, E>(executor: E, driver: Drivers, table: &str) -> Result<bool>
where
    E: Executor<'e, Database = Any>,
{
    let query = match driver {
        Drivers::Postgres => {
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = $1 AND table_schema = current_schema()"
        }
        Drivers::MySQL => {
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ? AND table_schema = DATABASE()"
        }
        Drivers::SQLite => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
    };

    let row = sqlx::query(query)
        .bind(table.to_string())
        .fetch_one(executor)
        .await
        .map_err(|e| Error::database(format!("failed to look up table '{}'", table), e))?;

    let count: i64 = row.try_get(0)?;
    Ok(count > 0)
}

pub(crate) async fn table_columns<'e, E>(executor: E, driver: Drivers, table: &str) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Any>,
{
    let query = match driver {
        Drivers::Postgres => {
            "SELECT column_name::TEXT FROM information_schema.columns \
             WHERE table_name = $1 AND table_schema = current_schema() ORDER BY ordinal_position"
        }
        Drivers::MySQL => {
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = ? AND table_schema = DATABASE() ORDER BY ordinal_position"
        }
        Drivers::SQLite => "SELECT name FROM pragma_table_info(?) ORDER BY cid",
    };

    fetch_names(executor, query, Some(table), format!("failed to list the columns of table '{}'", table)).await
}

pub(crate) async fn table_indexes<'e, E>(executor: E, driver: Drivers, table: &str) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Any>,
{
    let query = match driver {
        Drivers::Postgres => {
            "SELECT indexname::TEXT FROM pg_indexes WHERE tablename = $1 AND schemaname = current_schema() ORDER BY indexname"
        }
        Drivers::MySQL => {
            "SELECT DISTINCT index_name FROM information_schema.statistics \
             WHERE table_name = ? AND table_schema = DATABASE() ORDER BY index_name"
        }
        Drivers::SQLite => "SELECT name FROM pragma_index_list(?) ORDER BY name",
    };

    fetch_names(executor, query, Some(table), format!("failed to list the indexes of table '{}'", table)).await
}

pub(crate) async fn tables<'e, E>(executor: E, driver: Drivers) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Any>,
{
    let query = match driver {
        Drivers::Postgres => {
            "SELECT table_name::TEXT FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' ORDER BY table_name"
        }
        Drivers::MySQL => {
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name"
        }
        Drivers::SQLite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
    };

    fetch_names(executor, query, None, "failed to list tables".to_string()).await
}

async fn fetch_names<'e, E>(executor: E, query: &str, table: Option<&str>, context: String) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Any>,
{
    let mut q = sqlx::query(query);
    if let Some(table) = table {
        q = q.bind(table.to_string());
    }

    let rows = q.fetch_all(executor).await.map_err(|e| Error::database(context, e))?;

    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get(0)?;
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_from_url_scheme() {
        assert_eq!(Drivers::from_url("postgres://u:p@localhost/db").unwrap(), Drivers::Postgres);
        assert_eq!(Drivers::from_url("postgresql://localhost/db").unwrap(), Drivers::Postgres);
        assert_eq!(Drivers::from_url("mysql://localhost/db").unwrap(), Drivers::MySQL);
        assert_eq!(Drivers::from_url("sqlite::memory:").unwrap(), Drivers::SQLite);
        assert!(matches!(Drivers::from_url("oracle://db"), Err(Error::UnknownDialect(s)) if s == "oracle"));
        assert!(matches!(Drivers::from_url("mariadb://localhost/db"), Err(Error::UnknownDialect(s)) if s == "mariadb"));
    }

    #[tokio::test]
    async fn catalog_on_sqlite() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
        assert_eq!(db.dialect().name(), "sqlite");
        assert!(!db.table_exists("users").await?);

        sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").execute(db.pool()).await?;
        sqlx::query("CREATE UNIQUE INDEX UQE_users_name ON users (name)").execute(db.pool()).await?;

        assert!(db.table_exists("users").await?);
        assert_eq!(db.get_table_columns("users").await?, vec!["id", "name"]);
        assert_eq!(db.get_table_indexes("users").await?, vec!["UQE_users_name"]);
        assert_eq!(db.tables().await?, vec!["users"]);
        Ok(())
    }
}
