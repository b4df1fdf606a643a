//! # Gateway Migration
//!
//! Dialect-abstracted DDL generation and a transactional, versioned migration
//! runner for the gateway's SQL schema on SQLite, PostgreSQL and MySQL.
//!
//! Migration scripts describe schema changes with typed declarations
//! ([`Column`], [`Constraint`], [`Cell`]) through an [`Actions`] value bound
//! to one batch transaction. The [`Migrator`] runs batches forward or
//! backward, all-or-nothing, and can capture the generated SQL instead of
//! executing it.
//!
//! ```rust,ignore
//! use gateway_migration::{Database, Registry};
//!
//! let db = Database::connect("sqlite://gateway.db").await?;
//! let plan = db.migrator(MIGRATIONS).migrate_to("latest").await?;
//! ```

pub mod actions;
pub mod builder;
pub mod database;
pub mod dialect;
pub mod error;
pub mod migration;
pub mod schema;
pub mod transaction;
pub mod types;
pub mod value;
pub mod version;
pub mod writer;

pub use actions::Actions;
pub use builder::TableBuilder;
pub use database::{Database, DatabaseBuilder, Drivers};
pub use dialect::{Dialect, MYSQL, POSTGRESQL, Registry, SQLITE};
pub use error::{BoxError, Error, Result};
pub use migration::{Migration, Migrator, Script, Step};
pub use schema::{Column, Constraint, Definition, TableConstraint};
pub use transaction::Transaction;
pub use types::{SqlType, TypeCode};
pub use value::{Cell, Cells, ToSqlValue, Value, cells};
pub use version::{LATEST, Plan, VERSION_TABLE, bootstrap_script};
pub use writer::{QueryWriter, Sink};

/// Re-exported so scripts can name their step return type.
pub use futures::future::BoxFuture;
