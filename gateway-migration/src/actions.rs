//! # Actions Module
//!
//! The mutation surface handed to migration scripts. Each action asks the
//! bound [`Dialect`] for its statements and routes them through the batch's
//! [`QueryWriter`], so the same script can be executed, captured, or both.

use std::fmt::Display;

use log::debug;
use sqlx::{Row, any::AnyRow};

use crate::{
    database::Drivers,
    dialect::{Dialect, sqlite},
    error::{Error, Result},
    schema::{Column, Definition},
    types::SqlType,
    value::{Cell, Cells},
    writer::QueryWriter,
};

/// Dialect-bound schema actions over one batch transaction.
#[derive(Debug)]
pub struct Actions {
    writer: QueryWriter,
    dialect: Dialect,
}

impl Actions {
    pub fn new(writer: QueryWriter, dialect: Dialect) -> Self {
        Self { writer, dialect }
    }

    /// The dialect statements are generated for. Scripts branch on
    /// `dialect().name()` for raw SQL that differs per engine.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The literal `cell` renders to in this dialect, for raw statements.
    pub fn format_value(&self, cell: &Cell) -> Result<String> {
        self.dialect.format_cell(cell)
    }

    /// Runs a raw statement, substituting `args` for its `?` placeholders.
    ///
    /// ```rust,ignore
    /// let now = actions.format_value(&Cell::new(SqlType::TIMESTAMP, Utc::now()))?;
    /// actions.exec("UPDATE transfers SET start = ? WHERE start IS NULL", &[&now]).await?;
    /// ```
    pub async fn exec(&mut self, query: &str, args: &[&(dyn Display + Sync)]) -> Result<()> {
        self.writer.exec(query, args).await
    }

    /// Runs a read query. Always executed, even during a dry-run.
    pub async fn query(&mut self, query: &str) -> Result<Vec<AnyRow>> {
        self.writer.query(query).await
    }

    async fn exec_all(&mut self, statements: Vec<String>) -> Result<()> {
        for statement in statements {
            self.writer.exec(&statement, &[]).await?;
        }
        Ok(())
    }

    pub async fn create_table(&mut self, table: &str, defs: &[Definition]) -> Result<()> {
        let statements = self.dialect.create_table(table, defs)?;
        self.exec_all(statements).await
    }

    pub async fn add_column(&mut self, table: &str, col: &Column) -> Result<()> {
        let statements = self.dialect.add_column(table, col)?;
        self.exec_all(statements).await
    }

    /// Inserts one row. Every value carries its column's explicit type.
    pub async fn add_row(&mut self, table: &str, values: &Cells) -> Result<()> {
        let statement = self.dialect.insert(table, values)?;
        self.writer.exec(&statement, &[]).await
    }

    pub async fn rename_table(&mut self, old: &str, new: &str) -> Result<()> {
        let statement = self.dialect.rename_table(old, new);
        self.writer.exec(&statement, &[]).await
    }

    pub async fn drop_table(&mut self, table: &str) -> Result<()> {
        let statement = self.dialect.drop_table(table);
        self.writer.exec(&statement, &[]).await
    }

    pub async fn rename_column(&mut self, table: &str, old: &str, new: &str) -> Result<()> {
        let statement = self.dialect.rename_column(table, old, new);
        self.writer.exec(&statement, &[]).await
    }

    /// Changes a column's type. Only lossless widenings are accepted.
    ///
    /// On MySQL the column loses its `NOT NULL` and `DEFAULT`, see
    /// [`Dialect::change_column_type`].
    pub async fn change_column_type(&mut self, table: &str, col: &str, from: &SqlType, to: &SqlType) -> Result<()> {
        match self.dialect.change_column_type(table, col, from, to)? {
            Some(statement) => self.writer.exec(&statement, &[]).await,
            None => {
                debug!("{}.{}: {} -> {} needs no statement on {}", table, col, from, to, self.dialect.name());
                Ok(())
            }
        }
    }

    /// Drops a column. SQLite releases without native support get the
    /// shadow-table rebuild instead.
    pub async fn drop_column(&mut self, table: &str, col: &str) -> Result<()> {
        if self.dialect.driver() == Drivers::SQLite {
            let version = self.sqlite_version().await?;
            if !sqlite::supports_drop_column(&version) {
                debug!("SQLite {} cannot drop columns natively, rebuilding {}", version, table);
                return self.drop_column_by_copy(table, col).await;
            }
        }

        let statement = self.dialect.drop_column(table, col);
        self.writer.exec(&statement, &[]).await
    }

    /// Exchanges the values of two same-typed columns on every row matching
    /// `cond` (all rows when empty).
    ///
    /// ```rust,ignore
    /// actions.swap_columns("rules", "local_dir", "remote_dir", "send=true").await?;
    /// ```
    pub async fn swap_columns(&mut self, table: &str, col1: &str, col2: &str, cond: &str) -> Result<()> {
        let statement = self.dialect.swap_columns(table, col1, col2, cond);
        self.writer.exec(&statement, &[]).await
    }

    async fn sqlite_version(&mut self) -> Result<String> {
        let rows = self.writer.query("SELECT sqlite_version()").await?;
        let row = rows
            .first()
            .ok_or_else(|| Error::InvalidDefinition("SQLite returned no version".to_string()))?;
        Ok(row.try_get::<String, _>(0)?)
    }

    /// Rebuilds `table` without `col`: copy the remaining columns into a
    /// shadow table, drop the original, rename the shadow.
    ///
    /// The copy keeps the data but not the constraints of the original.
    pub(crate) async fn drop_column_by_copy(&mut self, table: &str, col: &str) -> Result<()> {
        let columns = self.writer.transaction().table_columns(table).await?;
        if !columns.iter().any(|c| c == col) {
            return Err(Error::InvalidDefinition(format!("table '{}' has no column '{}'", table, col)));
        }

        let remaining: Vec<&str> = columns.iter().map(String::as_str).filter(|c| *c != col).collect();
        if remaining.is_empty() {
            return Err(Error::InvalidDefinition(format!("cannot drop the last column of table '{}'", table)));
        }

        let shadow = format!("{}_new", table);
        let copy = format!("CREATE TABLE {} AS SELECT {} FROM {}", shadow, remaining.join(", "), table);
        self.writer.exec(&copy, &[]).await?;
        self.drop_table(table).await?;
        self.rename_table(&shadow, table).await
    }

    pub(crate) fn writer_mut(&mut self) -> &mut QueryWriter {
        &mut self.writer
    }

    pub(crate) fn into_writer(self) -> QueryWriter {
        self.writer
    }
}
