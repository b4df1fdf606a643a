//! # Dialect Module
//!
//! Per-engine SQL generation. A [`Dialect`] is composed of three small
//! pieces injected into one shared statement-building core:
//!
//! - a [`Typer`] rendering abstract types to native type names,
//! - a [`Formatter`] rendering values to literals,
//! - a [`ConstraintMaker`] realizing constraints.
//!
//! Behaviour that is not a matter of those three pieces (type changes,
//! column swaps) is dispatched explicitly on the dialect's driver.
//!
//! Dialects are looked up by name through a [`Registry`], populated once at
//! process start with [`Registry::with_builtins`].

use std::{collections::HashMap, fmt};

use crate::{
    builder::TableBuilder,
    database::Drivers,
    error::{Error, Result},
    schema::{Column, Constraint, Definition, TableConstraint},
    types::SqlType,
    value::{Cell, Cells, Value},
};

pub mod constraint;
pub mod formatter;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use constraint::{ConstraintMaker, StandardConstraints};
pub use formatter::{Formatter, StandardFormatter, format_value};

/// Renders abstract SQL types to native type names.
///
/// Rendering must be total: every type code maps to some native type, even
/// if approximated.
pub trait Typer: Send + Sync {
    fn render(&self, ty: &SqlType) -> Result<String>;
}

/// A database dialect: its name, driver and generation rules.
#[derive(Clone, Copy)]
pub struct Dialect {
    pub(crate) name: &'static str,
    pub(crate) driver: Drivers,
    pub(crate) typer: &'static dyn Typer,
    pub(crate) formatter: &'static dyn Formatter,
    pub(crate) constraints: &'static dyn ConstraintMaker,
}

pub const SQLITE: Dialect = sqlite::DIALECT;
pub const POSTGRESQL: Dialect = postgres::DIALECT;
pub const MYSQL: Dialect = mysql::DIALECT;

impl Dialect {
    /// The built-in dialect for a driver.
    pub fn for_driver(driver: Drivers) -> Dialect {
        match driver {
            Drivers::SQLite => SQLITE,
            Drivers::Postgres => POSTGRESQL,
            Drivers::MySQL => MYSQL,
        }
    }

    /// Canonical name: `sqlite`, `postgresql` or `mysql`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn render_type(&self, ty: &SqlType) -> Result<String> {
        self.typer.render(ty)
    }

    pub fn format_value(&self, value: &Value, ty: &SqlType) -> Result<String> {
        format_value(self.formatter, value, ty)
    }

    pub fn format_cell(&self, cell: &Cell) -> Result<String> {
        self.format_value(&cell.value, &cell.ty)
    }

    /// Adds `col` to `builder`, realizing its constraints in order.
    pub fn build_column(&self, builder: &mut TableBuilder, col: &Column) -> Result<()> {
        let ty = self.render_type(&col.ty)?;
        builder.add_column(&col.name, ty)?;

        for constraint in &col.constraints {
            let maker = self.constraints;
            match constraint {
                Constraint::PrimaryKey => maker.make_primary_key(builder)?,
                Constraint::ForeignKey { table, column } => maker.make_foreign_key(builder, table, column)?,
                Constraint::NotNull => maker.make_not_null(builder)?,
                Constraint::AutoIncrement => maker.make_auto_increment(builder, &col.ty)?,
                Constraint::Unique => maker.make_unique(builder)?,
                Constraint::Default(value) => maker.make_default(builder, self.formatter, value, &col.ty)?,
            }
        }
        self.constraints.finish_column(builder)
    }

    pub fn build_table_constraint(&self, builder: &mut TableBuilder, constraint: &TableConstraint) -> Result<()> {
        match constraint {
            TableConstraint::PrimaryKey(cols) => self.constraints.make_primary_keys(builder, cols),
            TableConstraint::Unique(cols) => self.constraints.make_uniques(builder, cols),
        }
    }

    /// `CREATE TABLE` plus index statements. Table-level constraints are
    /// applied after every column, whatever their position in `defs`.
    pub fn create_table(&self, table: &str, defs: &[Definition]) -> Result<Vec<String>> {
        let mut builder = TableBuilder::new(table);

        for def in defs {
            if let Definition::Column(col) = def {
                self.build_column(&mut builder, col)?;
            }
        }
        for def in defs {
            if let Definition::Constraint(constraint) = def {
                self.build_table_constraint(&mut builder, constraint)?;
            }
        }

        builder.create_table()
    }

    /// `ALTER TABLE ... ADD COLUMN` plus index statements.
    pub fn add_column(&self, table: &str, col: &Column) -> Result<Vec<String>> {
        let mut builder = TableBuilder::new(table);
        self.build_column(&mut builder, col)?;
        builder.add_column_statements()
    }

    /// `INSERT` of one row, in the cells' insertion order.
    pub fn insert(&self, table: &str, values: &Cells) -> Result<String> {
        if values.is_empty() {
            return Err(Error::InvalidDefinition(format!("no values to insert into table '{}'", table)));
        }

        let mut cols = Vec::with_capacity(values.len());
        let mut literals = Vec::with_capacity(values.len());
        for (col, cell) in values {
            cols.push(col.as_str());
            literals.push(self.format_cell(cell)?);
        }

        Ok(format!("INSERT INTO {} ({}) VALUES ({})", table, cols.join(", "), literals.join(", ")))
    }

    pub fn rename_table(&self, old: &str, new: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {}", old, new)
    }

    pub fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {}", table)
    }

    pub fn rename_column(&self, table: &str, old: &str, new: &str) -> String {
        format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, old, new)
    }

    pub fn drop_column(&self, table: &str, col: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {}", table, col)
    }

    /// Statement changing a column's type, or `None` when the dialect needs
    /// no statement for a compatible change (SQLite's dynamic typing).
    ///
    /// On MySQL the statement is `MODIFY COLUMN`, which re-declares the column
    /// with the new type only: `NOT NULL` and `DEFAULT` are dropped and must be
    /// restated by the caller.
    pub fn change_column_type(&self, table: &str, col: &str, from: &SqlType, to: &SqlType) -> Result<Option<String>> {
        if !from.can_convert_to(to) {
            return Err(Error::IncompatibleType { from: *from, to: *to });
        }

        match self.driver {
            Drivers::SQLite => Ok(None),
            Drivers::Postgres => {
                let ty = self.render_type(to)?;
                Ok(Some(format!("ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}", table, col, ty, col, ty)))
            }
            Drivers::MySQL => {
                let ty = self.render_type(to)?;
                Ok(Some(format!("ALTER TABLE {} MODIFY COLUMN {} {}", table, col, ty)))
            }
        }
    }

    /// Statement exchanging the values of two same-typed columns on the rows
    /// matching `cond` (every row if `cond` is empty).
    ///
    /// MySQL evaluates `SET` assignments left to right, so it goes through a
    /// session variable. SQLite and PostgreSQL evaluate every right-hand side
    /// against the original row.
    pub fn swap_columns(&self, table: &str, col1: &str, col2: &str, cond: &str) -> String {
        let set = match self.driver {
            Drivers::MySQL => format!("{a} = (@temp := {a}), {a} = {b}, {b} = @temp", a = col1, b = col2),
            Drivers::SQLite | Drivers::Postgres => format!("{a} = {b}, {b} = {a}", a = col1, b = col2),
        };

        let mut query = format!("UPDATE {} SET {}", table, set);
        if !cond.trim().is_empty() {
            query.push_str(" WHERE ");
            query.push_str(cond);
        }
        query
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect").field("name", &self.name).field("driver", &self.driver).finish()
    }
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.driver == other.driver
    }
}

/// Name → dialect lookup table.
///
/// Nothing is registered implicitly: build one with
/// [`Registry::with_builtins`] (or [`Registry::new`] and
/// [`Registry::register`]) when the process starts.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    dialects: HashMap<String, Dialect>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding SQLite, PostgreSQL (also as `postgres`) and MySQL.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(SQLITE.name, SQLITE);
        registry.register(POSTGRESQL.name, POSTGRESQL);
        registry.register("postgres", POSTGRESQL);
        registry.register(MYSQL.name, MYSQL);
        registry
    }

    pub fn register(&mut self, name: &str, dialect: Dialect) -> &mut Self {
        self.dialects.insert(name.to_ascii_lowercase(), dialect);
        self
    }

    pub fn get(&self, name: &str) -> Result<Dialect> {
        self.dialects.get(&name.to_ascii_lowercase()).copied().ok_or_else(|| Error::UnknownDialect(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        types::TypeCode,
        value::{Cell, cells},
    };

    const ALL: [Dialect; 3] = [SQLITE, POSTGRESQL, MYSQL];

    #[test]
    fn every_type_renders_on_every_dialect() {
        for dialect in ALL {
            for code in TypeCode::ALL {
                for size in [0, 16] {
                    let ty = SqlType { code, size };
                    assert!(dialect.render_type(&ty).is_ok(), "{} cannot render {} ({})", dialect.name(), code, size);
                }
            }
        }
    }

    #[test]
    fn auto_increment_on_varchar_is_invalid_everywhere() {
        let col = Column::new("name", SqlType::varchar(50)).auto_increment();
        for dialect in ALL {
            let err = dialect.create_table("t", &[col.clone().into()]).unwrap_err();
            assert!(matches!(err, Error::InvalidConstraint(_)), "{}: {err}", dialect.name());
            let err = dialect.add_column("t", &col).unwrap_err();
            assert!(matches!(err, Error::InvalidConstraint(_)), "{}: {err}", dialect.name());
        }
    }

    #[test]
    fn auto_increment_realization_differs_per_dialect() {
        let defs: Vec<Definition> = vec![
            Column::new("id", SqlType::BIGINT).primary_key().auto_increment().into(),
            Column::new("name", SqlType::varchar(50)).not_null().into(),
        ];

        assert_eq!(
            SQLITE.create_table("users", &defs).unwrap(),
            vec!["CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)"]
        );
        assert_eq!(
            POSTGRESQL.create_table("users", &defs).unwrap(),
            vec!["CREATE TABLE users (id BIGSERIAL PRIMARY KEY, name VARCHAR(50) NOT NULL)"]
        );
        assert_eq!(
            MYSQL.create_table("users", &defs).unwrap(),
            vec!["CREATE TABLE users (id BIGINT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(50) NOT NULL)"]
        );
    }

    #[test]
    fn sqlite_autoincrement_follows_primary_key() {
        let expected = vec!["CREATE TABLE t (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT)"];
        let pk_first = Column::new("id", SqlType::BIGINT).not_null().primary_key().auto_increment();
        let pk_last = Column::new("id", SqlType::BIGINT).not_null().auto_increment().primary_key();
        assert_eq!(SQLITE.create_table("t", &[pk_first.into()]).unwrap(), expected);
        assert_eq!(SQLITE.create_table("t", &[pk_last.clone().into()]).unwrap(), expected);

        assert_eq!(
            MYSQL.create_table("t", &[pk_last.into()]).unwrap(),
            vec!["CREATE TABLE t (id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY)"]
        );

        let no_pk = Column::new("id", SqlType::BIGINT).auto_increment();
        assert!(matches!(SQLITE.create_table("t", &[no_pk.clone().into()]), Err(Error::InvalidConstraint(_))));
        assert!(matches!(SQLITE.add_column("t", &no_pk), Err(Error::InvalidConstraint(_))));
    }

    #[test]
    fn serial_type_follows_integer_width() {
        let small = Column::new("id", SqlType::TINYINT).auto_increment();
        let int = Column::new("id", SqlType::INTEGER).auto_increment();
        assert_eq!(POSTGRESQL.add_column("t", &small).unwrap(), vec!["ALTER TABLE t ADD COLUMN id SMALLSERIAL"]);
        assert_eq!(POSTGRESQL.add_column("t", &int).unwrap(), vec!["ALTER TABLE t ADD COLUMN id SERIAL"]);
    }

    #[test]
    fn uniques_become_named_indexes() {
        let defs: Vec<Definition> = vec![
            Column::new("owner", SqlType::TEXT).not_null().into(),
            Column::new("name", SqlType::varchar(100)).unique().into(),
            TableConstraint::unique(["owner", "name"]).into(),
        ];

        let statements = POSTGRESQL.create_table("agents", &defs).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE agents (owner TEXT NOT NULL, name VARCHAR(100))",
                "CREATE UNIQUE INDEX UQE_agents_name ON agents (name)",
                "CREATE UNIQUE INDEX UQE_agents_owner_name ON agents (owner, name)",
            ]
        );
        assert_eq!(statements, POSTGRESQL.create_table("agents", &defs).unwrap());
    }

    #[test]
    fn composite_primary_key_and_foreign_key() {
        let defs: Vec<Definition> = vec![
            TableConstraint::primary_key(["rule_id", "object_id"]).into(),
            Column::new("rule_id", SqlType::BIGINT).references("rules", "id").into(),
            Column::new("object_id", SqlType::BIGINT).into(),
        ];
        assert_eq!(
            SQLITE.create_table("rule_access", &defs).unwrap(),
            vec![
                "CREATE TABLE rule_access (rule_id INTEGER REFERENCES rules(id), object_id INTEGER, \
                 PRIMARY KEY (rule_id, object_id))"
            ]
        );

        let empty: Vec<Definition> = vec![
            Column::new("a", SqlType::TEXT).into(),
            TableConstraint::Unique(Vec::new()).into(),
        ];
        assert!(matches!(SQLITE.create_table("t", &empty), Err(Error::InvalidConstraint(_))));
    }

    #[test]
    fn defaults_are_formatted_with_the_column_type() {
        let col = Column::new("enabled", SqlType::BOOLEAN).not_null().default_value(true);
        assert_eq!(MYSQL.add_column("t", &col).unwrap(), vec!["ALTER TABLE t ADD COLUMN enabled TINYINT(1) NOT NULL DEFAULT true"]);

        let bad = Column::new("count", SqlType::INTEGER).default_value("zero");
        assert!(matches!(SQLITE.add_column("t", &bad), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn binary_literals_per_dialect() {
        let row = cells([("bin", Cell::new(SqlType::BLOB, vec![0x00u8, 0xFF]))]);
        assert_eq!(SQLITE.insert("t", &row).unwrap(), "INSERT INTO t (bin) VALUES (X'00FF')");
        assert_eq!(MYSQL.insert("t", &row).unwrap(), "INSERT INTO t (bin) VALUES (X'00FF')");
        assert_eq!(POSTGRESQL.insert("t", &row).unwrap(), "INSERT INTO t (bin) VALUES ('\\x00FF')");
    }

    #[test]
    fn change_column_type_per_dialect() {
        let from = SqlType::varchar(10);
        assert_eq!(SQLITE.change_column_type("t", "str", &from, &SqlType::TEXT).unwrap(), None);
        assert_eq!(
            POSTGRESQL.change_column_type("t", "str", &from, &SqlType::TEXT).unwrap().unwrap(),
            "ALTER TABLE t ALTER COLUMN str TYPE TEXT USING str::TEXT"
        );
        assert_eq!(
            MYSQL.change_column_type("t", "str", &from, &SqlType::TEXT).unwrap().unwrap(),
            "ALTER TABLE t MODIFY COLUMN str TEXT"
        );
        for dialect in ALL {
            let err = dialect.change_column_type("t", "str", &from, &SqlType::DOUBLE).unwrap_err();
            assert_eq!(err.to_string(), "cannot convert from type varchar to type double");
        }
    }

    #[test]
    fn swap_columns_per_dialect() {
        assert_eq!(
            MYSQL.swap_columns("rules", "local_dir", "remote_dir", "send=true"),
            "UPDATE rules SET local_dir = (@temp := local_dir), local_dir = remote_dir, remote_dir = @temp WHERE send=true"
        );
        assert_eq!(
            SQLITE.swap_columns("rules", "local_dir", "remote_dir", ""),
            "UPDATE rules SET local_dir = remote_dir, remote_dir = local_dir"
        );
    }

    #[test]
    fn registry_lookup() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.get("PostgreSQL").unwrap(), POSTGRESQL);
        assert_eq!(registry.get("postgres").unwrap(), POSTGRESQL);
        assert_eq!(registry.get("sqlite").unwrap(), SQLITE);
        assert!(matches!(registry.get("oracle"), Err(Error::UnknownDialect(_))));
        assert!(matches!(Registry::new().get("sqlite"), Err(Error::UnknownDialect(_))));
    }
}
