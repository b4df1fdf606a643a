//! # Schema Module
//!
//! The typed DDL model handed to the actions layer: column declarations,
//! their constraints, and table-level constraints.

use crate::{types::SqlType, value::Value};

/// A column-level rule.
#[derive(Debug, Clone)]
pub enum Constraint {
    PrimaryKey,
    ForeignKey { table: String, column: String },
    NotNull,
    /// Only valid on integer-coded columns.
    AutoIncrement,
    Unique,
    Default(Value),
}

/// A table-level rule spanning several columns.
#[derive(Debug, Clone)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
}

impl TableConstraint {
    pub fn primary_key<I, S>(cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableConstraint::PrimaryKey(cols.into_iter().map(Into::into).collect())
    }

    pub fn unique<I, S>(cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableConstraint::Unique(cols.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        match self {
            TableConstraint::PrimaryKey(cols) | TableConstraint::Unique(cols) => cols,
        }
    }
}

/// A column declaration.
///
/// Constraints are kept in declaration order and rendered in that order.
///
/// ```rust,ignore
/// let id = Column::new("id", SqlType::BIGINT).primary_key().auto_increment();
/// let name = Column::new("name", SqlType::varchar(50)).not_null();
/// ```
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
    pub constraints: Vec<Constraint>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self { name: name.into(), ty, constraints: Vec::new() }
    }

    pub fn with_constraints(name: impl Into<String>, ty: SqlType, constraints: Vec<Constraint>) -> Self {
        Self { name: name.into(), ty, constraints }
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn primary_key(self) -> Self {
        self.constraint(Constraint::PrimaryKey)
    }

    pub fn references(self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.constraint(Constraint::ForeignKey { table: table.into(), column: column.into() })
    }

    pub fn not_null(self) -> Self {
        self.constraint(Constraint::NotNull)
    }

    pub fn auto_increment(self) -> Self {
        self.constraint(Constraint::AutoIncrement)
    }

    pub fn unique(self) -> Self {
        self.constraint(Constraint::Unique)
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.constraint(Constraint::Default(value.into()))
    }
}

/// One entry of a `CREATE TABLE`: a column or a table-level constraint.
#[derive(Debug, Clone)]
pub enum Definition {
    Column(Column),
    Constraint(TableConstraint),
}

impl From<Column> for Definition {
    fn from(col: Column) -> Self {
        Definition::Column(col)
    }
}

impl From<TableConstraint> for Definition {
    fn from(c: TableConstraint) -> Self {
        Definition::Constraint(c)
    }
}
