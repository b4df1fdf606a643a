//! Constraint realization.
//!
//! Each constraint either appends an inline fragment to the current column,
//! appends a table-level fragment, or registers a side-effect statement on
//! the [`TableBuilder`]. Provided methods are the standard behaviour.

use crate::{
    builder::TableBuilder,
    dialect::formatter::{Formatter, format_value},
    error::{Error, Result},
    types::SqlType,
    value::Value,
};

pub trait ConstraintMaker: Send + Sync {
    fn make_primary_key(&self, builder: &mut TableBuilder) -> Result<()> {
        builder.current_column()?.add_constraint("PRIMARY KEY");
        Ok(())
    }

    fn make_foreign_key(&self, builder: &mut TableBuilder, table: &str, col: &str) -> Result<()> {
        builder.current_column()?.add_constraint(format!("REFERENCES {}({})", table, col));
        Ok(())
    }

    fn make_not_null(&self, builder: &mut TableBuilder) -> Result<()> {
        builder.current_column()?.add_constraint("NOT NULL");
        Ok(())
    }

    fn make_default(
        &self,
        builder: &mut TableBuilder,
        formatter: &dyn Formatter,
        value: &Value,
        ty: &SqlType,
    ) -> Result<()> {
        let literal = format_value(formatter, value, ty)?;
        builder.current_column()?.add_constraint(format!("DEFAULT {}", literal));
        Ok(())
    }

    /// Single-column uniqueness becomes a separately named unique index.
    fn make_unique(&self, builder: &mut TableBuilder) -> Result<()> {
        let col = builder.current_column()?.name.clone();
        builder.add_unique_index(&[col]);
        Ok(())
    }

    fn make_auto_increment(&self, builder: &mut TableBuilder, ty: &SqlType) -> Result<()> {
        check_auto_increment(builder, ty)?;
        builder.current_column()?.add_constraint("AUTO_INCREMENT");
        Ok(())
    }

    /// Called once every constraint of the current column is realized.
    fn finish_column(&self, _builder: &mut TableBuilder) -> Result<()> {
        Ok(())
    }

    fn make_primary_keys(&self, builder: &mut TableBuilder, cols: &[String]) -> Result<()> {
        check_composite(builder, cols, "primary key")?;
        builder.add_table_constraint(format!("PRIMARY KEY ({})", cols.join(", ")));
        Ok(())
    }

    fn make_uniques(&self, builder: &mut TableBuilder, cols: &[String]) -> Result<()> {
        check_composite(builder, cols, "unique")?;
        builder.add_unique_index(cols);
        Ok(())
    }
}

/// Auto-increments only make sense on integer-coded columns.
pub fn check_auto_increment(builder: &mut TableBuilder, ty: &SqlType) -> Result<()> {
    if ty.is_integer() {
        return Ok(());
    }

    let col = builder.current_column()?.name.clone();
    Err(Error::InvalidConstraint(format!(
        "auto-increments can only be used on integer types ({}.{} is {})",
        builder.table_name(),
        col,
        ty
    )))
}

fn check_composite(builder: &TableBuilder, cols: &[String], kind: &str) -> Result<()> {
    if cols.is_empty() {
        return Err(Error::InvalidConstraint(format!(
            "{} constraint on table '{}' has no columns",
            kind,
            builder.table_name()
        )));
    }
    Ok(())
}

/// The provided realizations, with the `AUTO_INCREMENT` keyword.
pub struct StandardConstraints;

impl ConstraintMaker for StandardConstraints {}
