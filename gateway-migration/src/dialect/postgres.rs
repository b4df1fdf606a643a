//! PostgreSQL dialect.
//!
//! Auto-increments are expressed through the serial pseudo-types instead of
//! a column keyword, and binary literals use the `'\x..'` escape form.

use crate::{
    builder::TableBuilder,
    database::Drivers,
    dialect::{
        Dialect, Typer,
        constraint::{ConstraintMaker, check_auto_increment},
        formatter::Formatter,
    },
    error::Result,
    types::{SqlType, TypeCode},
};

pub(crate) const DIALECT: Dialect = Dialect {
    name: "postgresql",
    driver: Drivers::Postgres,
    typer: &PostgresTyper,
    formatter: &PostgresFormatter,
    constraints: &PostgresConstraints,
};

pub struct PostgresTyper;

impl Typer for PostgresTyper {
    fn render(&self, ty: &SqlType) -> Result<String> {
        let native = match ty.code {
            TypeCode::Boolean => "BOOL",
            TypeCode::TinyInt | TypeCode::SmallInt => "INT2",
            TypeCode::Integer => "INT4",
            TypeCode::BigInt => "INT8",
            TypeCode::Float => "FLOAT4",
            TypeCode::Double => "FLOAT8",
            // VARCHAR without a length modifier is unbounded.
            TypeCode::Varchar if ty.size == 0 => "VARCHAR",
            TypeCode::Varchar => return Ok(format!("VARCHAR({})", ty.size)),
            TypeCode::Text => "TEXT",
            TypeCode::Date => "DATE",
            TypeCode::Timestamp => "TIMESTAMP",
            TypeCode::TimestampZ => "TIMESTAMPTZ",
            // BYTEA has no length modifier.
            TypeCode::Binary | TypeCode::Blob => "BYTEA",
        };
        Ok(native.to_string())
    }
}

pub struct PostgresFormatter;

impl Formatter for PostgresFormatter {
    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'", hex::encode_upper(bytes))
    }
}

pub struct PostgresConstraints;

impl ConstraintMaker for PostgresConstraints {
    fn make_auto_increment(&self, builder: &mut TableBuilder, ty: &SqlType) -> Result<()> {
        check_auto_increment(builder, ty)?;
        let serial = match ty.code {
            TypeCode::TinyInt | TypeCode::SmallInt => "SMALLSERIAL",
            TypeCode::Integer => "SERIAL",
            _ => "BIGSERIAL",
        };
        builder.current_column()?.set_type(serial);
        Ok(())
    }
}
