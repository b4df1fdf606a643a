//! SQLite dialect.
//!
//! SQLite only has storage classes, so several codes collapse onto the same
//! native type. Auto-increments are realized with an `INTEGER PRIMARY KEY`
//! row-id alias plus the `AUTOINCREMENT` keyword.

use crate::{
    builder::TableBuilder,
    database::Drivers,
    dialect::{
        Dialect, Typer,
        constraint::{ConstraintMaker, check_auto_increment},
        formatter::StandardFormatter,
    },
    error::{Error, Result},
    types::{SqlType, TypeCode},
};

pub(crate) const DIALECT: Dialect = Dialect {
    name: "sqlite",
    driver: Drivers::SQLite,
    typer: &SqliteTyper,
    formatter: &StandardFormatter,
    constraints: &SqliteConstraints,
};

/// First SQLite release with native `ALTER TABLE ... DROP COLUMN`.
pub const DROP_COLUMN_MIN_VERSION: (u32, u32, u32) = (3, 35, 0);

pub struct SqliteTyper;

impl Typer for SqliteTyper {
    fn render(&self, ty: &SqlType) -> Result<String> {
        let native = match ty.code {
            TypeCode::Boolean
            | TypeCode::TinyInt
            | TypeCode::SmallInt
            | TypeCode::Integer
            | TypeCode::BigInt => "INTEGER",
            TypeCode::Float | TypeCode::Double => "REAL",
            TypeCode::Varchar | TypeCode::Text | TypeCode::TimestampZ => "TEXT",
            TypeCode::Date | TypeCode::Timestamp => "NUMERIC",
            TypeCode::Binary | TypeCode::Blob => "BLOB",
        };
        Ok(native.to_string())
    }
}

pub struct SqliteConstraints;

impl ConstraintMaker for SqliteConstraints {
    fn make_auto_increment(&self, builder: &mut TableBuilder, ty: &SqlType) -> Result<()> {
        check_auto_increment(builder, ty)?;
        let col = builder.current_column()?;
        col.set_type("INTEGER");
        col.primary_key_suffix = Some("AUTOINCREMENT");
        Ok(())
    }

    /// `AUTOINCREMENT` is only accepted on an `INTEGER PRIMARY KEY` column.
    fn finish_column(&self, builder: &mut TableBuilder) -> Result<()> {
        let table = builder.table_name().to_string();
        let col = builder.current_column()?;
        if col.primary_key_suffix.is_some() && !col.has_constraint("PRIMARY KEY") {
            return Err(Error::InvalidConstraint(format!(
                "auto-increment column {}.{} must also be the primary key on SQLite",
                table, col.name
            )));
        }
        Ok(())
    }
}

/// Parses the output of `SELECT sqlite_version()` (e.g. `3.45.1`).
pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.trim().split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Whether this SQLite release can drop columns natively.
pub fn supports_drop_column(version: &str) -> bool {
    parse_version(version).is_some_and(|v| v >= DROP_COLUMN_MIN_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_classes() {
        let cases = [
            (SqlType::BOOLEAN, "INTEGER"),
            (SqlType::TINYINT, "INTEGER"),
            (SqlType::BIGINT, "INTEGER"),
            (SqlType::FLOAT, "REAL"),
            (SqlType::DOUBLE, "REAL"),
            (SqlType::varchar(20), "TEXT"),
            (SqlType::TIMESTAMPZ, "TEXT"),
            (SqlType::DATE, "NUMERIC"),
            (SqlType::TIMESTAMP, "NUMERIC"),
            (SqlType::binary(16), "BLOB"),
            (SqlType::BLOB, "BLOB"),
        ];
        for (ty, expected) in cases {
            assert_eq!(SqliteTyper.render(&ty).unwrap(), expected);
        }
    }

    #[test]
    fn drop_column_support_by_version() {
        assert_eq!(parse_version("3.45.1"), Some((3, 45, 1)));
        assert_eq!(parse_version("3.35"), Some((3, 35, 0)));
        assert_eq!(parse_version("garbage"), None);
        assert!(supports_drop_column("3.35.0"));
        assert!(supports_drop_column("3.46.0"));
        assert!(!supports_drop_column("3.34.1"));
        assert!(!supports_drop_column(""));
    }
}
