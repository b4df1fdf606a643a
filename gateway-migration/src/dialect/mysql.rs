//! MySQL dialect.
//!
//! Uses the standard `AUTO_INCREMENT` keyword. String literals must also
//! escape backslashes, which MySQL treats as an escape character by default.
//! TEXT and BLOB columns only accept expression defaults (MySQL 8.0.13+).

use crate::{
    builder::TableBuilder,
    database::Drivers,
    dialect::{
        Dialect, Typer,
        constraint::ConstraintMaker,
        formatter::{Formatter, format_value},
    },
    error::Result,
    types::{SqlType, TypeCode},
    value::Value,
};

pub(crate) const DIALECT: Dialect = Dialect {
    name: "mysql",
    driver: Drivers::MySQL,
    typer: &MySqlTyper,
    formatter: &MySqlFormatter,
    constraints: &MySqlConstraints,
};

pub struct MySqlTyper;

impl Typer for MySqlTyper {
    fn render(&self, ty: &SqlType) -> Result<String> {
        let native = match ty.code {
            // BOOLEAN is an alias of TINYINT(1); spell it out so the catalog
            // and the declaration agree.
            TypeCode::Boolean => "TINYINT(1)",
            TypeCode::TinyInt => "TINYINT",
            TypeCode::SmallInt => "SMALLINT",
            TypeCode::Integer => "INT",
            TypeCode::BigInt => "BIGINT",
            TypeCode::Float => "FLOAT",
            TypeCode::Double => "DOUBLE",
            // Without a length, fall back to the unbounded types.
            TypeCode::Varchar if ty.size == 0 => "TEXT",
            TypeCode::Varchar => return Ok(format!("VARCHAR({})", ty.size)),
            TypeCode::Text => "TEXT",
            TypeCode::Date => "DATE",
            TypeCode::Timestamp => "DATETIME(6)",
            // No zoned timestamp type: keep the offset as text.
            TypeCode::TimestampZ => "VARCHAR(64)",
            TypeCode::Binary if ty.size == 0 => "BLOB",
            TypeCode::Binary => return Ok(format!("BINARY({})", ty.size)),
            TypeCode::Blob => "BLOB",
        };
        Ok(native.to_string())
    }
}

pub struct MySqlFormatter;

impl Formatter for MySqlFormatter {
    fn quote(&self, s: &str) -> String {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
    }
}

pub struct MySqlConstraints;

impl ConstraintMaker for MySqlConstraints {
    fn make_default(
        &self,
        builder: &mut TableBuilder,
        formatter: &dyn Formatter,
        value: &Value,
        ty: &SqlType,
    ) -> Result<()> {
        let literal = format_value(formatter, value, ty)?;
        let col = builder.current_column()?;
        // The rendered type decides: unsized varchars and binaries become
        // TEXT and BLOB too.
        if col.ty == "TEXT" || col.ty == "BLOB" {
            col.add_constraint(format!("DEFAULT ({})", literal));
        } else {
            col.add_constraint(format!("DEFAULT {}", literal));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dialect::MYSQL, schema::Column};

    #[test]
    fn native_types() {
        let cases = [
            (SqlType::BOOLEAN, "TINYINT(1)"),
            (SqlType::TINYINT, "TINYINT"),
            (SqlType::INTEGER, "INT"),
            (SqlType::varchar(30), "VARCHAR(30)"),
            (SqlType::TIMESTAMP, "DATETIME(6)"),
            (SqlType::TIMESTAMPZ, "VARCHAR(64)"),
            (SqlType::binary(16), "BINARY(16)"),
            (SqlType::BLOB, "BLOB"),
        ];
        for (ty, expected) in cases {
            assert_eq!(MySqlTyper.render(&ty).unwrap(), expected);
        }
        assert_eq!(MySqlTyper.render(&SqlType::varchar(0)).unwrap(), "TEXT");
        assert_eq!(MySqlTyper.render(&SqlType::binary(0)).unwrap(), "BLOB");
    }

    #[test]
    fn backslashes_are_escaped() {
        let val = Value::from(r"C:\out\it's");
        assert_eq!(format_value(&MySqlFormatter, &val, &SqlType::TEXT).unwrap(), r"'C:\\out\\it''s'");
    }

    #[test]
    fn text_and_blob_defaults_are_expressions() {
        let comment = Column::new("comment", SqlType::TEXT).not_null().default_value("");
        assert_eq!(MYSQL.add_column("rules", &comment).unwrap(), vec!["ALTER TABLE rules ADD COLUMN comment TEXT NOT NULL DEFAULT ('')"]);

        let key = Column::new("key", SqlType::BLOB).default_value(vec![0xABu8]);
        assert_eq!(MYSQL.add_column("t", &key).unwrap(), vec!["ALTER TABLE t ADD COLUMN key BLOB DEFAULT (X'AB')"]);

        let path = Column::new("path", SqlType::varchar(0)).default_value("/");
        assert_eq!(MYSQL.add_column("t", &path).unwrap(), vec!["ALTER TABLE t ADD COLUMN path TEXT DEFAULT ('/')"]);

        let name = Column::new("name", SqlType::varchar(20)).default_value("");
        assert_eq!(MYSQL.add_column("t", &name).unwrap(), vec!["ALTER TABLE t ADD COLUMN name VARCHAR(20) DEFAULT ''"]);
        let perms = Column::new("perms", SqlType::binary(2)).default_value(vec![0u8, 0]);
        assert_eq!(MYSQL.add_column("t", &perms).unwrap(), vec!["ALTER TABLE t ADD COLUMN perms BINARY(2) DEFAULT X'0000'"]);
    }
}
