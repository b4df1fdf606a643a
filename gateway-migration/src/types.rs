//! # Types Module
//!
//! Abstract SQL column types. A [`SqlType`] is a dialect-independent type
//! code with an optional size; each dialect's typer turns it into a native
//! type name.

use std::fmt;

/// Dialect-independent SQL type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Varchar,
    Text,
    Date,
    Timestamp,
    TimestampZ,
    Binary,
    Blob,
}

impl TypeCode {
    /// Every type code, in declaration order.
    pub const ALL: [TypeCode; 14] = [
        TypeCode::Boolean,
        TypeCode::TinyInt,
        TypeCode::SmallInt,
        TypeCode::Integer,
        TypeCode::BigInt,
        TypeCode::Float,
        TypeCode::Double,
        TypeCode::Varchar,
        TypeCode::Text,
        TypeCode::Date,
        TypeCode::Timestamp,
        TypeCode::TimestampZ,
        TypeCode::Binary,
        TypeCode::Blob,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Boolean => "boolean",
            TypeCode::TinyInt => "tinyint",
            TypeCode::SmallInt => "smallint",
            TypeCode::Integer => "integer",
            TypeCode::BigInt => "bigint",
            TypeCode::Float => "float",
            TypeCode::Double => "double",
            TypeCode::Varchar => "varchar",
            TypeCode::Text => "text",
            TypeCode::Date => "date",
            TypeCode::Timestamp => "timestamp",
            TypeCode::TimestampZ => "timestampz",
            TypeCode::Binary => "binary",
            TypeCode::Blob => "blob",
        }
    }

    /// Rank of an integer code in the widening chain, `None` for non-integers.
    fn integer_rank(self) -> Option<u8> {
        match self {
            TypeCode::TinyInt => Some(0),
            TypeCode::SmallInt => Some(1),
            TypeCode::Integer => Some(2),
            TypeCode::BigInt => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column or value type: a type code plus a size for sized codes
/// (`VARCHAR(n)`, `BINARY(n)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlType {
    pub code: TypeCode,
    pub size: u64,
}

impl SqlType {
    pub const BOOLEAN: SqlType = SqlType::of(TypeCode::Boolean);
    pub const TINYINT: SqlType = SqlType::of(TypeCode::TinyInt);
    pub const SMALLINT: SqlType = SqlType::of(TypeCode::SmallInt);
    pub const INTEGER: SqlType = SqlType::of(TypeCode::Integer);
    pub const BIGINT: SqlType = SqlType::of(TypeCode::BigInt);
    pub const FLOAT: SqlType = SqlType::of(TypeCode::Float);
    pub const DOUBLE: SqlType = SqlType::of(TypeCode::Double);
    pub const TEXT: SqlType = SqlType::of(TypeCode::Text);
    pub const DATE: SqlType = SqlType::of(TypeCode::Date);
    pub const TIMESTAMP: SqlType = SqlType::of(TypeCode::Timestamp);
    pub const TIMESTAMPZ: SqlType = SqlType::of(TypeCode::TimestampZ);
    pub const BLOB: SqlType = SqlType::of(TypeCode::Blob);

    const fn of(code: TypeCode) -> Self {
        Self { code, size: 0 }
    }

    /// `VARCHAR(size)`.
    pub const fn varchar(size: u64) -> Self {
        Self { code: TypeCode::Varchar, size }
    }

    /// `BINARY(size)`.
    pub const fn binary(size: u64) -> Self {
        Self { code: TypeCode::Binary, size }
    }

    pub fn is_integer(&self) -> bool {
        self.code.integer_rank().is_some()
    }

    /// Whether a column of this type can be altered to `target` without
    /// losing data.
    ///
    /// The same code is always convertible. Otherwise only widening is
    /// allowed: any integer to a larger integer, `float` to `double` and
    /// `varchar` to `text`.
    pub fn can_convert_to(&self, target: &SqlType) -> bool {
        if self.code == target.code {
            return true;
        }

        if let (Some(from), Some(to)) = (self.code.integer_rank(), target.code.integer_rank()) {
            return from < to;
        }

        matches!(
            (self.code, target.code),
            (TypeCode::Float, TypeCode::Double) | (TypeCode::Varchar, TypeCode::Text)
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widening(from: TypeCode, to: TypeCode) -> bool {
        use TypeCode::*;
        matches!(
            (from, to),
            (TinyInt, SmallInt)
                | (TinyInt, Integer)
                | (TinyInt, BigInt)
                | (SmallInt, Integer)
                | (SmallInt, BigInt)
                | (Integer, BigInt)
                | (Float, Double)
                | (Varchar, Text)
        )
    }

    fn sized(code: TypeCode) -> SqlType {
        SqlType { code, size: 8 }
    }

    #[test]
    fn conversion_is_reflexive() {
        for code in TypeCode::ALL {
            assert!(sized(code).can_convert_to(&sized(code)), "{code} should convert to itself");
        }
    }

    #[test]
    fn conversion_matches_widening_table_exactly() {
        for from in TypeCode::ALL {
            for to in TypeCode::ALL {
                if from == to {
                    continue;
                }
                assert_eq!(
                    sized(from).can_convert_to(&sized(to)),
                    widening(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn narrowing_is_rejected() {
        assert!(!SqlType::BIGINT.can_convert_to(&SqlType::INTEGER));
        assert!(!SqlType::TEXT.can_convert_to(&SqlType::varchar(255)));
        assert!(!SqlType::DOUBLE.can_convert_to(&SqlType::FLOAT));
        assert!(!SqlType::varchar(10).can_convert_to(&SqlType::DOUBLE));
    }

    #[test]
    fn only_integer_codes_are_integers() {
        let integers: Vec<_> = TypeCode::ALL.into_iter().filter(|c| SqlType::of(*c).is_integer()).collect();
        assert_eq!(integers, vec![TypeCode::TinyInt, TypeCode::SmallInt, TypeCode::Integer, TypeCode::BigInt]);
    }
}
