//! Value-to-literal formatting.
//!
//! [`Formatter`] has one method per type code. The provided methods are the
//! standard SQL behaviour; dialects override only what differs.

use crate::{
    error::{Error, Result},
    types::{SqlType, TypeCode},
    value::Value,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Turns values into SQL literals for one dialect.
pub trait Formatter: Send + Sync {
    fn format_boolean(&self, val: &Value) -> Result<String> {
        match val {
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(mismatch(TypeCode::Boolean, other)),
        }
    }

    fn format_tinyint(&self, val: &Value) -> Result<String> {
        match val {
            Value::I8(i) => Ok(i.to_string()),
            other => Err(mismatch(TypeCode::TinyInt, other)),
        }
    }

    fn format_smallint(&self, val: &Value) -> Result<String> {
        match val {
            Value::I8(i) => Ok(i.to_string()),
            Value::I16(i) => Ok(i.to_string()),
            other => Err(mismatch(TypeCode::SmallInt, other)),
        }
    }

    fn format_integer(&self, val: &Value) -> Result<String> {
        match val {
            Value::I8(i) => Ok(i.to_string()),
            Value::I16(i) => Ok(i.to_string()),
            Value::I32(i) => Ok(i.to_string()),
            other => Err(mismatch(TypeCode::Integer, other)),
        }
    }

    fn format_bigint(&self, val: &Value) -> Result<String> {
        match val {
            Value::I8(i) => Ok(i.to_string()),
            Value::I16(i) => Ok(i.to_string()),
            Value::I32(i) => Ok(i.to_string()),
            Value::I64(i) => Ok(i.to_string()),
            other => Err(mismatch(TypeCode::BigInt, other)),
        }
    }

    fn format_float(&self, val: &Value) -> Result<String> {
        match val {
            Value::F32(f) if f.is_finite() => Ok(f.to_string()),
            other => Err(mismatch(TypeCode::Float, other)),
        }
    }

    fn format_double(&self, val: &Value) -> Result<String> {
        match val {
            Value::F32(f) if f.is_finite() => Ok(f.to_string()),
            Value::F64(f) if f.is_finite() => Ok(f.to_string()),
            other => Err(mismatch(TypeCode::Double, other)),
        }
    }

    fn format_varchar(&self, val: &Value) -> Result<String> {
        self.format_string(val, TypeCode::Varchar)
    }

    fn format_text(&self, val: &Value) -> Result<String> {
        self.format_string(val, TypeCode::Text)
    }

    fn format_date(&self, val: &Value) -> Result<String> {
        match val {
            Value::Date(d) => Ok(format!("'{}'", d.format(DATE_FORMAT))),
            Value::NaiveDateTime(dt) => Ok(format!("'{}'", dt.format(DATE_FORMAT))),
            Value::DateTime(dt) => Ok(format!("'{}'", dt.naive_utc().format(DATE_FORMAT))),
            Value::String(expr) => Ok(expr.clone()),
            other => Err(mismatch(TypeCode::Date, other)),
        }
    }

    /// Timestamps without time zone are normalized to UTC.
    fn format_timestamp(&self, val: &Value) -> Result<String> {
        match val {
            Value::NaiveDateTime(dt) => Ok(format!("'{}'", dt.format(TIMESTAMP_FORMAT))),
            Value::DateTime(dt) => Ok(format!("'{}'", dt.naive_utc().format(TIMESTAMP_FORMAT))),
            Value::String(expr) => Ok(expr.clone()),
            other => Err(mismatch(TypeCode::Timestamp, other)),
        }
    }

    /// Timestamps with time zone keep their offset.
    fn format_timestampz(&self, val: &Value) -> Result<String> {
        match val {
            Value::DateTime(dt) => Ok(format!("'{}'", dt.format(TIMESTAMPZ_FORMAT))),
            Value::NaiveDateTime(dt) => Ok(format!("'{}'", dt.and_utc().format(TIMESTAMPZ_FORMAT))),
            Value::String(expr) => Ok(expr.clone()),
            other => Err(mismatch(TypeCode::TimestampZ, other)),
        }
    }

    fn format_binary(&self, val: &Value) -> Result<String> {
        match val {
            Value::Bytes(b) => Ok(self.hex_literal(b)),
            other => Err(mismatch(TypeCode::Binary, other)),
        }
    }

    fn format_blob(&self, val: &Value) -> Result<String> {
        match val {
            Value::Bytes(b) => Ok(self.hex_literal(b)),
            other => Err(mismatch(TypeCode::Blob, other)),
        }
    }

    /// Shared body of the string-typed formatters.
    fn format_string(&self, val: &Value, code: TypeCode) -> Result<String> {
        match val {
            Value::String(s) => Ok(self.quote(s)),
            Value::Uuid(u) => Ok(self.quote(&u.to_string())),
            Value::Json(j) => Ok(self.quote(&j.to_string())),
            other => Err(mismatch(code, other)),
        }
    }

    fn quote(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn hex_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }
}

fn mismatch(code: TypeCode, val: &Value) -> Error {
    Error::mismatch(code.name(), format!("{} value", val.kind()))
}

/// The standard SQL formatter, used as-is by SQLite.
pub struct StandardFormatter;

impl Formatter for StandardFormatter {}

/// Formats `val` as a literal of type `ty`.
///
/// Custom values are unwrapped (recursively) before dispatching on the type
/// code. `NULL` is accepted for every type.
pub fn format_value(formatter: &dyn Formatter, val: &Value, ty: &SqlType) -> Result<String> {
    match val {
        Value::Custom(custom) => {
            let inner = custom.to_sql_value().map_err(Error::ValueExtraction)?;
            return format_value(formatter, &inner, ty);
        }
        Value::Null => return Ok("NULL".to_string()),
        _ => {}
    }

    match ty.code {
        TypeCode::Boolean => formatter.format_boolean(val),
        TypeCode::TinyInt => formatter.format_tinyint(val),
        TypeCode::SmallInt => formatter.format_smallint(val),
        TypeCode::Integer => formatter.format_integer(val),
        TypeCode::BigInt => formatter.format_bigint(val),
        TypeCode::Float => formatter.format_float(val),
        TypeCode::Double => formatter.format_double(val),
        TypeCode::Varchar => formatter.format_varchar(val),
        TypeCode::Text => formatter.format_text(val),
        TypeCode::Date => formatter.format_date(val),
        TypeCode::Timestamp => formatter.format_timestamp(val),
        TypeCode::TimestampZ => formatter.format_timestampz(val),
        TypeCode::Binary => formatter.format_binary(val),
        TypeCode::Blob => formatter.format_blob(val),
    }
}
