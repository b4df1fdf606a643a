//! # Value Module
//!
//! Runtime values that migration scripts insert or use as column defaults.
//! A value is never formatted on its own: it is always paired with the
//! [`SqlType`] of its column, in a [`Cell`].

use std::{fmt, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use indexmap::IndexMap;

use crate::{error::BoxError, types::SqlType};

/// Hook for opaque or application-defined types that know how to turn
/// themselves into a plain database value.
///
/// The returned value may itself be a [`Value::Custom`]; formatting unwraps
/// it recursively.
pub trait ToSqlValue: fmt::Debug + Send + Sync {
    fn to_sql_value(&self) -> Result<Value, BoxError>;
}

/// A runtime value, tagged with its Rust-side kind.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A string. For time-typed columns it is passed through verbatim, so
    /// that SQL expressions such as `CURRENT_TIMESTAMP` can be used.
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    /// A timestamp without offset, assumed to already be in UTC.
    NaiveDateTime(NaiveDateTime),
    DateTime(DateTime<FixedOffset>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Custom(Arc<dyn ToSqlValue>),
}

impl Value {
    /// Wraps a custom value.
    pub fn custom(value: impl ToSqlValue + 'static) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Short name of the value's kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::NaiveDateTime(_) => "naive datetime",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
            Value::Custom(_) => "custom",
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => NaiveDateTime,
    uuid::Uuid => Uuid,
    serde_json::Value => Json,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::DateTime(v.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A value paired with the explicit type of the column it targets.
#[derive(Debug, Clone)]
pub struct Cell {
    pub ty: SqlType,
    pub value: Value,
}

impl Cell {
    pub fn new(ty: SqlType, value: impl Into<Value>) -> Self {
        Self { ty, value: value.into() }
    }
}

/// The cells of one row, in insertion order, keyed by column name.
pub type Cells = IndexMap<String, Cell>;

/// Builds a [`Cells`] map from `(column, cell)` pairs.
pub fn cells<I, K>(pairs: I) -> Cells
where
    I: IntoIterator<Item = (K, Cell)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, c)| (k.into(), c)).collect()
}
