//! # Error Module
//!
//! Error type shared by every layer of the migration engine, from type
//! rendering up to the transactional migrator.

use thiserror::Error;

use crate::types::SqlType;

/// Boxed error returned by custom value extraction hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while generating or applying schema migrations.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested dialect has no registered implementation.
    #[error("unknown database dialect '{0}'")]
    UnknownDialect(String),

    /// A type code cannot be rendered for the active dialect.
    #[error("type {ty} is not supported by the {dialect} dialect")]
    UnsupportedType { ty: String, dialect: &'static str },

    /// A value's kind does not match its declared SQL type.
    #[error("cannot format {value} as {expected}")]
    TypeMismatch { expected: String, value: String },

    /// A column type change would lose data.
    #[error("cannot convert from type {from} to type {to}")]
    IncompatibleType { from: SqlType, to: SqlType },

    /// A constraint was attached to a column it cannot apply to.
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    /// A table or column declaration is malformed.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// The requested target matches no version tag.
    #[error("unknown database version '{0}'")]
    UnknownVersion(String),

    /// A raw statement's placeholders and arguments do not line up.
    #[error("argument mismatch: {0}")]
    Arguments(String),

    /// A custom value failed to produce its database value.
    #[error("failed to retrieve the database value: {0}")]
    ValueExtraction(#[source] BoxError),

    /// A migration script refused to go on, typically because existing data
    /// needs a manual fix first.
    #[error("{0}")]
    Aborted(String),

    /// A driver failure, with the operation that triggered it.
    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// A migration step of a batch failed; the whole batch was rolled back.
    #[error("migration '{description}' failed: {source}")]
    Migration {
        description: String,
        #[source]
        source: Box<Error>,
    },

    /// The capture sink could not be written.
    #[error("failed to write to the capture sink: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a driver error with the statement or operation that caused it.
    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        Error::Database { context: context.into(), source }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, value: impl Into<String>) -> Self {
        Error::TypeMismatch { expected: expected.into(), value: value.into() }
    }

    /// Returns the innermost error, looking through migration wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Migration { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Error::Database { context: "query failed".to_string(), source }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
