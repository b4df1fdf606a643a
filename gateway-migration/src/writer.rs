//! # Query Writer Module
//!
//! Every statement a migration produces goes through a [`QueryWriter`]. The
//! writer owns the batch transaction and routes each statement according to
//! its [`Sink`]: executed on the transaction, appended to a capture stream,
//! or both.

use std::{fmt, io::Write};

use log::debug;
use sqlx::any::AnyRow;

use crate::{
    error::{Error, Result},
    transaction::Transaction,
};

/// Where generated statements go.
///
/// Capturing and executing are independent switches:
///
/// - [`Sink::execute`] runs statements (the normal mode),
/// - [`Sink::capture`] only records them (dry-run, never mutates),
/// - [`Sink::tee`] records and runs them, to validate captured DDL.
pub struct Sink {
    capture: Option<Box<dyn Write + Send>>,
    execute: bool,
}

impl Sink {
    pub fn execute() -> Self {
        Self { capture: None, execute: true }
    }

    pub fn capture(out: Box<dyn Write + Send>) -> Self {
        Self { capture: Some(out), execute: false }
    }

    pub fn tee(out: Box<dyn Write + Send>) -> Self {
        Self { capture: Some(out), execute: true }
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_executing(&self) -> bool {
        self.execute
    }

    /// Hands back the capture stream, if any.
    pub fn into_capture(self) -> Option<Box<dyn Write + Send>> {
        self.capture
    }

    fn write(&mut self, sql: &str) -> Result<()> {
        if let Some(out) = self.capture.as_mut() {
            writeln!(out, "{};", sql)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(out) = self.capture.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::execute()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("capture", &self.capture.is_some()).field("execute", &self.execute).finish()
    }
}

/// The transactional statement writer used by one migration batch.
#[derive(Debug)]
pub struct QueryWriter {
    tx: Transaction,
    sink: Sink,
    statements: usize,
}

impl QueryWriter {
    pub fn new(tx: Transaction, sink: Sink) -> Self {
        Self { tx, sink, statements: 0 }
    }

    /// Substitutes `args` for the `?` placeholders of `query` and routes the
    /// resulting statement to the sink.
    pub async fn exec(&mut self, query: &str, args: &[&(dyn fmt::Display + Sync)]) -> Result<()> {
        let sql = bind_args(query, args)?;
        self.statements += 1;

        debug!(
            "[{}] {} (captured: {}, executed: {})",
            self.statements,
            sql,
            self.sink.is_capturing(),
            self.sink.is_executing()
        );

        self.sink.write(&sql)?;
        if self.sink.execute {
            sqlx::query(&sql).execute(self.tx.conn()).await.map_err(|e| Error::database(sql.clone(), e))?;
        }
        Ok(())
    }

    /// Runs a read query on the transaction. Reads are never captured and
    /// always executed, even during a dry-run.
    pub async fn query(&mut self, query: &str) -> Result<Vec<AnyRow>> {
        debug!("{}", query);
        sqlx::query(query).fetch_all(self.tx.conn()).await.map_err(|e| Error::database(query.to_string(), e))
    }

    /// Whether statements actually reach the database.
    pub fn is_executing(&self) -> bool {
        self.sink.execute
    }

    /// Number of statements routed so far.
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn transaction(&mut self) -> &mut Transaction {
        &mut self.tx
    }

    /// Flushes the capture stream and returns the transaction and sink.
    pub fn finish(mut self) -> Result<(Transaction, Sink)> {
        self.sink.flush()?;
        Ok((self.tx, self.sink))
    }
}

/// Replaces each `?` outside single-quoted literals with the next argument.
pub(crate) fn bind_args(query: &str, args: &[&(dyn fmt::Display + Sync)]) -> Result<String> {
    let mut sql = String::with_capacity(query.len());
    let mut args_iter = args.iter();
    let mut in_quotes = false;
    let mut used = 0;

    for c in query.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                sql.push(c);
            }
            '?' if !in_quotes => {
                let arg = args_iter.next().ok_or_else(|| {
                    Error::Arguments(format!("more placeholders than the {} argument(s) given in: {}", args.len(), query))
                })?;
                sql.push_str(&arg.to_string());
                used += 1;
            }
            _ => sql.push(c),
        }
    }

    if used != args.len() {
        return Err(Error::Arguments(format!("{} argument(s) given but only {} placeholder(s) in: {}", args.len(), used, query)));
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted_in_order() {
        let sql = bind_args("UPDATE users SET role = ? WHERE id = ?", &[&"'admin'", &42]).unwrap();
        assert_eq!(sql, "UPDATE users SET role = 'admin' WHERE id = 42");
    }

    #[test]
    fn quoted_question_marks_are_left_alone() {
        let sql = bind_args("UPDATE t SET q = 'why?' WHERE id = ?", &[&7]).unwrap();
        assert_eq!(sql, "UPDATE t SET q = 'why?' WHERE id = 7");
    }

    #[test]
    fn argument_count_must_match() {
        assert!(matches!(bind_args("SELECT ?, ?", &[&1]), Err(Error::Arguments(_))));
        assert!(matches!(bind_args("SELECT 1", &[&1]), Err(Error::Arguments(_))));
        assert_eq!(bind_args("SELECT 1", &[]).unwrap(), "SELECT 1");
    }

    #[test]
    fn sink_modes() {
        let exec = Sink::default();
        assert!(exec.is_executing() && !exec.is_capturing());

        let dry = Sink::capture(Box::new(Vec::new()));
        assert!(!dry.is_executing() && dry.is_capturing());

        let tee = Sink::tee(Box::new(std::io::sink()));
        assert!(tee.is_executing() && tee.is_capturing());
    }
}
