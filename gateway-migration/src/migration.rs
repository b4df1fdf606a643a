//! # Migration Module
//!
//! Migration definitions and the transactional engine running them.
//!
//! A batch of migrations always runs inside one transaction: either every
//! step of the batch is applied (or reverted) and committed, or the first
//! failure rolls the whole batch back.

use std::{fmt, io::Write};

use futures::future::BoxFuture;
use log::{debug, info, warn};

use crate::{
    actions::Actions,
    database::Database,
    dialect::Dialect,
    error::{Error, Result},
    version::{self, Plan},
    writer::{QueryWriter, Sink},
};

/// One direction of a migration script.
///
/// ```rust,ignore
/// fn up(actions: &mut Actions) -> BoxFuture<'_, Result<()>> {
///     Box::pin(async move { actions.rename_table("rules", "transfer_rules").await })
/// }
/// ```
pub type Step = for<'a> fn(&'a mut Actions) -> BoxFuture<'a, Result<()>>;

/// Paired forward and backward steps.
#[derive(Clone, Copy)]
pub struct Script {
    pub up: Step,
    pub down: Step,
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Script")
    }
}

/// One reversible schema change at a fixed position in history.
///
/// Histories are plain slices, append-only and in chronological order:
///
/// ```rust,ignore
/// pub static MIGRATIONS: &[Migration] = &[
///     Migration::new("create the version table", bootstrap_script()).tagged("0.0.0"),
///     Migration::new("create the users table", USERS),
///     Migration::new("bump the database version to 0.4.0", NOOP).tagged("0.4.0"),
/// ];
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub description: &'static str,
    pub script: Script,
    /// The version the database is at once this migration is applied.
    pub version: Option<&'static str>,
}

impl Migration {
    pub const fn new(description: &'static str, script: Script) -> Self {
        Self { description, script, version: None }
    }

    pub const fn tagged(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Schema migration runner.
///
/// By default statements are executed with the dialect matching the
/// database's driver. Attaching a capture stream turns the run into a
/// dry-run unless execution is switched back on explicitly.
///
/// ```rust,ignore
/// db.migrator(&MIGRATIONS).migrate_to("latest").await?;
///
/// // Dry-run: write the DDL to stdout, touch nothing.
/// db.migrator(&MIGRATIONS).capture(Box::new(std::io::stdout())).migrate_to("0.5.0").await?;
/// ```
pub struct Migrator<'a> {
    pub(crate) db: &'a Database,
    pub(crate) migrations: &'a [Migration],
    pub(crate) dialect: Dialect,
    pub(crate) capture: Option<Box<dyn Write + Send>>,
    pub(crate) execute: Option<bool>,
}

impl<'a> Migrator<'a> {
    /// Creates a new Migrator over a migration history.
    pub fn new(db: &'a Database, migrations: &'a [Migration]) -> Self {
        Self { db, migrations, dialect: db.dialect(), capture: None, execute: None }
    }

    /// Overrides the dialect statements are generated for.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Writes every generated statement to `out`, `;`-terminated, one per
    /// line.
    pub fn capture(mut self, out: Box<dyn Write + Send>) -> Self {
        self.capture = Some(out);
        self
    }

    /// Whether statements are executed. Defaults to `true` without a capture
    /// stream and `false` with one.
    pub fn execute(mut self, execute: bool) -> Self {
        self.execute = Some(execute);
        self
    }

    fn sink(&mut self) -> Sink {
        match (self.capture.take(), self.execute) {
            (None, _) => Sink::execute(),
            (Some(out), Some(true)) => Sink::tee(out),
            (Some(out), _) => Sink::capture(out),
        }
    }

    /// Applies `batch` forward, in order, as one transaction.
    pub async fn upgrade(self, batch: &[Migration]) -> Result<()> {
        self.run_batch(Direction::Up, batch).await
    }

    /// Reverts `batch` in reverse order, as one transaction.
    pub async fn downgrade(self, batch: &[Migration]) -> Result<()> {
        self.run_batch(Direction::Down, batch).await
    }

    async fn run_batch(mut self, direction: Direction, batch: &[Migration]) -> Result<()> {
        let sink = self.sink();
        let tx = self.db.begin().await?;
        let actions = Actions::new(QueryWriter::new(tx, sink), self.dialect);
        apply(actions, self.dialect, direction, batch, None).await
    }

    /// Moves the database to `request` (`"latest"` or a version tag) and
    /// updates the version marker in the same transaction.
    pub async fn migrate_to(mut self, request: &str) -> Result<Plan> {
        version::validate(self.migrations)?;
        let target = version::target(self.migrations, request)?;

        let sink = self.sink();
        let mut tx = self.db.begin().await?;
        let current = version::current(&mut tx, self.migrations).await?;
        let plan = Plan::new(current, target);

        let direction = match plan {
            Plan::Noop { at } => {
                info!("database is already at position {} ({}), nothing to do", at, request);
                tx.rollback().await?;
                return Ok(plan);
            }
            Plan::Upgrade { from, to } => {
                info!("upgrading database from position {} to {} ({})", from, to, request);
                Direction::Up
            }
            Plan::Downgrade { from, to } => {
                info!("downgrading database from position {} to {} ({})", from, to, request);
                Direction::Down
            }
        };

        let actions = Actions::new(QueryWriter::new(tx, sink), self.dialect);
        let marker = (target > 0).then(|| version::marker(self.migrations, target)).flatten();
        apply(actions, self.dialect, direction, plan.batch(self.migrations), marker).await?;
        Ok(plan)
    }
}

/// Runs `batch` on the transaction held by `actions`, then commits or rolls
/// back depending on the outcome and on whether anything was executed.
async fn apply(
    mut actions: Actions,
    dialect: Dialect,
    direction: Direction,
    batch: &[Migration],
    marker: Option<&str>,
) -> Result<()> {
    let mut result = run_steps(&mut actions, direction, batch).await;
    if result.is_ok() {
        if let Some(tag) = marker {
            result = version::write_marker(actions.writer_mut(), dialect, tag).await;
        }
    }

    let writer = actions.into_writer();
    let executed = writer.is_executing();
    let statements = writer.statements();
    let (tx, _) = writer.finish()?;

    match result {
        Ok(()) if executed => {
            tx.commit().await?;
            info!("committed {} migration(s), {} statement(s)", batch.len(), statements);
            Ok(())
        }
        Ok(()) => {
            tx.rollback().await?;
            info!("captured {} migration(s), {} statement(s)", batch.len(), statements);
            Ok(())
        }
        Err(e) => {
            warn!("migration batch failed, rolling back: {}", e);
            if let Err(rollback) = tx.rollback().await {
                warn!("rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

async fn run_steps(actions: &mut Actions, direction: Direction, batch: &[Migration]) -> Result<()> {
    match direction {
        Direction::Up => {
            for migration in batch {
                run_step(actions, migration, migration.script.up).await?;
                info!("applied migration '{}'", migration.description);
            }
        }
        Direction::Down => {
            for migration in batch.iter().rev() {
                run_step(actions, migration, migration.script.down).await?;
                info!("reverted migration '{}'", migration.description);
            }
        }
    }
    Ok(())
}

async fn run_step(actions: &mut Actions, migration: &Migration, step: Step) -> Result<()> {
    debug!("running migration '{}'", migration.description);
    step(actions).await.map_err(|source| Error::Migration {
        description: migration.description.to_string(),
        source: Box::new(source),
    })
}
