//! # Version Module
//!
//! Maps requested targets to positions in the migration list and maintains
//! the persisted version marker.
//!
//! Positions count applied migrations: position `0` is an empty database,
//! position `migrations.len()` is fully migrated. A version tag on the
//! migration at index `i` names position `i + 1`, the state right after that
//! migration was applied.

use std::cmp::Ordering;

use futures::future::BoxFuture;
use log::debug;
use sqlx::Row;

use crate::{
    actions::Actions,
    dialect::Dialect,
    error::{Error, Result},
    migration::{Migration, Script},
    schema::Column,
    transaction::Transaction,
    types::SqlType,
    value::Cell,
    writer::QueryWriter,
};

/// Name of the single-row table holding the current version tag.
pub const VERSION_TABLE: &str = "version";

/// Target request resolving to the end of the migration list.
pub const LATEST: &str = "latest";

/// What a migration run has to do to reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Noop { at: usize },
    /// Apply `migrations[from..to]` forward.
    Upgrade { from: usize, to: usize },
    /// Revert `migrations[to..from]`, last first.
    Downgrade { from: usize, to: usize },
}

impl Plan {
    pub fn new(current: usize, target: usize) -> Self {
        if target > current {
            Plan::Upgrade { from: current, to: target }
        } else if target < current {
            Plan::Downgrade { from: current, to: target }
        } else {
            Plan::Noop { at: current }
        }
    }

    /// The slice of `migrations` this plan runs, in list order.
    pub fn batch<'m>(&self, migrations: &'m [Migration]) -> &'m [Migration] {
        match *self {
            Plan::Noop { .. } => &[],
            Plan::Upgrade { from, to } => &migrations[from..to],
            Plan::Downgrade { from, to } => &migrations[to..from],
        }
    }

    /// The position the database ends up at.
    pub fn target(&self) -> usize {
        match *self {
            Plan::Noop { at } => at,
            Plan::Upgrade { to, .. } | Plan::Downgrade { to, .. } => to,
        }
    }
}

/// Position named by `tag`.
pub fn position(migrations: &[Migration], tag: &str) -> Option<usize> {
    migrations.iter().position(|m| m.version == Some(tag)).map(|i| i + 1)
}

/// Resolves a requested target: `"latest"` or a version tag.
pub fn target(migrations: &[Migration], request: &str) -> Result<usize> {
    if request == LATEST {
        return Ok(migrations.len());
    }
    position(migrations, request).ok_or_else(|| Error::UnknownVersion(request.to_string()))
}

/// Version tags must increase along the history (dot-separated parts,
/// numeric parts compared as numbers), and the last migration must carry
/// one so that `"latest"` always names a recordable version.
pub fn validate(migrations: &[Migration]) -> Result<()> {
    if let Some(last) = migrations.last() {
        if last.version.is_none() {
            return Err(Error::InvalidDefinition(format!(
                "the last migration ('{}') has no version tag",
                last.description
            )));
        }
    }

    let mut previous: Option<&str> = None;
    for tag in migrations.iter().filter_map(|m| m.version) {
        if tag == LATEST {
            return Err(Error::InvalidDefinition(format!("version tag '{}' is reserved", tag)));
        }
        if let Some(prev) = previous {
            if compare_tags(prev, tag) != Ordering::Less {
                return Err(Error::InvalidDefinition(format!(
                    "version tag '{}' does not come after '{}'",
                    tag, prev
                )));
            }
        }
        previous = Some(tag);
    }
    Ok(())
}

/// Orders version tags part by part: `0.10.0` comes after `0.9.1`.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            },
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// The tag recorded once the database sits at position `target`: the tag of
/// the last tagged migration applied, if any.
pub fn marker(migrations: &[Migration], target: usize) -> Option<&'static str> {
    migrations[..target.min(migrations.len())].iter().rev().find_map(|m| m.version)
}

/// Reads the current position from the version marker.
///
/// A missing version table (or an empty one) means position zero. A tag
/// matching no migration fails with `UnknownVersion`.
pub async fn current(tx: &mut Transaction, migrations: &[Migration]) -> Result<usize> {
    if !tx.table_exists(VERSION_TABLE).await? {
        debug!("no '{}' table, the database is unmigrated", VERSION_TABLE);
        return Ok(0);
    }

    let query = format!("SELECT current FROM {}", VERSION_TABLE);
    let row = sqlx::query(&query)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| Error::database("failed to retrieve the current database version", e))?;

    let Some(row) = row else {
        return Ok(0);
    };

    let tag: String = row.try_get(0)?;
    debug!("database version marker is '{}'", tag);
    position(migrations, &tag).ok_or(Error::UnknownVersion(tag))
}

/// Rewrites the marker row through `writer`, so it commits (or is captured)
/// with the batch.
pub(crate) async fn write_marker(writer: &mut QueryWriter, dialect: Dialect, tag: &str) -> Result<()> {
    let literal = dialect.format_cell(&Cell::new(SqlType::TEXT, tag))?;
    writer.exec(&format!("DELETE FROM {}", VERSION_TABLE), &[]).await?;
    writer.exec(&format!("INSERT INTO {} (current) VALUES (?)", VERSION_TABLE), &[&literal]).await
}

/// The first migration of every history: creates the version table on the
/// way up, drops it on the way down.
pub const fn bootstrap_script() -> Script {
    Script { up: create_version_table, down: drop_version_table }
}

fn create_version_table(actions: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let current = Column::new("current", SqlType::TEXT).not_null();
        actions.create_table(VERSION_TABLE, &[current.into()]).await
    })
}

fn drop_version_table(actions: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move { actions.drop_table(VERSION_TABLE).await })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Actions) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    const SCRIPT: Script = Script { up: noop, down: noop };

    fn history() -> Vec<Migration> {
        vec![
            Migration::new("bootstrap", SCRIPT).tagged("0.0.0"),
            Migration::new("create users", SCRIPT),
            Migration::new("create rules", SCRIPT).tagged("0.4.0"),
            Migration::new("rename rule paths", SCRIPT),
            Migration::new("bump to 0.5.0", SCRIPT).tagged("0.5.0"),
        ]
    }

    #[test]
    fn targets() {
        let migrations = history();
        assert_eq!(target(&migrations, LATEST).unwrap(), 5);
        assert_eq!(target(&migrations, "0.0.0").unwrap(), 1);
        assert_eq!(target(&migrations, "0.4.0").unwrap(), 3);
        assert!(matches!(target(&migrations, "9.9.9"), Err(Error::UnknownVersion(v)) if v == "9.9.9"));
    }

    #[test]
    fn plans() {
        let migrations = history();
        assert_eq!(Plan::new(0, 5), Plan::Upgrade { from: 0, to: 5 });
        assert_eq!(Plan::new(5, 5), Plan::Noop { at: 5 });
        assert_eq!(Plan::new(5, 3), Plan::Downgrade { from: 5, to: 3 });

        let batch = Plan::new(5, 3).batch(&migrations);
        let names: Vec<_> = batch.iter().map(|m| m.description).collect();
        assert_eq!(names, vec!["rename rule paths", "bump to 0.5.0"]);
        assert!(Plan::new(2, 2).batch(&migrations).is_empty());
    }

    #[test]
    fn markers() {
        let migrations = history();
        assert_eq!(marker(&migrations, 0), None);
        assert_eq!(marker(&migrations, 2), Some("0.0.0"));
        assert_eq!(marker(&migrations, 3), Some("0.4.0"));
        assert_eq!(marker(&migrations, 5), Some("0.5.0"));
    }

    #[test]
    fn history_must_be_tagged_consistently() {
        let mut migrations = history();
        assert!(validate(&migrations).is_ok());
        migrations.push(Migration::new("untagged", SCRIPT));
        assert!(matches!(validate(&migrations), Err(Error::InvalidDefinition(_))));
        migrations.pop();
        migrations.push(Migration::new("again", SCRIPT).tagged("0.4.0"));
        assert!(matches!(validate(&migrations), Err(Error::InvalidDefinition(_))));
        migrations.pop();
        migrations.push(Migration::new("reserved", SCRIPT).tagged(LATEST));
        assert!(matches!(validate(&migrations), Err(Error::InvalidDefinition(_))));
        migrations.pop();
        migrations.push(Migration::new("bump to 0.10.0", SCRIPT).tagged("0.10.0"));
        assert!(validate(&migrations).is_ok());
    }

    #[test]
    fn tags_must_increase() {
        let migrations = vec![
            Migration::new("bootstrap", SCRIPT).tagged("0.5.0"),
            Migration::new("older", SCRIPT).tagged("0.4.9"),
        ];
        let err = validate(&migrations).unwrap_err();
        assert_eq!(err.to_string(), "invalid definition: version tag '0.4.9' does not come after '0.5.0'");

        assert_eq!(compare_tags("0.9.1", "0.10.0"), Ordering::Less);
        assert_eq!(compare_tags("1.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_tags("0.4.0", "0.4.0"), Ordering::Equal);
        assert_eq!(compare_tags("1.0.0-rc1", "1.0.0-rc2"), Ordering::Less);
    }
}
