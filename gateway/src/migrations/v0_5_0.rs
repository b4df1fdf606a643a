//! 0.5.0: rule paths lose their leading slash and the rule directories are
//! renamed from the in/out convention to local/remote.

use futures::future::BoxFuture;
use gateway_migration::{Actions, Drivers, Error, Result, Script};
use sqlx::Row;

pub const RULE_PATH_SLASH: Script = Script { up: remove_rule_path_slash, down: restore_rule_path_slash };
pub const RULE_PATH_PARENT: Script = Script { up: check_rule_path_parent, down: super::noop };
pub const RULE_DIRS: Script = Script { up: rename_rule_dirs, down: restore_rule_dirs };

fn remove_rule_path_slash(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		match db.dialect().driver() {
			Drivers::SQLite => db.exec("UPDATE rules SET path = LTRIM(path, '/')", &[]).await,
			Drivers::Postgres | Drivers::MySQL => db.exec("UPDATE rules SET path = TRIM(LEADING '/' FROM path)", &[]).await,
		}
	})
}

fn restore_rule_path_slash(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		match db.dialect().driver() {
			Drivers::SQLite | Drivers::Postgres => db.exec("UPDATE rules SET path = '/' || path", &[]).await,
			Drivers::MySQL => db.exec("UPDATE rules SET path = CONCAT('/', path)", &[]).await,
		}
	})
}

/// Paths are now relative, so one rule's path may not contain another's.
fn check_rule_path_parent(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		let query = match db.dialect().driver() {
			Drivers::SQLite | Drivers::Postgres => {
				"SELECT A.name, A.path, B.name, B.path FROM rules A, rules B WHERE B.path LIKE A.path || '/%'"
			}
			Drivers::MySQL => {
				"SELECT A.name, A.path, B.name, B.path FROM rules A, rules B WHERE B.path LIKE CONCAT(A.path, '/%')"
			}
		};

		let rows = db.query(query).await?;
		if let Some(row) = rows.first() {
			let (parent, parent_path): (String, String) = (row.try_get(0)?, row.try_get(1)?);
			let (child, child_path): (String, String) = (row.try_get(2)?, row.try_get(3)?);
			return Err(Error::Aborted(format!(
				"the path of the rule '{}' ({}) must be changed so that it is no longer a parent of the path of rule '{}' ({})",
				parent, parent_path, child, child_path
			)));
		}
		Ok(())
	})
}

fn rename_rule_dirs(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.rename_column("rules", "in_path", "local_dir").await?;
		db.rename_column("rules", "out_path", "remote_dir").await?;
		// Send rules had them the other way around.
		db.swap_columns("rules", "local_dir", "remote_dir", "send=true").await
	})
}

fn restore_rule_dirs(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.swap_columns("rules", "local_dir", "remote_dir", "send=true").await?;
		db.rename_column("rules", "remote_dir", "out_path").await?;
		db.rename_column("rules", "local_dir", "in_path").await
	})
}
