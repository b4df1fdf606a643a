//! 0.7.0: local agents can be disabled, rule paths are no longer bounded.

use futures::future::BoxFuture;
use gateway_migration::{Actions, Column, Drivers, Result, Script, SqlType};

pub const LOCAL_AGENT_ENABLED: Script = Script { up: add_local_agent_enabled, down: drop_local_agent_enabled };
/// Narrowing back to VARCHAR(255) could truncate paths, so the way down
/// keeps the wider type.
pub const RULE_PATH_TEXT: Script = Script { up: widen_rule_path, down: super::noop };

fn add_local_agent_enabled(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.add_column("local_agents", &Column::new("enabled", SqlType::BOOLEAN).not_null().default_value(true)).await
	})
}

fn drop_local_agent_enabled(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move { db.drop_column("local_agents", "enabled").await })
}

fn widen_rule_path(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		let (from, to) = (SqlType::varchar(255), SqlType::TEXT);
		match db.dialect().driver() {
			// MODIFY COLUMN re-declares the whole column, NOT NULL included.
			Drivers::MySQL => {
				let ty = db.dialect().render_type(&to)?;
				db.exec("ALTER TABLE rules MODIFY COLUMN path ? NOT NULL", &[&ty]).await
			}
			Drivers::SQLite | Drivers::Postgres => db.change_column_type("rules", "path", &from, &to).await,
		}
	})
}
