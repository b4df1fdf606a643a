//! Initial schema of the 0.4.0 release.

use futures::future::BoxFuture;
use gateway_migration::{Actions, Column, Result, Script, SqlType, TableConstraint};

pub const USERS: Script = Script { up: create_users, down: drop_users };
pub const LOCAL_AGENTS: Script = Script { up: create_local_agents, down: drop_local_agents };
pub const RULES: Script = Script { up: create_rules, down: drop_rules };

fn create_users(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.create_table(
			"users",
			&[
				Column::new("id", SqlType::BIGINT).primary_key().auto_increment().into(),
				Column::new("owner", SqlType::varchar(100)).not_null().into(),
				Column::new("username", SqlType::varchar(100)).not_null().into(),
				Column::new("password_hash", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("permissions", SqlType::binary(4)).not_null().default_value(vec![0u8; 4]).into(),
				TableConstraint::unique(["owner", "username"]).into(),
			],
		)
		.await
	})
}

fn drop_users(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move { db.drop_table("users").await })
}

fn create_local_agents(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.create_table(
			"local_agents",
			&[
				Column::new("id", SqlType::BIGINT).primary_key().auto_increment().into(),
				Column::new("owner", SqlType::varchar(100)).not_null().into(),
				Column::new("name", SqlType::varchar(100)).not_null().into(),
				Column::new("protocol", SqlType::varchar(50)).not_null().into(),
				Column::new("address", SqlType::varchar(255)).not_null().into(),
				Column::new("root", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("in_dir", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("out_dir", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("work_dir", SqlType::TEXT).not_null().default_value("").into(),
				TableConstraint::unique(["owner", "name"]).into(),
			],
		)
		.await
	})
}

fn drop_local_agents(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move { db.drop_table("local_agents").await })
}

fn create_rules(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move {
		db.create_table(
			"rules",
			&[
				Column::new("id", SqlType::BIGINT).primary_key().auto_increment().into(),
				Column::new("name", SqlType::varchar(100)).not_null().into(),
				Column::new("comment", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("send", SqlType::BOOLEAN).not_null().into(),
				Column::new("path", SqlType::varchar(255)).not_null().into(),
				Column::new("in_path", SqlType::TEXT).not_null().default_value("").into(),
				Column::new("out_path", SqlType::TEXT).not_null().default_value("").into(),
				TableConstraint::unique(["name", "send"]).into(),
			],
		)
		.await
	})
}

fn drop_rules(db: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async move { db.drop_table("rules").await })
}
