//! The gateway's schema history.
//!
//! Append-only: a released migration is never edited or reordered. Each
//! version group ends with a tagged no-op bump, so that every release is a
//! valid `migrate` target.

use futures::future::BoxFuture;
use gateway_migration::{Actions, Migration, Result, Script, bootstrap_script};

mod v0_4_0;
mod v0_5_0;
mod v0_7_0;

pub static MIGRATIONS: &[Migration] = &[
	Migration::new("create the version table", bootstrap_script()),
	Migration::new("create the users table", v0_4_0::USERS),
	Migration::new("create the local agents table", v0_4_0::LOCAL_AGENTS),
	Migration::new("create the rules table", v0_4_0::RULES),
	Migration::new("bump the database version to 0.4.0", BUMP).tagged("0.4.0"),
	Migration::new("remove the leading slash of rule paths", v0_5_0::RULE_PATH_SLASH),
	Migration::new("check that no rule path is the parent of another", v0_5_0::RULE_PATH_PARENT),
	Migration::new("rename the rule in/out paths to local/remote", v0_5_0::RULE_DIRS),
	Migration::new("bump the database version to 0.5.0", BUMP).tagged("0.5.0"),
	Migration::new("add the local agents 'enabled' column", v0_7_0::LOCAL_AGENT_ENABLED),
	Migration::new("widen the rule path column", v0_7_0::RULE_PATH_TEXT),
	Migration::new("bump the database version to 0.7.0", BUMP).tagged("0.7.0"),
];

/// Version bumps change nothing: the engine rewrites the version marker.
const BUMP: Script = Script { up: noop, down: noop };

fn noop(_: &mut Actions) -> BoxFuture<'_, Result<()>> {
	Box::pin(async { Ok(()) })
}
