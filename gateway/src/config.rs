//! Gateway configuration file: the `[database]` table the `migrate`
//! command needs to reach the database.
//!
//! ```toml
//! [database]
//! type = "postgresql"
//! address = "localhost:5432"
//! name = "waarp_gateway"
//! user = "gateway"
//! password = "s3cr3t"
//! ```

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use gateway_migration::{Dialect, Drivers, Registry};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read configuration file {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid configuration file {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("missing database setting '{0}'")]
	Missing(&'static str),

	#[error(transparent)]
	Dialect(#[from] gateway_migration::Error),
}

#[derive(Debug, Deserialize)]
pub struct Config {
	pub database: DatabaseConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// Dialect name: `sqlite`, `postgresql` or `mysql`.
	#[serde(rename = "type")]
	pub kind: String,
	/// `host:port` for servers, the database file for SQLite.
	pub address: Option<String>,
	pub name: Option<String>,
	pub user: Option<String>,
	pub password: Option<String>,
	/// Full connection URL, overriding every other connection setting.
	pub url: Option<String>,
}

impl Config {
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
		toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
	}
}

impl DatabaseConfig {
	/// Resolves the configured dialect through `registry`.
	pub fn dialect(&self, registry: &Registry) -> Result<Dialect, ConfigError> {
		if self.kind.is_empty() {
			return Err(ConfigError::Missing("type"));
		}
		Ok(registry.get(&self.kind)?)
	}

	/// The connection URL: `DATABASE_URL` if set, then the `url` setting,
	/// then one composed from the individual settings.
	pub fn url(&self, dialect: Dialect) -> Result<String, ConfigError> {
		self.url_with(dialect, env::var("DATABASE_URL").ok())
	}

	fn url_with(&self, dialect: Dialect, env_url: Option<String>) -> Result<String, ConfigError> {
		if let Some(url) = env_url.filter(|u| !u.is_empty()) {
			return Ok(url);
		}
		if let Some(url) = self.url.clone() {
			return Ok(url);
		}

		match dialect.driver() {
			Drivers::SQLite => {
				let file = self.address.as_deref().or(self.name.as_deref()).ok_or(ConfigError::Missing("address"))?;
				Ok(format!("sqlite://{}?mode=rwc", file))
			}
			Drivers::Postgres => self.server_url("postgres"),
			Drivers::MySQL => self.server_url("mysql"),
		}
	}

	fn server_url(&self, scheme: &str) -> Result<String, ConfigError> {
		let address = self.address.as_deref().ok_or(ConfigError::Missing("address"))?;
		let name = self.name.as_deref().ok_or(ConfigError::Missing("name"))?;

		let credentials = match (&self.user, &self.password) {
			(Some(user), Some(password)) => {
				format!("{}:{}@", urlencoding::encode(user), urlencoding::encode(password))
			}
			(Some(user), None) => format!("{}@", urlencoding::encode(user)),
			(None, _) => String::new(),
		};

		Ok(format!("{}://{}{}/{}", scheme, credentials, address, name))
	}
}
