use std::{fs::File, io, path::PathBuf};

use clap::{Parser, Subcommand};
use gateway_migration::{Database, LATEST, Plan, Registry};
use log::{info, warn};

mod config;
mod migrations;

use config::Config;
use migrations::MIGRATIONS;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Waarp gateway database administration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbose output (every generated statement is logged)
	#[arg(long, global = true)]
	verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Migrate the database to the given version
	Migrate {
		/// Gateway configuration file
		#[arg(short, long)]
		config: PathBuf,

		/// Target version tag, or "latest"
		#[arg(default_value = LATEST)]
		version: String,

		/// Print the migration script instead of applying it
		#[arg(short, long)]
		dry_run: bool,

		/// Write the migration script to this file instead of applying it
		#[arg(short, long)]
		file: Option<PathBuf>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	let cli = Cli::parse();

	let level = if cli.verbose { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	match cli.command {
		Commands::Migrate { config, version, dry_run, file } => migrate(config, &version, dry_run, file).await,
	}
}

async fn migrate(
	config: PathBuf,
	version: &str,
	dry_run: bool,
	file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
	let config = Config::load(&config)?;
	let registry = Registry::with_builtins();
	let dialect = config.database.dialect(&registry)?;
	let url = config.database.url(dialect)?;

	let db = Database::connect(&url).await?;
	if db.driver() != dialect.driver() {
		warn!("configured for {} but connected to a {:?} database", dialect.name(), db.driver());
	}

	let mut migrator = db.migrator(MIGRATIONS).dialect(dialect);
	if let Some(path) = &file {
		migrator = migrator.capture(Box::new(File::create(path)?));
	} else if dry_run {
		migrator = migrator.capture(Box::new(io::stdout()));
	}

	let plan = migrator.migrate_to(version).await?;
	match (plan, &file) {
		(Plan::Noop { .. }, _) => info!("database is already at version {}", version),
		(_, Some(path)) => info!("migration script to version {} written to {}", version, path.display()),
		(_, None) if dry_run => info!("dry-run to version {} complete, nothing was applied", version),
		(_, None) => info!("database migrated to version {}", version),
	}

	db.close().await;
	Ok(())
}
