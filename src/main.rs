use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use lightning_archive::coordinator::should_purge;
use lightning_archive::{
	parse_timestamp, AppConfig, ArchiveError, ArchiveStorage, CommandUpdate, NoUpdate,
	PurgeOrchestrator, PurgeWindow, RedbStorage, RedbStorageProvider, RunCoordinator, UpdateRoutine,
};
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "lightning-archive")]
#[command(about = "Retention, purge and update coordination for a lightning impact archive")]
struct Cli {
	/// Configuration file (defaults apply when it does not exist)
	#[arg(short, long, global = true, default_value = "lightning-archive.toml")]
	config: PathBuf,

	/// Archive database file, overrides the configuration
	#[arg(short, long, global = true)]
	database: Option<PathBuf>,

	/// Reference instant (ISO-8601), defaults to the current time
	#[arg(long, global = true)]
	now: Option<String>,

	/// Enable verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Purge old impacts and events, automatically or over a manual window
	Purge {
		/// Retention in days for the automatic window
		#[arg(long)]
		days: Option<u32>,

		/// Grace period in days; nothing younger is ever deleted
		#[arg(long)]
		grace_days: Option<u32>,

		/// Start of the manual window (ISO-8601)
		#[arg(long)]
		manual_start: Option<String>,

		/// End of the manual window (ISO-8601)
		#[arg(long)]
		manual_end: Option<String>,

		/// Keep the event log untouched
		#[arg(long)]
		disable_events_purge: bool,
	},

	/// Run one update-then-purge coordination cycle
	Coordinate,

	/// Show archive counts and the last purge
	Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt().with_max_level(level).init();

	let mut config = AppConfig::load(&cli.config)
		.with_context(|| format!("loading configuration from {}", cli.config.display()))?;
	if let Some(path) = cli.database {
		config.database.path = path;
	}
	let now = match cli.now.as_deref() {
		Some(value) => parse_timestamp(value)?,
		None => Utc::now(),
	};
	debug!(now = %now.to_rfc3339(), database = %config.database.path.display(), "Resolved settings");

	match cli.command {
		Command::Purge { days, grace_days, manual_start, manual_end, disable_events_purge } => {
			if let Some(days) = days {
				config.retention.retention_days = days;
			}
			if let Some(grace_days) = grace_days {
				config.retention.grace_days = grace_days;
			}
			config.validate()?;
			purge(&config, manual_start, manual_end, disable_events_purge, now).await
		}
		Command::Coordinate => {
			config.validate()?;
			coordinate(&config, now).await;
			Ok(())
		}
		Command::Status => status(&config, now).await,
	}
}

async fn purge(
	config: &AppConfig, manual_start: Option<String>, manual_end: Option<String>,
	disable_events_purge: bool, now: DateTime<Utc>,
) -> anyhow::Result<()> {
	let orchestrator = PurgeOrchestrator::new(config.retention_policy()?)
		.with_compaction(config.database.compact_after_purge);

	let manual_window = PurgeWindow::from_bounds(manual_start.as_deref(), manual_end.as_deref())?;

	let mut storage = RedbStorage::new(config.database.clone()).await.map_err(ArchiveError::from)?;
	let record = match manual_window {
		Some(window) => {
			let range = window.as_range();
			info!(
				"Manual purge of [{}, {})",
				range.start.map(|start| start.to_rfc3339()).unwrap_or_default(),
				range.end.to_rfc3339()
			);
			orchestrator.run_window(&mut storage, window, disable_events_purge, now).await?
		}
		None => orchestrator.run_automatic(&mut storage, now).await?,
	};

	println!("{}", record.summary());
	Ok(())
}

async fn coordinate(config: &AppConfig, now: DateTime<Utc>) {
	let orchestrator = PurgeOrchestrator::new(config.retention_policy().unwrap_or_default())
		.with_compaction(config.database.compact_after_purge);
	let coordinator =
		RunCoordinator::new(RedbStorageProvider::new(config.database.clone()), orchestrator)
			.with_update_interval(config.update_min_interval());

	let mut update: Box<dyn UpdateRoutine> = match &config.update.command {
		Some(command) => Box::new(CommandUpdate::new(command.clone(), config.retry_config())),
		None => Box::new(NoUpdate),
	};

	let report = coordinator.run_cycle(update.as_mut(), now).await;
	println!("{}", report.summary());
}

async fn status(config: &AppConfig, now: DateTime<Utc>) -> anyhow::Result<()> {
	let policy = config.retention_policy()?;
	let storage = RedbStorage::new(config.database.clone()).await.map_err(ArchiveError::from)?;
	let stats = storage.get_stats().await.map_err(ArchiveError::from)?;

	println!("database:      {}", config.database.path.display());
	println!("impacts:       {}", stats.total_impacts);
	println!("log events:    {}", stats.total_log_events);
	println!("purge runs:    {}", stats.purge_runs);
	match &stats.last_purge {
		Some(record) => println!("last purge:    {}", record.summary()),
		None => println!("last purge:    never"),
	}
	let due = should_purge(stats.last_purge.as_ref(), now, policy.purge_interval());
	println!("purge due:     {}", if due { "yes" } else { "no" });
	Ok(())
}
