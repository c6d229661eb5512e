pub mod worker;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use orgscope_service::OrgService;
use orgscope_storage::{MemoryCache, db::Db};

#[derive(Debug, Parser)]
#[command(
	version = orgscope_cli::VERSION,
	rename_all = "kebab",
	styles = orgscope_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = orgscope_config::load(&args.config)?;
	let filter = EnvFilter::try_new(&config.service.log_level)
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let schedule = worker::Schedule::from_config(&config.worker);
	let service = OrgService::new(config, Arc::new(db), Arc::new(MemoryCache::new()));

	worker::run_worker(&service, schedule).await
}
