use clap::Parser;

use orgscope_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	orgscope_worker::run(Args::parse()).await
}
