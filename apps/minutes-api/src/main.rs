use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = minutes_api::Args::parse();

	minutes_api::run(args).await
}
