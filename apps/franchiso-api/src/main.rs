use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = franchiso_api::Args::parse();

	franchiso_api::run(args).await
}
