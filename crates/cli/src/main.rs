#![forbid(unsafe_code)]

use clap::Parser;
use config::Config;
use enrollment_insights::{cli::Cli, commands::run};
use tracing::debug;
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => Config::new(),
    };

    run(&cli, config, std::io::stdout().lock()).await?;
    Ok(())
}
