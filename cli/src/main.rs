use anyhow::{Context, bail};
use clap::Parser;
use lastlayer::app::App;
use lastlayer::commands::{self, Cli};
use lastlayer::config::{self, ConfigLoadResult};
use lastlayer::logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        ConfigLoadResult::Success(config) => *config,
        ConfigLoadResult::LoadError(e) => bail!("Failed to load configuration: {e}"),
        ConfigLoadResult::DeserializeError(e) => bail!("Invalid configuration: {e}"),
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("{}", error.user_message());
        }
        bail!("Configuration has {} problem(s)", errors.len());
    }

    logger::setup_logger(config.logging(), cli.verbose).context("Failed to set up logging")?;
    log::debug!("Themes root: {}", config.themes_dir().display());

    let app = App::new(&config);
    commands::run(&app, cli.command, cli.json)
        .await
        .context("Command failed")?;
    Ok(())
}
