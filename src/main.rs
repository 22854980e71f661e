use anyhow::Context;
use askchat::{
    api::HttpAnswerService,
    app::run_ui,
    cli::{run_once, CliArgs},
    config::initialize_config,
    logging::init_logging,
};
use log::info;
use std::{io, process::ExitCode, sync::Arc};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let mut config = initialize_config().context("Failed to load configuration")?;
    let _logger = init_logging(&config).context("Failed to start logging")?;

    let args = CliArgs::parse(std::env::args().skip(1));
    if let Some(streaming) = args.streaming {
        config.streaming = streaming;
    }

    info!("answer service at {}", config.base_url);
    let service = Arc::new(HttpAnswerService::new(&config.base_url)?);

    match args.question {
        Some(question) => {
            let answered = run_once(service, &config, &question, io::stdout()).await;
            Ok(if answered {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            run_ui(service, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
