use std::process::ExitCode;

use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use raspi_uploader::cli::Cli;
use raspi_uploader::config::load_settings;
use raspi_uploader::notifier::DingtalkNotifier;
use raspi_uploader::pipeline;
use raspi_uploader::storage::OssBucket;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(cli).await {
        Ok(url) => {
            info!("File uploaded and notification sent: {}", url);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let settings = load_settings(&cli.config).context("Failed to load config")?;

    // Sweep and upload share the client, so both steps fail with it
    let store = match OssBucket::connect(&settings.oss).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to clean up expired folders: {}", e);
            return Err(e).context("Failed to upload file");
        }
    };
    let notifier = DingtalkNotifier::new(settings.dingtalk.clone());

    let uploaded = pipeline::run(&settings, &cli.file, &store, &notifier).await?;
    Ok(uploaded.public_url)
}
