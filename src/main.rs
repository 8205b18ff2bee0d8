use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use facerec_pipeline::cli::{Cli, Command};
use facerec_pipeline::mediator::{MediatorApi, MediatorClient};
use facerec_pipeline::storage::{S3Client, Storage};
use facerec_pipeline::utils::init_logger;
use facerec_pipeline::{Config, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Flushes the log file on drop
    let _guard = init_logger(cli.log_dir.as_deref());

    if let Err(e) = run(cli).await {
        error!(error = %format!("{:#}", e), "Run failed");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
    .context("Failed to load configuration")?;
    info!(host = %config.host, bucket = %config.bucket_name, "Configuration loaded");

    let storage = Storage::new(
        Arc::new(S3Client::from_config(&config)?),
        config.bucket_name.clone(),
        config.pipeline.signed_url_expiry(),
    );

    match cli.command() {
        Command::Run => {
            let mediator = Arc::new(MediatorClient::from_config(&config)?);
            info!(host = mediator.host(), "Mediator host");

            let report = Pipeline::new(&config, storage, mediator).run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Status { job_id } => {
            let mediator = MediatorClient::from_config(&config)?;
            let job = mediator
                .get_job_by_id(&job_id)
                .await
                .with_context(|| format!("Failed to fetch job {}", job_id))?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        Command::Sign { key, put } => {
            let locator = if put {
                storage.output_locator(&key).await?
            } else {
                storage.input_locator(&key).await?
            };
            println!("{}", locator.url);
        }
        Command::Download { key, dest } => {
            storage.download(&key, &dest).await?;
            info!(key = %key, path = %dest.display(), "Downloaded object");
        }
    }

    Ok(())
}
