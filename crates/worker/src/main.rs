use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workitem_cloud::auth::TwoLeggedAuthenticator;
use workitem_cloud::oss::OssStorage;
use workitem_core::types::resolve_job_id;
use workitem_worker::config::RunnerConfig;
use workitem_worker::error::EXIT_FAILURE;
use workitem_worker::export::ExportJob;
use workitem_worker::runner::JobRunner;

const USAGE: &str = "Usage: workitem-worker <input-file> [job-id]";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "workitem_worker=info,workitem_remote=info,workitem_transfer=info,workitem_cloud=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(input_file) = args.first() else {
        tracing::error!("{USAGE}");
        std::process::exit(EXIT_FAILURE);
    };

    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let job_id = resolve_job_id(args.get(1).map(String::as_str));

    let auth = Arc::new(TwoLeggedAuthenticator::new(
        client.clone(),
        &config.auth_url,
        &config.client_id,
        &config.client_secret,
    ));
    let storage = Arc::new(OssStorage::new(
        client.clone(),
        &config.oss_url,
        &config.bucket_name,
        auth.clone(),
    ));
    let job = Arc::new(ExportJob::from_config(storage, input_file, &config));
    let runner = JobRunner::from_config(&config, client, auth, job);

    match runner.run(job_id.clone()).await {
        Ok(report) => {
            tracing::info!(
                work_item_id = report.work_item_id.as_deref().unwrap_or_default(),
                polls = report.polls,
                "Job {job_id} finished",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, phase = %e.phase, "Job {job_id} stopped because of error");
            std::process::exit(e.exit_code());
        }
    }
}
