use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use case_orchestrator::{
    run_case, Cli, Collaborators, ConfigError, FailureRecord, HttpSidecar, Notifier,
    OrchestratorConfig, RunError, WebhookNotifier,
};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match OrchestratorConfig::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => return report_failure(&FailureRecord::new("", &RunError::Config(e))),
    };

    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            let error = RunError::Config(ConfigError::HttpClient(e));
            return report_failure(&FailureRecord::new("", &error));
        }
    };

    let deps = Collaborators {
        sidecar: Arc::new(HttpSidecar::new(
            client.clone(),
            &config.endpoints.sidecar_base_url,
        )),
        alerts: config
            .endpoints
            .alerts_endpoint
            .as_ref()
            .map(|url| Arc::new(WebhookNotifier::new(client.clone(), url)) as Arc<dyn Notifier>),
        escalation: config
            .endpoints
            .notify_webhook
            .as_ref()
            .map(|url| Arc::new(WebhookNotifier::new(client.clone(), url)) as Arc<dyn Notifier>),
    };

    info!("Case orchestrator starting");
    match run_case(config.case, &config.settings, &deps).await {
        Ok((case, result)) => {
            let json =
                serde_json::to_string_pretty(&result).context("Failed to encode run result")?;
            println!("{json}");
            println!("Runbook:");
            println!("{}", result.summary(&case));
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => report_failure(&failure.record()),
    }
}

fn report_failure(record: &FailureRecord) -> Result<ExitCode> {
    error!(stage = %record.stage, error = %record.error, "FATAL");
    let json = serde_json::to_string_pretty(record).context("Failed to encode failure record")?;
    println!("{json}");
    println!("{}", record.summary());
    Ok(ExitCode::FAILURE)
}
