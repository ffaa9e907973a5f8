//! drainguardd: the drainguard sidecar.
//!
//! Runs next to the workload container of an ECS task whose service uses
//! Service Connect. Cloud Map keeps routing to every registered instance
//! regardless of health, so this process withdraws its task from the
//! Cloud Map service as soon as the task turns unhealthy, starts
//! shutting down, or receives SIGTERM, and then exits.
//!
//! # Usage
//!
//! ```text
//! ECS_CONTAINER_METADATA_URI_V4=http://169.254.170.2/v4/... drainguardd
//! ```
//!
//! Exit status is 0 after a confirmed deregistration or when there is
//! nothing to manage, and 1 on any failure.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use envconfig::Envconfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use drainguard_aws::{clients_from_env, MetadataClient};
use drainguard_controller::{Lifecycle, LifecycleSettings, Outcome, SignalWatcher};

use crate::config::{Config, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::init_from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or_default(),
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration from env");
            return ExitCode::FAILURE;
        }
    };

    let settings = match config.lifecycle_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&config, settings).await;
    match &result {
        Ok(outcome) => report(outcome),
        Err(e) => error!(error = ?e, "drainguard failed"),
    }
    exit_code(&result)
}

/// Any finished outcome is a clean exit; every error is a failure.
fn exit_code(result: &anyhow::Result<Outcome>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drainguard=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(config: &Config, settings: LifecycleSettings) -> anyhow::Result<Outcome> {
    info!("drainguard starting");

    // Handlers go in first so a SIGTERM during warm-up is not lost.
    let (_watcher, stop) =
        SignalWatcher::spawn().context("failed to install signal handlers")?;

    let metadata = MetadataClient::new(&config.metadata_endpoint)?;
    info!(endpoint = %metadata.uri(), "using task metadata endpoint");

    let (control_plane, registry) = clients_from_env().await;

    let lifecycle = Lifecycle::new(
        Arc::new(metadata),
        Arc::new(control_plane),
        Arc::new(registry),
        settings,
    );

    Ok(lifecycle.run(stop).await?)
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Standalone => {
            info!("task is not part of a service; exiting");
        }
        Outcome::NoRegistry { service } => {
            info!(%service, "service connect is not enabled; exiting");
        }
        Outcome::Deregistered(done) => {
            info!(
                operation_id = %done.operation.operation_id,
                trigger = %done.trigger,
                samples = done.samples,
                "task withdrawn from the registry; goodbye"
            );
        }
    }
}
