//! OpenLaunch server binary.
//!
//! Loads settings, installs structured logging, checks the database and
//! serves the HTTP API with graceful shutdown on SIGTERM/SIGINT.

use openlaunch_server::config::{self, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use openlaunch_server::lifecycle;
use std::process::ExitCode;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() -> ExitCode {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

    let loaded = tracing::subscriber::with_default(
        lifecycle::bootstrap_subscriber(std::io::stderr),
        || config::init_settings(Some(selected_config_path)),
    );
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    lifecycle::init_tracing(&settings.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path,
        environment = %settings.app.environment,
        "resolved startup configuration"
    );

    match lifecycle::serve(settings.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "openlaunch server failed");
            ExitCode::FAILURE
        }
    }
}
