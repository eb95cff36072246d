//! Process lifecycle: tracing setup, startup checks, serving and shutdown.

use crate::config::{ConfigError, LoggingConfig, Settings, DEFAULT_SECRET_KEY};
use crate::{create_application, AppState};
use openlaunch_db::{create_pool, dispose, run_migrations, verify_connectivity, DbError};
use std::future::Future;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database check or migrations failed at startup.
    #[error("database startup failed: {0}")]
    Database(#[from] DbError),

    /// The listener could not bind.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Subscriber for the diagnostics emitted while settings load, before the
/// configured one can be installed by [`init_tracing`].
///
/// Use it with `tracing::subscriber::with_default` around the settings load.
pub fn bootstrap_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(writer)
        .finish()
}

/// Installs the global `tracing` subscriber.
///
/// Calling it again is a no-op, so tests may call it freely.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::new(logging.level.as_directive());

    let result = if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Startup hook: checks that Postgres answers and applies pending
/// migrations.
///
/// # Errors
///
/// Returns `ServerError::Database` if the database is unreachable or a
/// migration fails.
pub async fn startup(state: &AppState) -> Result<(), ServerError> {
    let database = &state.settings.database;
    tracing::info!(database = %database.redacted_url(), "connecting to postgres");

    let pg_config = database.pg_config();
    tokio::task::spawn_blocking(move || verify_connectivity(&pg_config))
        .await
        .map_err(DbError::from)??;

    tracing::info!("successfully connected to postgres");

    let pool = state.pool.clone();
    let applied = tokio::task::spawn_blocking(move || -> Result<usize, DbError> {
        let mut conn = pool.get()?;
        Ok(run_migrations(&mut conn)?)
    })
    .await
    .map_err(DbError::from)??;
    if applied > 0 {
        tracing::info!(count = applied, "applied database migrations");
    }

    if state.settings.is_production() && state.settings.app.secret_key == DEFAULT_SECRET_KEY {
        tracing::warn!("running in production with the default secret_key");
    }

    Ok(())
}

/// Shutdown hook: disposes the database pool.
pub fn shutdown(state: AppState) {
    dispose(state.pool);
}

/// Builds the pool, runs [`startup`], serves until SIGINT/SIGTERM and runs
/// [`shutdown`].
///
/// # Errors
///
/// Returns `ServerError` if startup fails, the listener cannot bind, or
/// the server stops with an I/O error.
pub async fn serve(settings: Settings) -> Result<(), ServerError> {
    let pool = create_pool(settings.database.pg_config(), settings.database.runtime());
    let state = AppState::new(settings, pool);

    if let Err(e) = startup(&state).await {
        shutdown(state);
        return Err(e);
    }

    let addr = state.settings.bind_addr();
    let listener = match TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(source) => {
            shutdown(state);
            return Err(ServerError::Bind { addr, source });
        }
    };

    tracing::info!(%addr, environment = %state.settings.app.environment, "starting openlaunch server");

    serve_with_listener(state, listener, shutdown_signal()).await
}

/// Serves the application on an already-bound listener until `signal`
/// resolves, then runs [`shutdown`].
///
/// Does not run [`startup`]; callers decide whether the database must be
/// reachable first.
///
/// # Errors
///
/// Returns `ServerError::Serve` if the server stops with an I/O error.
pub async fn serve_with_listener<F>(
    state: AppState,
    listener: TcpListener,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_application(state.clone());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;

    shutdown(state);
    tracing::info!("openlaunch server shut down");

    served.map_err(ServerError::Serve)
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
