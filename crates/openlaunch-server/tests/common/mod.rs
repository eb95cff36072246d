#![allow(dead_code)]

use axum::body::Body;
use axum::http::Response;
use openlaunch_db::{create_pool, DbRuntimeSettings};
use openlaunch_server::config::Settings;
use openlaunch_server::AppState;
use openlaunch_types::Environment;
use serde_json::Value;
use std::time::Duration;

/// Settings pointing at a port nothing listens on, with short timeouts.
pub fn unreachable_settings(environment: Environment) -> Settings {
    let mut settings = Settings::default();
    settings.app.environment = environment;
    settings.database.host = "127.0.0.1".to_string();
    settings.database.port = 1;
    settings.database.connect_timeout_secs = 1;
    settings
}

pub fn build_test_state(settings: Settings) -> AppState {
    let runtime = DbRuntimeSettings {
        acquire_timeout: Duration::from_millis(300),
        ..settings.database.runtime()
    };
    let pool = create_pool(settings.database.pg_config(), runtime);
    AppState::new(settings, pool)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
