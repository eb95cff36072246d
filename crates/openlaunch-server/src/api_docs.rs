//! Machine-readable API description, served outside production only.

use crate::config::Settings;
use crate::AppState;
use axum::{extract::Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Path the description is served at.
pub const OPENAPI_PATH: &str = "/openapi.json";

fn probe(summary: &str, description: &str) -> Value {
    json!({
        "get": {
            "summary": summary,
            "description": description,
            "responses": {
                "200": { "description": "OK" },
                "503": { "description": "Dependency unavailable" },
            },
        }
    })
}

/// Builds the OpenAPI document for the mounted routes.
pub fn document(settings: &Settings) -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": settings.app.title,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/health": probe("Liveness", "Reports that the process is serving requests."),
            "/health/ready": probe("Readiness", "Reports whether the database answers queries."),
        },
        "components": {
            "schemas": {
                "Error": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": {} },
                },
            },
        },
    })
}

/// Handler for `GET /openapi.json`.
pub async fn openapi_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(document(&state.settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_uses_configured_title() {
        let mut settings = Settings::default();
        settings.app.title = "Launch Docs".to_string();

        let doc = document(&settings);
        assert_eq!(doc["info"]["title"], "Launch Docs");
        assert!(doc["paths"]["/health"]["get"].is_object());
        assert!(doc["paths"]["/health/ready"]["get"].is_object());
    }
}
