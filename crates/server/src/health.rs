use std::path::{Path, PathBuf};

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::bootstrap::Readiness;

#[derive(Clone)]
pub struct HealthState {
    readiness: Readiness,
    storage_paths: Vec<PathBuf>,
}

impl HealthState {
    pub fn new(readiness: Readiness, storage_paths: Vec<PathBuf>) -> Self {
        Self { readiness, storage_paths }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub generator: HealthCheck,
    pub places: HealthCheck,
    pub nutrition: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

/// Ready when places and storage are usable. A missing generator or USDA key
/// only degrades answers, so those checks never fail the endpoint.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = storage_check(&state.storage_paths).await;
    let places = configured_check(state.readiness.places_configured, "google maps key present");
    let ready = storage.status == "ready" && places.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        generator: configured_check(state.readiness.generator_configured, "generator key present"),
        places,
        nutrition: configured_check(state.readiness.nutrition_configured, "usda key present"),
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn configured_check(configured: bool, detail: &str) -> HealthCheck {
    if configured {
        HealthCheck { status: "ready", detail: detail.to_string() }
    } else {
        HealthCheck { status: "unconfigured", detail: "credential missing".to_string() }
    }
}

/// Each store's directory must exist; the files themselves appear on first write.
async fn storage_check(paths: &[PathBuf]) -> HealthCheck {
    for path in paths {
        let directory = parent_dir(path);
        match tokio::fs::metadata(directory).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return HealthCheck {
                    status: "degraded",
                    detail: format!("`{}` is not a directory", directory.display()),
                }
            }
            Err(error) => {
                return HealthCheck {
                    status: "degraded",
                    detail: format!("`{}` unavailable: {error}", directory.display()),
                }
            }
        }
    }
    HealthCheck { status: "ready", detail: "storage directories reachable".to_string() }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use crate::bootstrap::Readiness;
    use crate::health::{health, HealthState};

    fn readiness() -> Readiness {
        Readiness { generator_configured: false, places_configured: true, nutrition_configured: true }
    }

    #[tokio::test]
    async fn health_returns_ready_when_storage_is_reachable() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let state = HealthState::new(
            readiness(),
            vec![dir.path().join("wishlist.json"), "style.json".into()],
        );

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.storage.status, "ready");
        assert_eq!(payload.generator.status, "unconfigured");
        assert_eq!(payload.nutrition.status, "ready");
        Ok(())
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_storage_dir_is_missing() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let state = HealthState::new(readiness(), vec![dir.path().join("gone").join("wishlist.json")]);

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.storage.status, "degraded");
        assert_eq!(payload.places.status, "ready");
        Ok(())
    }
}
