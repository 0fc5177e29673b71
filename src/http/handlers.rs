//! Route handlers for the public API.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticReport;
use crate::health::HealthStatus;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::prediction::{ImagePayload, PredictionResult};

const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub full_test: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub state: &'static str,
    #[serde(flatten)]
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticReport>,
}

/// `POST /api/predict`, multipart with the image under `file`.
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResult>, ApiError> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().unwrap_or("retina-image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file content: {}", e)))?;
        image = Some(ImagePayload::new(bytes.to_vec(), content_type).with_file_name(file_name));
    }

    let image = image.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing '{}' in multipart request", FILE_FIELD))
    })?;

    let result = state.gateway.classify(image).await?;
    Ok(Json(result))
}

/// `GET /api/health[?full_test=true]`
pub async fn health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Json<HealthResponse> {
    let status = state.gateway.health().await;
    let diagnostics = if query.full_test {
        Some(state.gateway.run_diagnostics().await)
    } else {
        None
    };

    Json(HealthResponse {
        state: state.gateway.state().name(),
        status: (*status).clone(),
        diagnostics,
    })
}

/// `GET /api/diagnostics`
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(state.gateway.run_diagnostics().await)
}
