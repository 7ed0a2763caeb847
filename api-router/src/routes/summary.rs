use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api_state::ApiState,
    error::ApiError,
    routes::ingest::{run_ingest_pipeline, IngestRequest},
};

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub source: String,
    pub branch: Option<String>,
}

/// Summary-only view of a full ingestion result.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub source: String,
    pub summary: String,
    pub repository: String,
    pub branch: String,
}

/// Runs the full pipeline but exposes only the summary. An underlying
/// failure becomes an error response, never a partial summary.
pub async fn get_repository_summary(
    State(state): State<ApiState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let body = IngestRequest {
        source: params.source.clone(),
        max_file_size: None,
        include_patterns: None,
        exclude_patterns: None,
        branch: params.branch,
    };

    let response = run_ingest_pipeline(&state, body).await?;

    if !response.success {
        return Err(ApiError::Validation(
            response
                .error
                .unwrap_or_else(|| "ingestion failed".to_owned()),
        ));
    }

    let data = response
        .data
        .ok_or_else(|| ApiError::Internal("successful response missing data".to_owned()))?;
    let metadata = response
        .metadata
        .ok_or_else(|| ApiError::Internal("successful response missing metadata".to_owned()))?;

    Ok(Json(SummaryResponse {
        source: params.source,
        summary: data.summary,
        repository: metadata.repository,
        branch: metadata.branch,
    }))
}
