use std::collections::BTreeSet;
use std::path::Path;

use axum::{
    extract::{Query, State},
    Json,
};
use common::{
    error::AppError,
    utils::patterns::{normalize_patterns, parse_pattern_list},
};
use ingestion_pipeline::{resolve_query, IngestionResult, ResolvedQuery, DEFAULT_MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{api_state::ApiState, error::ApiError};

pub const MIN_FILE_SIZE_LIMIT: u64 = 1024;
pub const MAX_FILE_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

/// Structured-body ingestion request.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    /// Git repository URL or local path
    pub source: String,
    /// Maximum file size to process, in bytes
    pub max_file_size: Option<u64>,
    /// Patterns to include (Unix shell-style wildcards)
    pub include_patterns: Option<BTreeSet<String>>,
    /// Patterns to exclude (Unix shell-style wildcards)
    pub exclude_patterns: Option<BTreeSet<String>>,
    /// Specific branch to clone and ingest
    pub branch: Option<String>,
}

impl IngestRequest {
    /// Boundary validation, runs before any resolution or network work.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.source.trim().is_empty() {
            return Err(ApiError::Validation("source must not be empty".to_owned()));
        }
        let max_file_size = self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);
        if !(MIN_FILE_SIZE_LIMIT..=MAX_FILE_SIZE_LIMIT).contains(&max_file_size) {
            return Err(ApiError::Validation(format!(
                "max_file_size must be between {MIN_FILE_SIZE_LIMIT} and {MAX_FILE_SIZE_LIMIT} bytes"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestData {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestMetadata {
    pub source_type: String,
    pub repository: String,
    pub branch: String,
    pub subpath: String,
}

/// Unified success/error envelope. Exactly one of `data`/`error` is
/// populated per the success flag; `metadata` is present iff success.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub data: Option<IngestData>,
    pub error: Option<String>,
    pub metadata: Option<IngestMetadata>,
}

pub async fn ingest_repository(
    State(state): State<ApiState>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    Ok(Json(run_ingest_pipeline(&state, body).await?))
}

/// Flat-parameter variant of [`IngestRequest`], patterns as
/// comma-delimited strings.
#[derive(Debug, Deserialize)]
pub struct IngestParams {
    pub source: String,
    pub max_file_size: Option<u64>,
    pub include_patterns: Option<String>,
    pub exclude_patterns: Option<String>,
    pub branch: Option<String>,
}

pub async fn ingest_repository_get(
    State(state): State<ApiState>,
    Query(params): Query<IngestParams>,
) -> Result<Json<IngestResponse>, ApiError> {
    let body = IngestRequest {
        source: params.source,
        max_file_size: params.max_file_size,
        include_patterns: params.include_patterns.as_deref().and_then(parse_pattern_list),
        exclude_patterns: params.exclude_patterns.as_deref().and_then(parse_pattern_list),
        branch: params.branch,
    };

    Ok(Json(run_ingest_pipeline(&state, body).await?))
}

/// The single internal pipeline both transports share:
/// validate → resolve → acquire (remote only) → ingest → assemble.
///
/// Validation and resolution failures surface as [`ApiError`] (a client
/// error, HTTP 400); acquisition and ingestion failures are folded into
/// the failure envelope.
pub(crate) async fn run_ingest_pipeline(
    state: &ApiState,
    body: IngestRequest,
) -> Result<IngestResponse, ApiError> {
    body.validate()?;
    let max_file_size = body.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);

    info!(source = %body.source, max_file_size, "received ingestion request");

    let mut query = resolve_query(
        &body.source,
        max_file_size,
        true,
        body.include_patterns.and_then(normalize_patterns),
        body.exclude_patterns.and_then(normalize_patterns),
        Path::new(&state.config.clone_dir),
    )
    .map_err(ApiError::from)?;

    // Explicit branch override wins over the resolver's default
    if let Some(branch) = body.branch {
        query.branch = Some(branch);
    }

    match acquire_and_ingest(state, &query).await {
        Ok(result) => Ok(IngestResponse {
            success: true,
            data: Some(IngestData {
                summary: result.summary,
                tree: result.tree,
                content: result.content,
            }),
            error: None,
            metadata: Some(IngestMetadata {
                source_type: query.source_type().to_owned(),
                repository: query.repository(),
                branch: query.branch.clone().unwrap_or_else(|| "default".to_owned()),
                subpath: query.subpath.clone(),
            }),
        }),
        Err(err) => {
            warn!(source_type = query.source_type(), error = %err, "ingestion pipeline failed");
            Ok(IngestResponse {
                success: false,
                data: None,
                error: Some(err.to_string()),
                metadata: None,
            })
        }
    }
}

async fn acquire_and_ingest(
    state: &ApiState,
    query: &ResolvedQuery,
) -> Result<IngestionResult, AppError> {
    // Local sources are read in place; only remote ones are acquired
    let Some(clone_config) = query.clone_config() else {
        return state.ingestor.ingest(query).await;
    };

    let result = async {
        state.acquirer.acquire(&clone_config).await?;
        state.ingestor.ingest(query).await
    }
    .await;

    // The checkout is request-scoped: drop the per-request directory
    // whether ingestion succeeded, failed, or the clone left a partial
    // tree behind.
    remove_clone_dir(&clone_config.dest).await;

    result
}

async fn remove_clone_dir(dest: &Path) {
    // dest is clone_dir/<request id>/<owner>-<repo>; the request-scoped
    // unit is the uuid-named parent
    let target = dest.parent().unwrap_or(dest);
    if let Err(err) = tokio::fs::remove_dir_all(target).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %target.display(), error = %err, "failed to remove clone directory");
        }
    }
}
