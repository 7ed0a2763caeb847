use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use middleware_rate_limit::{ingest_rate_limit, summary_rate_limit};
use routes::{
    health::health,
    ingest::{ingest_repository, ingest_repository_get},
    summary::get_repository_summary,
};

pub mod api_state;
pub mod error;
pub mod middleware_rate_limit;
pub mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Liveness endpoint, never rate limited
    let public = Router::new().route("/health", get(health));

    // Full ingestion endpoints share one quota; the lightweight summary
    // endpoint gets its own, more generous one.
    let full = Router::new()
        .route(
            "/ingest",
            post(ingest_repository)
                .get(ingest_repository_get)
                .layer(DefaultBodyLimit::max(
                    app_state.config.ingest_max_body_bytes,
                )),
        )
        .route_layer(from_fn_with_state(app_state.clone(), ingest_rate_limit));

    let summary = Router::new()
        .route("/ingest/summary", get(get_repository_summary))
        .route_layer(from_fn_with_state(app_state.clone(), summary_rate_limit));

    public.merge(full).merge(summary)
}
