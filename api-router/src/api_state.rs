use std::sync::Arc;
use std::time::Duration;

use common::utils::config::AppConfig;
use ingestion_pipeline::{FsIngestor, GitCloner, RepoAcquirer, RepoIngestor};

use crate::middleware_rate_limit::RateGate;

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub acquirer: Arc<dyn RepoAcquirer>,
    pub ingestor: Arc<dyn RepoIngestor>,
    pub rate: Arc<RateGate>,
}

impl ApiState {
    pub fn new(config: &AppConfig) -> Self {
        Self::new_with_collaborators(
            config,
            Arc::new(GitCloner::new(Duration::from_secs(config.clone_timeout_secs))),
            Arc::new(FsIngestor),
        )
    }

    /// State with substituted acquisition/ingestion collaborators, used
    /// by tests and alternative deployments.
    pub fn new_with_collaborators(
        config: &AppConfig,
        acquirer: Arc<dyn RepoAcquirer>,
        ingestor: Arc<dyn RepoIngestor>,
    ) -> Self {
        Self {
            config: config.clone(),
            acquirer,
            ingestor,
            rate: Arc::new(RateGate::from_config(config)),
        }
    }
}
