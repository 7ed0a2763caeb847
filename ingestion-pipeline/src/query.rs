use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cloning::CloneConfig;

/// Where resolved content comes from. Remote sources need a clone
/// before ingestion; local sources are read in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    Remote {
        url: String,
        user_name: String,
        repo_name: String,
    },
    Local {
        path: PathBuf,
    },
}

/// Normalized descriptor of one ingestion request. Request-scoped:
/// created by the resolver, discarded once the response is assembled.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub source: RepoSource,
    /// Canonical display name, always present.
    pub slug: String,
    /// Effective branch; an explicit caller override wins over the
    /// resolver-derived default.
    pub branch: Option<String>,
    /// Path within the repository tree, `/` for the root.
    pub subpath: String,
    /// Directory the ingestor reads from. For remote sources this is
    /// the clone target; for local sources the source path itself.
    pub local_path: PathBuf,
    pub max_file_size: u64,
    pub include_patterns: Option<BTreeSet<String>>,
    pub exclude_patterns: Option<BTreeSet<String>>,
}

impl ResolvedQuery {
    pub fn source_type(&self) -> &'static str {
        match self.source {
            RepoSource::Remote { .. } => "remote",
            RepoSource::Local { .. } => "local",
        }
    }

    /// Display identifier: `owner/repo` for remote sources, the slug
    /// otherwise.
    pub fn repository(&self) -> String {
        match &self.source {
            RepoSource::Remote {
                user_name,
                repo_name,
                ..
            } => format!("{user_name}/{repo_name}"),
            RepoSource::Local { .. } => self.slug.clone(),
        }
    }

    /// Clone configuration derived from this query, present only when
    /// the source is remote.
    pub fn clone_config(&self) -> Option<CloneConfig> {
        match &self.source {
            RepoSource::Remote { url, .. } => Some(CloneConfig {
                url: url.clone(),
                branch: self.branch.clone(),
                dest: self.local_path.clone(),
            }),
            RepoSource::Local { .. } => None,
        }
    }
}
