pub mod cloning;
pub mod ingestion;
pub mod query;
pub mod resolver;

pub use cloning::{CloneConfig, GitCloner, RepoAcquirer};
pub use ingestion::{FsIngestor, IngestionResult, RepoIngestor};
pub use query::{RepoSource, ResolvedQuery};
pub use resolver::{resolve_query, DEFAULT_MAX_FILE_SIZE};
