use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use common::error::AppError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::query::ResolvedQuery;

const FILE_SEPARATOR: &str = "================================================";

/// The three-part output of a completed ingestion. Immutable once
/// produced; either the full triple exists or the ingestion failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

/// Seam for the ingestion step so tests can observe or stub it.
#[async_trait]
pub trait RepoIngestor: Send + Sync {
    async fn ingest(&self, query: &ResolvedQuery) -> Result<IngestionResult, AppError>;
}

/// Walks the resolved directory and assembles the summary/tree/content
/// triple. Filesystem work runs on the blocking pool.
pub struct FsIngestor;

#[async_trait]
impl RepoIngestor for FsIngestor {
    async fn ingest(&self, query: &ResolvedQuery) -> Result<IngestionResult, AppError> {
        let query = query.clone();
        tokio::task::spawn_blocking(move || ingest_directory(&query)).await?
    }
}

fn ingest_directory(query: &ResolvedQuery) -> Result<IngestionResult, AppError> {
    let root = scan_root(query);
    if !root.is_dir() {
        return Err(AppError::Ingestion(format!(
            "'{}' does not exist or is not a directory",
            root.display()
        )));
    }

    let include = match &query.include_patterns {
        Some(patterns) => Some(build_globset(patterns.iter())?),
        None => None,
    };
    // `.git` internals are never part of the ingested content
    let mut exclude_patterns = vec!["**/.git/**".to_owned(), ".git/**".to_owned()];
    if let Some(patterns) = &query.exclude_patterns {
        exclude_patterns.extend(patterns.iter().cloned());
    }
    let exclude = build_globset(exclude_patterns.iter())?;

    let mut files: Vec<(String, String)> = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry
            .map_err(|e| AppError::Ingestion(format!("failed to walk '{}': {e}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(&root)
            .unwrap_or_else(|_| entry.path())
            .to_string_lossy()
            .into_owned();

        if exclude.is_match(&rel) {
            continue;
        }
        if let Some(include) = &include {
            if !include.is_match(&rel) {
                continue;
            }
        }

        // Size cutoff: value is applied as given, files strictly larger
        // than the limit are skipped.
        let size = entry
            .metadata()
            .map_err(|e| AppError::Ingestion(format!("failed to stat '{rel}': {e}")))?
            .len();
        if size > query.max_file_size {
            debug!(file = %rel, size, "skipping oversized file");
            continue;
        }

        // Non-UTF-8 files are treated as binary and skipped
        let Ok(text) = fs::read_to_string(entry.path()) else {
            debug!(file = %rel, "skipping non-text file");
            continue;
        };
        files.push((rel, text));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));

    let tree = render_tree(&query.slug, files.iter().map(|(rel, _)| rel.as_str()));
    let content = render_content(&files);
    let summary = render_summary(query, files.len(), content.len());

    Ok(IngestionResult {
        summary,
        tree,
        content,
    })
}

fn scan_root(query: &ResolvedQuery) -> PathBuf {
    let subpath = query.subpath.trim_start_matches('/');
    if subpath.is_empty() {
        query.local_path.clone()
    } else {
        query.local_path.join(subpath)
    }
}

fn build_globset<'a, I>(patterns: I) -> Result<GlobSet, AppError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| AppError::Ingestion(format!("invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| AppError::Ingestion(format!("failed to build glob set: {e}")))
}

#[derive(Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
}

fn render_tree<'a, I>(slug: &str, paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = TreeNode::default();
    for path in paths {
        let mut node = &mut root;
        for component in path.split('/') {
            node = node.children.entry(component.to_owned()).or_default();
        }
    }

    let mut out = format!("Directory structure:\n└── {slug}/\n");
    render_children(&root, "    ", &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, (name, child)) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let marker = if child.children.is_empty() { "" } else { "/" };
        out.push_str(&format!("{prefix}{connector}{name}{marker}\n"));
        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_children(child, &child_prefix, out);
    }
}

fn render_content(files: &[(String, String)]) -> String {
    let mut content = String::new();
    for (rel, text) in files {
        content.push_str(FILE_SEPARATOR);
        content.push('\n');
        content.push_str(&format!("FILE: {rel}\n"));
        content.push_str(FILE_SEPARATOR);
        content.push('\n');
        content.push_str(text);
        if !text.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
    }
    content
}

fn render_summary(query: &ResolvedQuery, file_count: usize, content_len: usize) -> String {
    let mut summary = format!("Repository: {}\n", query.repository());
    if let Some(branch) = &query.branch {
        summary.push_str(&format!("Branch: {branch}\n"));
    }
    if query.subpath != "/" {
        summary.push_str(&format!("Subpath: {}\n", query.subpath));
    }
    summary.push_str(&format!("Files analyzed: {file_count}\n"));
    summary.push_str(&format!(
        "Estimated tokens: {}\n",
        format_token_estimate(content_len / 4)
    ));
    summary
}

fn format_token_estimate(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RepoSource;
    use std::collections::BTreeSet;
    use std::path::Path;

    fn write_file(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn local_query(root: &Path) -> ResolvedQuery {
        ResolvedQuery {
            source: RepoSource::Local {
                path: root.to_path_buf(),
            },
            slug: "fixtures/project".to_owned(),
            branch: None,
            subpath: "/".to_owned(),
            local_path: root.to_path_buf(),
            max_file_size: 1024,
            include_patterns: None,
            exclude_patterns: None,
        }
    }

    fn fixture() -> (tempfile::TempDir, ResolvedQuery) {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "README.md", b"hello\n");
        write_file(dir.path(), "src/main.rs", b"fn main() {}\n");
        write_file(dir.path(), ".git/config", b"[core]\n");
        write_file(dir.path(), "logo.bin", &[0xff, 0xfe, 0x00, 0x01]);
        write_file(dir.path(), "big.txt", &vec![b'x'; 4096]);
        let query = local_query(dir.path());
        (dir, query)
    }

    #[tokio::test]
    async fn ingests_text_files_and_skips_git_binary_and_oversized() {
        let (_dir, query) = fixture();
        let result = FsIngestor.ingest(&query).await.unwrap();

        assert!(result.content.contains("FILE: README.md"));
        assert!(result.content.contains("FILE: src/main.rs"));
        assert!(!result.content.contains(".git"));
        assert!(!result.content.contains("logo.bin"));
        assert!(!result.content.contains("big.txt"));
        assert!(result.summary.contains("Files analyzed: 2"));
        assert!(result.summary.starts_with("Repository: fixtures/project\n"));
    }

    #[tokio::test]
    async fn oversized_cutoff_is_exclusive_at_the_boundary() {
        let (_dir, mut query) = fixture();
        // big.txt is exactly 4096 bytes; a limit of 4096 keeps it
        query.max_file_size = 4096;
        let result = FsIngestor.ingest(&query).await.unwrap();
        assert!(result.content.contains("FILE: big.txt"));
    }

    #[tokio::test]
    async fn include_patterns_narrow_the_walk() {
        let (_dir, mut query) = fixture();
        query.include_patterns = Some(BTreeSet::from(["*.md".to_owned()]));
        let result = FsIngestor.ingest(&query).await.unwrap();

        assert!(result.content.contains("FILE: README.md"));
        assert!(!result.content.contains("FILE: src/main.rs"));
        assert!(result.summary.contains("Files analyzed: 1"));
    }

    #[tokio::test]
    async fn exclude_patterns_drop_matches() {
        let (_dir, mut query) = fixture();
        query.exclude_patterns = Some(BTreeSet::from(["src/**".to_owned()]));
        let result = FsIngestor.ingest(&query).await.unwrap();

        assert!(result.content.contains("FILE: README.md"));
        assert!(!result.content.contains("FILE: src/main.rs"));
    }

    #[tokio::test]
    async fn subpath_restricts_the_scan_root() {
        let (_dir, mut query) = fixture();
        query.subpath = "/src".to_owned();
        let result = FsIngestor.ingest(&query).await.unwrap();

        assert!(result.content.contains("FILE: main.rs"));
        assert!(!result.content.contains("README.md"));
        assert!(result.summary.contains("Subpath: /src"));
    }

    #[tokio::test]
    async fn tree_lists_directories_and_files() {
        let (_dir, query) = fixture();
        let result = FsIngestor.ingest(&query).await.unwrap();

        assert!(result.tree.starts_with("Directory structure:\n"));
        assert!(result.tree.contains("fixtures/project/"));
        assert!(result.tree.contains("README.md"));
        assert!(result.tree.contains("src/"));
        assert!(result.tree.contains("main.rs"));
    }

    #[tokio::test]
    async fn missing_directory_is_an_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut query = local_query(dir.path());
        query.subpath = "/no-such-dir".to_owned();

        let err = FsIngestor.ingest(&query).await.unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }
}
