use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use common::error::AppError;
use url::Url;
use uuid::Uuid;

use crate::query::{RepoSource, ResolvedQuery};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Turn a raw source string plus constraints into a [`ResolvedQuery`].
///
/// `http(s)` sources become remote queries with a fresh per-request
/// clone directory under `clone_dir`. Anything else must name an
/// existing local directory, except that when `from_web` is set a bare
/// `owner/repo` shorthand is expanded to a GitHub URL. Ambiguous
/// strings are rejected as validation errors rather than
/// reinterpreted.
pub fn resolve_query(
    source: &str,
    max_file_size: u64,
    from_web: bool,
    include_patterns: Option<BTreeSet<String>>,
    exclude_patterns: Option<BTreeSet<String>>,
    clone_dir: &Path,
) -> Result<ResolvedQuery, AppError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(AppError::Validation("source must not be empty".to_owned()));
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        return resolve_remote(
            source,
            max_file_size,
            include_patterns,
            exclude_patterns,
            clone_dir,
        );
    }

    let path = PathBuf::from(source);
    if path.is_dir() {
        return resolve_local(&path, max_file_size, include_patterns, exclude_patterns);
    }

    if from_web {
        if let Some((owner, repo)) = github_shorthand(source) {
            return resolve_remote(
                &format!("https://github.com/{owner}/{repo}"),
                max_file_size,
                include_patterns,
                exclude_patterns,
                clone_dir,
            );
        }
    }

    Err(AppError::Validation(format!(
        "could not resolve '{source}' as a repository URL or local directory"
    )))
}

fn resolve_remote(
    source: &str,
    max_file_size: u64,
    include_patterns: Option<BTreeSet<String>>,
    exclude_patterns: Option<BTreeSet<String>>,
    clone_dir: &Path,
) -> Result<ResolvedQuery, AppError> {
    let parsed = Url::parse(source)
        .map_err(|e| AppError::Validation(format!("invalid repository URL '{source}': {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::Validation(format!("URL '{source}' has no host")))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() < 2 {
        return Err(AppError::Validation(format!(
            "URL '{source}' does not reference a repository"
        )));
    }

    let user_name = segments[0].to_owned();
    let repo_name = segments[1].trim_end_matches(".git").to_owned();

    // Recognize `/tree/<branch>[/<subpath>]` and `/blob/<branch>/<file>`
    // suffixes; everything else after owner/repo is ignored.
    let mut branch = None;
    let mut subpath = "/".to_owned();
    if segments.len() >= 4 && matches!(segments[2], "tree" | "blob") {
        branch = Some(segments[3].to_owned());
        if segments.len() > 4 {
            subpath = format!("/{}", segments[4..].join("/"));
        }
    }

    // Non-default ports are part of the clone address
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    let url = format!("{}://{authority}/{user_name}/{repo_name}", parsed.scheme());
    let slug = format!("{user_name}/{repo_name}");
    let local_path = clone_dir
        .join(Uuid::new_v4().to_string())
        .join(format!("{user_name}-{repo_name}"));

    Ok(ResolvedQuery {
        source: RepoSource::Remote {
            url,
            user_name,
            repo_name,
        },
        slug,
        branch,
        subpath,
        local_path,
        max_file_size,
        include_patterns,
        exclude_patterns,
    })
}

fn resolve_local(
    path: &Path,
    max_file_size: u64,
    include_patterns: Option<BTreeSet<String>>,
    exclude_patterns: Option<BTreeSet<String>>,
) -> Result<ResolvedQuery, AppError> {
    let path = path.canonicalize().map_err(|e| {
        AppError::Validation(format!(
            "could not resolve local path '{}': {e}",
            path.display()
        ))
    })?;

    let name = path
        .file_name()
        .map_or_else(|| "/".to_owned(), |n| n.to_string_lossy().into_owned());
    let slug = match path.parent().and_then(Path::file_name) {
        Some(parent) => format!("{}/{name}", parent.to_string_lossy()),
        None => name,
    };

    Ok(ResolvedQuery {
        source: RepoSource::Local { path: path.clone() },
        slug,
        branch: None,
        subpath: "/".to_owned(),
        local_path: path,
        max_file_size,
        include_patterns,
        exclude_patterns,
    })
}

/// `owner/repo` shorthand: exactly two segments of URL-safe name
/// characters.
fn github_shorthand(source: &str) -> Option<(&str, &str)> {
    let (owner, repo) = source.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    if valid(owner) && valid(repo) {
        Some((owner, repo))
    } else {
        None
    }
}
