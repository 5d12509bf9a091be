//! Candidate-file discovery.

use crate::engine::{ConfigurationError, FileFilter};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("invalid exclude pattern: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// List the regular files under `root`, sorted by file name.
///
/// Directories whose base name matches `exclude` (pipe-separated globs) are
/// pruned together with their whole subtree. Symlinks are not followed. The
/// rule document, when it lives inside the tree, is left out.
pub fn discover_files(
    root: &Path,
    exclude: &str,
    rule_document: Option<&Path>,
) -> Result<Vec<PathBuf>, WalkError> {
    let exclude = FileFilter::parse(exclude)?;
    let rule_document = rule_document.and_then(|path| {
        let canonical = fs::canonicalize(path).ok()?;
        Some((canonical.file_name()?.to_os_string(), canonical))
    });

    let is_excluded =
        |entry: &DirEntry| entry.file_type().is_dir() && exclude.matches_os(entry.file_name());

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let excluded = is_excluded(entry);
            if excluded {
                tracing::debug!(dir = %entry.path().display(), "excluded directory");
            }
            !excluded
        })
    {
        let entry = entry.map_err(|source| WalkError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some((name, canonical)) = &rule_document {
            if entry.file_name() == name.as_os_str()
                && fs::canonicalize(entry.path()).is_ok_and(|path| &path == canonical)
            {
                tracing::debug!(file = %entry.path().display(), "skipping the rule document");
                continue;
            }
        }
        files.push(entry.into_path());
    }

    tracing::info!(root = %root.display(), files = files.len(), "discovered files");
    Ok(files)
}
