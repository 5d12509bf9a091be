//! File-name selection for rules.
//!
//! A filter expression is a `|`-separated list of shell-style globs (`*`,
//! `?`, `[...]`). A file is selected when its base name matches any one of
//! them. Empty alternatives are ignored, so an empty expression selects
//! nothing.

use crate::engine::errors::ConfigurationError;
use glob::Pattern;
use std::ffi::OsStr;
use std::path::Path;

/// A compiled filter expression.
#[derive(Debug, Clone)]
pub struct FileFilter {
    expression: String,
    patterns: Vec<Pattern>,
}

impl FileFilter {
    /// Compile a `|`-separated glob list. Malformed globs are fatal.
    pub fn parse(expression: &str) -> Result<Self, ConfigurationError> {
        let patterns = expression
            .split('|')
            .filter(|alternative| !alternative.is_empty())
            .map(|alternative| {
                Pattern::new(alternative).map_err(|err| ConfigurationError::InvalidFilter {
                    filter: expression.to_string(),
                    pattern: alternative.to_string(),
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expression: expression.to_string(),
            patterns,
        })
    }

    /// Match a bare file name (no directory components).
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// Match the base name of `path`.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.matches_os(name))
    }

    pub fn matches_os(&self, name: &OsStr) -> bool {
        self.matches(&name.to_string_lossy())
    }

    /// True when the filter can never select anything.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// One-shot form of [`FileFilter::parse`] followed by [`FileFilter::matches`].
pub fn matches(file_base_name: &str, filter: &str) -> Result<bool, ConfigurationError> {
    Ok(FileFilter::parse(filter)?.matches(file_base_name))
}
