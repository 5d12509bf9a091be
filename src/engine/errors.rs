use std::path::PathBuf;
use thiserror::Error;

/// The rule document itself is unusable. Always aborts the run.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("cannot find the precondition \"{name}\"")]
    UnknownPrecondition { name: String },

    #[error("cannot find the procedure \"{name}\"")]
    UnknownProcedure { name: String },

    #[error("failed to parse pattern '{pattern}' in \"{filter}\": {message}")]
    InvalidFilter {
        filter: String,
        pattern: String,
        message: String,
    },

    #[error("invalid parameters for procedure \"{procedure}\": {reason}")]
    InvalidParameters {
        procedure: String,
        reason: ParameterError,
    },

    #[error("rule #{rule}: {inner}")]
    InRule {
        rule: usize,
        inner: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Attach the index of the rule (0-based) that raised this error.
    pub fn in_rule(self, rule: usize) -> Self {
        match self {
            ConfigurationError::InRule { .. } => self,
            other => ConfigurationError::InRule {
                rule,
                inner: Box::new(other),
            },
        }
    }

    /// The error without any rule context.
    pub fn root(&self) -> &ConfigurationError {
        match self {
            ConfigurationError::InRule { inner, .. } => inner.root(),
            other => other,
        }
    }
}

/// A procedure was handed a parameter list it cannot work with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("expected {expected} parameter(s) but {found} were given")]
    WrongCount { expected: usize, found: usize },

    #[error("parameters are consumed as pairs but {found} were given")]
    UnpairedParameters { found: usize },

    #[error("the string to replace cannot be empty")]
    EmptySearch,

    #[error("cannot build a matcher from the parameters: {message}")]
    InvalidPattern { message: String },

    #[error(
        "dependencies must use one of the formats \"groupId:artifactId\" -> \"groupId:artifactId\", \
         \"groupId:artifactId:version\" -> \"groupId:artifactId:version\" or \
         \"groupId:artifactId:*\" -> \"groupId:artifactId\" (remove version), \
         but \"{old}\" and \"{new}\" were found"
    )]
    InvalidCoordinates { old: String, new: String },
}

/// Failure raised while a procedure runs over one file's content.
#[derive(Error, Debug)]
pub enum ProcedureError {
    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error("cannot remove {suffix_len} trailing bytes from content of {content_len} bytes")]
    SuffixTooLong {
        suffix_len: usize,
        content_len: usize,
    },
}

/// Failure of a procedure chain over one buffer, before any file context.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("procedure \"{procedure}\" failed: {reason}")]
    Procedure {
        procedure: String,
        reason: ProcedureError,
    },
}

/// Outcome of a single file task that did not complete.
///
/// Only [`TaskError::Configuration`] is fatal for the run; every other
/// variant is scoped to the file that raised it.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("error reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("procedure \"{procedure}\" failed on {path}: {reason}")]
    Procedure {
        path: PathBuf,
        procedure: String,
        reason: ProcedureError,
    },
}

impl TaskError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Configuration(_))
    }

    pub(crate) fn from_pipeline(err: PipelineError, path: &std::path::Path) -> Self {
        match err {
            PipelineError::Configuration(err) => TaskError::Configuration(err),
            PipelineError::Procedure { procedure, reason } => TaskError::Procedure {
                path: path.to_path_buf(),
                procedure,
                reason,
            },
        }
    }
}
