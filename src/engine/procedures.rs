//! Built-in procedures and the in-order pipeline runner.

use crate::engine::dependency;
use crate::engine::errors::{ParameterError, PipelineError, ProcedureError};
use crate::engine::registry::{BoundProcedure, Procedure, Registry};
use crate::regex_cache;
use regex::bytes::{NoExpand, Regex};

/// Append the single parameter to the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Insert;

impl Procedure for Insert {
    fn validate(&self, params: &[String]) -> Result<(), ParameterError> {
        expect_count(params, 1)
    }

    fn apply(&self, mut content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError> {
        expect_count(params, 1)?;
        content.extend_from_slice(params[0].as_bytes());
        Ok(content)
    }
}

/// Drop as many trailing bytes as the single parameter is long.
///
/// Only the length of the parameter counts; the trailing bytes are not
/// compared with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveAtEnd;

impl Procedure for RemoveAtEnd {
    fn validate(&self, params: &[String]) -> Result<(), ParameterError> {
        expect_count(params, 1)
    }

    fn apply(&self, mut content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError> {
        expect_count(params, 1)?;
        let suffix_len = params[0].len();
        let content_len = content.len();
        if suffix_len > content_len {
            return Err(ProcedureError::SuffixTooLong {
                suffix_len,
                content_len,
            });
        }
        content.truncate(content_len - suffix_len);
        Ok(content)
    }
}

/// Literal, global substitution of `old, new` pairs, each applied to the
/// output of the previous pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl Replace {
    fn check(params: &[String]) -> Result<(), ParameterError> {
        if params.len() % 2 != 0 {
            return Err(ParameterError::UnpairedParameters {
                found: params.len(),
            });
        }
        if params.chunks_exact(2).any(|pair| pair[0].is_empty()) {
            return Err(ParameterError::EmptySearch);
        }
        Ok(())
    }

    /// Literal matcher for one search string.
    fn matcher(old: &str) -> Result<Regex, ParameterError> {
        regex_cache::get_or_compile(&regex::escape(old)).map_err(|err| {
            ParameterError::InvalidPattern {
                message: err.to_string(),
            }
        })
    }
}

impl Procedure for Replace {
    fn validate(&self, params: &[String]) -> Result<(), ParameterError> {
        Self::check(params)?;
        for pair in params.chunks_exact(2) {
            Self::matcher(&pair[0])?;
        }
        Ok(())
    }

    fn apply(&self, mut content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError> {
        Self::check(params)?;
        for pair in params.chunks_exact(2) {
            let (old, new) = (&pair[0], &pair[1]);
            let regex = Self::matcher(old)?;
            if !regex.is_match(&content) {
                continue;
            }
            content = regex
                .replace_all(&content, NoExpand(new.as_bytes()))
                .into_owned();
            tracing::trace!("{old} -> {new}");
        }
        Ok(content)
    }
}

/// Rewrite dependency coordinates, see [`dependency`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceDependency;

impl Procedure for ReplaceDependency {
    fn validate(&self, params: &[String]) -> Result<(), ParameterError> {
        dependency::validate_pairs(params)
    }

    fn apply(&self, content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError> {
        Ok(dependency::replace_dependencies(content, params)?)
    }
}

fn expect_count(params: &[String], expected: usize) -> Result<(), ParameterError> {
    if params.len() != expected {
        return Err(ParameterError::WrongCount {
            expected,
            found: params.len(),
        });
    }
    Ok(())
}

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry
        .register_procedure("insert", Insert)
        .register_procedure("remove-at-end", RemoveAtEnd)
        .register_procedure("replace", Replace)
        .register_procedure("replace-dependency", ReplaceDependency)
        .alias_procedure("Insert", "insert")
        .alias_procedure("RemoveAtEnd", "remove-at-end")
        .alias_procedure("Replace", "replace")
        .alias_procedure("ReplaceMavenDependency", "replace-dependency")
        .alias_procedure("ReplaceMavenDependencyWithVersion", "replace-dependency");
}

/// Run bound procedures in declared order, each over the previous output.
pub fn apply(procedures: &[BoundProcedure], content: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
    procedures
        .iter()
        .try_fold(content, |content, procedure| procedure.apply(content))
}
