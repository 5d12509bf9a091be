//! The transformation engine.
//!
//! A [`RuleSet`] is compiled once against a [`Registry`] into an [`Engine`]:
//! filters are parsed and every precondition and procedure name is resolved,
//! so a broken rule document fails before any file is read. The engine is
//! then shared read-only by every file task.

pub mod conditions;
pub mod dependency;
pub mod dispatch;
pub mod errors;
pub mod filter;
pub mod procedures;
pub mod registry;
pub mod task;

pub use dispatch::{Concurrency, RunOptions, RunSummary};
pub use errors::{
    ConfigurationError, ParameterError, PipelineError, ProcedureError, TaskError,
};
pub use filter::{matches, FileFilter};
pub use registry::{BoundPrecondition, BoundProcedure, Precondition, Procedure, Registry};
pub use task::FileTask;

use crate::config::RuleSet;
use std::path::PathBuf;

/// A rule with its filter parsed and its names resolved.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Position of the rule in the document.
    pub index: usize,
    pub filter: FileFilter,
    pub preconditions: Vec<BoundPrecondition>,
    pub procedures: Vec<BoundProcedure>,
}

#[derive(Debug, Clone)]
pub struct Engine {
    rules: Vec<CompiledRule>,
}

impl Engine {
    pub fn compile(rules: &RuleSet, registry: &Registry) -> Result<Self, ConfigurationError> {
        let rules = rules
            .transformations
            .iter()
            .enumerate()
            .map(|(index, rule)| -> Result<CompiledRule, ConfigurationError> {
                let compiled = CompiledRule {
                    index,
                    filter: FileFilter::parse(&rule.filter).map_err(|err| err.in_rule(index))?,
                    preconditions: registry
                        .bind_preconditions(&rule.pre)
                        .map_err(|err| err.in_rule(index))?,
                    procedures: registry
                        .bind_procedures(&rule.proc)
                        .map_err(|err| err.in_rule(index))?,
                };
                if compiled.filter.is_empty() {
                    tracing::warn!(rule = index, "rule has an empty filter and selects no file");
                }
                Ok(compiled)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(rules = rules.len(), "compiled rule set");
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }
}

/// Compile `rules` against the built-in registry and run them over `paths`.
pub fn run(
    paths: &[PathBuf],
    rules: &RuleSet,
    options: &RunOptions,
) -> Result<RunSummary, ConfigurationError> {
    Engine::compile(rules, &Registry::builtin())?.run(paths, options)
}
