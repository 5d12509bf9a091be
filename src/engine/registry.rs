//! Name → behaviour lookup for preconditions and procedures.
//!
//! Rule documents refer to preconditions and procedures by name. Names are
//! resolved against a [`Registry`] once, when a rule set is compiled, and an
//! unknown name is a [`ConfigurationError`]. New behaviour is added by
//! registering another implementation; call sites never change.

use crate::config::ProcedureCall;
use crate::engine::errors::{ConfigurationError, ParameterError, PipelineError, ProcedureError};
use crate::engine::{conditions, procedures};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A named boolean predicate over a file and its content.
pub trait Precondition: Send + Sync {
    fn check(&self, file: &Path, content: &[u8]) -> bool;
}

impl<F> Precondition for F
where
    F: Fn(&Path, &[u8]) -> bool + Send + Sync,
{
    fn check(&self, file: &Path, content: &[u8]) -> bool {
        self(file, content)
    }
}

/// A named, parameterised transformation of a file's content.
pub trait Procedure: Send + Sync {
    /// Reject parameter lists this procedure can never accept.
    ///
    /// Called when a rule set is compiled, so a malformed rule is reported
    /// before any file is touched. `apply` must still check its parameters.
    fn validate(&self, params: &[String]) -> Result<(), ParameterError> {
        let _ = params;
        Ok(())
    }

    fn apply(&self, content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError>;
}

impl<F> Procedure for F
where
    F: Fn(Vec<u8>, &[String]) -> Result<Vec<u8>, ProcedureError> + Send + Sync,
{
    fn apply(&self, content: Vec<u8>, params: &[String]) -> Result<Vec<u8>, ProcedureError> {
        self(content, params)
    }
}

/// A precondition resolved from its name.
#[derive(Clone)]
pub struct BoundPrecondition {
    pub name: String,
    precondition: Arc<dyn Precondition>,
}

impl BoundPrecondition {
    pub fn check(&self, file: &Path, content: &[u8]) -> bool {
        self.precondition.check(file, content)
    }
}

impl fmt::Debug for BoundPrecondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundPrecondition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A procedure resolved from its name, together with its parameters.
#[derive(Clone)]
pub struct BoundProcedure {
    pub name: String,
    pub params: Vec<String>,
    procedure: Arc<dyn Procedure>,
}

impl BoundProcedure {
    /// Run the procedure. Parameter problems surface as configuration errors.
    pub fn apply(&self, content: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        self.procedure
            .apply(content, &self.params)
            .map_err(|err| match err {
                ProcedureError::Parameters(reason) => {
                    PipelineError::Configuration(ConfigurationError::InvalidParameters {
                        procedure: self.name.clone(),
                        reason,
                    })
                }
                reason => PipelineError::Procedure {
                    procedure: self.name.clone(),
                    reason,
                },
            })
    }
}

impl fmt::Debug for BoundProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundProcedure")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Lookup table from names to preconditions and procedures.
#[derive(Clone, Default)]
pub struct Registry {
    preconditions: HashMap<String, Arc<dyn Precondition>>,
    procedures: HashMap<String, Arc<dyn Procedure>>,
}

impl Registry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in precondition and procedure.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        conditions::register_builtins(&mut registry);
        procedures::register_builtins(&mut registry);
        registry
    }

    pub fn register_precondition(
        &mut self,
        name: impl Into<String>,
        precondition: impl Precondition + 'static,
    ) -> &mut Self {
        self.preconditions
            .insert(name.into(), Arc::new(precondition));
        self
    }

    pub fn register_procedure(
        &mut self,
        name: impl Into<String>,
        procedure: impl Procedure + 'static,
    ) -> &mut Self {
        self.procedures.insert(name.into(), Arc::new(procedure));
        self
    }

    /// Register an additional name for an already registered precondition.
    pub fn alias_precondition(&mut self, alias: impl Into<String>, name: &str) -> &mut Self {
        if let Some(existing) = self.preconditions.get(name).cloned() {
            self.preconditions.insert(alias.into(), existing);
        }
        self
    }

    /// Register an additional name for an already registered procedure.
    pub fn alias_procedure(&mut self, alias: impl Into<String>, name: &str) -> &mut Self {
        if let Some(existing) = self.procedures.get(name).cloned() {
            self.procedures.insert(alias.into(), existing);
        }
        self
    }

    pub fn has_precondition(&self, name: &str) -> bool {
        self.preconditions.contains_key(name)
    }

    pub fn has_procedure(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Resolve precondition names, in declared order.
    pub fn bind_preconditions(
        &self,
        names: &[String],
    ) -> Result<Vec<BoundPrecondition>, ConfigurationError> {
        names
            .iter()
            .map(|name| {
                self.preconditions
                    .get(name)
                    .map(|precondition| BoundPrecondition {
                        name: name.clone(),
                        precondition: Arc::clone(precondition),
                    })
                    .ok_or_else(|| ConfigurationError::UnknownPrecondition { name: name.clone() })
            })
            .collect()
    }

    /// Resolve procedure calls, in declared order, and validate their parameters.
    pub fn bind_procedures(
        &self,
        calls: &[ProcedureCall],
    ) -> Result<Vec<BoundProcedure>, ConfigurationError> {
        calls
            .iter()
            .map(|call| {
                let procedure = self.procedures.get(&call.name).ok_or_else(|| {
                    ConfigurationError::UnknownProcedure {
                        name: call.name.clone(),
                    }
                })?;
                procedure.validate(&call.params).map_err(|reason| {
                    ConfigurationError::InvalidParameters {
                        procedure: call.name.clone(),
                        reason,
                    }
                })?;
                Ok(BoundProcedure {
                    name: call.name.clone(),
                    params: call.params.clone(),
                    procedure: Arc::clone(procedure),
                })
            })
            .collect()
    }

    /// Evaluate named preconditions in order, stopping at the first `false`.
    pub fn evaluate(
        &self,
        names: &[String],
        file: &Path,
        content: &[u8],
    ) -> Result<bool, ConfigurationError> {
        let bound = self.bind_preconditions(names)?;
        Ok(conditions::evaluate(&bound, file, content))
    }

    /// Run named procedures in order, each over the previous output.
    pub fn apply(&self, calls: &[ProcedureCall], content: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        let bound = self.bind_procedures(calls)?;
        procedures::apply(&bound, content)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut preconditions: Vec<&str> = self.preconditions.keys().map(String::as_str).collect();
        let mut procedures: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        preconditions.sort_unstable();
        procedures.sort_unstable();
        f.debug_struct("Registry")
            .field("preconditions", &preconditions)
            .field("procedures", &procedures)
            .finish()
    }
}
