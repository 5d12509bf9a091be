//! Built-in preconditions and the short-circuiting evaluator.

use crate::engine::registry::{BoundPrecondition, Precondition, Registry};
use std::path::Path;

/// Holds for every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl Precondition for AlwaysTrue {
    fn check(&self, _file: &Path, _content: &[u8]) -> bool {
        true
    }
}

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry
        .register_precondition("always-true", AlwaysTrue)
        .alias_precondition("AlwaysTrue", "always-true");
}

/// Evaluate preconditions in declared order.
///
/// Returns `false` as soon as one precondition fails; the remaining ones are
/// not evaluated. An empty list holds.
pub fn evaluate(preconditions: &[BoundPrecondition], file: &Path, content: &[u8]) -> bool {
    for precondition in preconditions {
        if !precondition.check(file, content) {
            tracing::debug!(precondition = %precondition.name, "precondition not satisfied");
            return false;
        }
    }
    true
}
