use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A decoded rule document.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Pipe-separated directory-name globs skipped during discovery.
    #[serde(default)]
    pub exclude: String,
    #[serde(default)]
    pub transformations: Vec<Rule>,
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (index, rule) in self.transformations.iter().enumerate() {
            for (position, call) in rule.proc.iter().enumerate() {
                if call.name.trim().is_empty() {
                    issues.push(ValidationIssue::UnnamedProcedure {
                        rule: index,
                        position,
                    });
                }
            }
            for (position, name) in rule.pre.iter().enumerate() {
                if name.trim().is_empty() {
                    issues.push(ValidationIssue::UnnamedPrecondition {
                        rule: index,
                        position,
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Pipe-separated globs over the file base name.
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub proc: Vec<ProcedureCall>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub params: Vec<String>,
}

impl ProcedureCall {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// `params: foo` and `params: [foo]` decode alike.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    UnnamedProcedure { rule: usize, position: usize },
    UnnamedPrecondition { rule: usize, position: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnnamedProcedure { rule, position } => {
                write!(f, "rule #{rule}: procedure #{position} has no name")
            }
            ValidationIssue::UnnamedPrecondition { rule, position } => {
                write!(f, "rule #{rule}: precondition #{position} has no name")
            }
        }
    }
}
