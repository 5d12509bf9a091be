//! Seed Fix: rule-driven transformations over a source tree
//!
//! A transformation description lists rules. Each rule selects files by
//! base name, gates them with named preconditions and runs a chain of
//! named procedures (literal replace, insertion, Maven dependency
//! substitution, ...) over their bytes. Files whose content changed are
//! written back.
//!
//! # Architecture
//!
//! - [`config`] decodes YAML or TOML rule documents into a [`RuleSet`].
//! - [`engine`] compiles a rule set against a [`Registry`] of
//!   preconditions and procedures, then runs one task per file and
//!   collects the outcomes.
//! - [`walk`] lists candidate files; [`persist`] writes results back
//!   atomically.
//!
//! # Example
//!
//! ```no_run
//! use seed_fix::config::load_from_path;
//! use seed_fix::engine::{Engine, Registry, RunOptions};
//! use seed_fix::walk::discover_files;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = load_from_path("tdf.yml")?;
//! let engine = Engine::compile(&rules, &Registry::builtin())?;
//! let files = discover_files(Path::new("."), &rules.exclude, Some(Path::new("tdf.yml")))?;
//! let summary = engine.run(&files, &RunOptions::default())?;
//! println!("fixed {}/{} files", summary.modified, files.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod fetch;
pub mod logging;
pub mod persist;
pub mod regex_cache;
pub mod walk;

// Re-exports
pub use config::{decode, load_from_path, Format, LoadError, RuleSet, RuleSource};
pub use engine::{
    ConfigurationError, Engine, FileTask, Registry, RunOptions, RunSummary, TaskError,
};
