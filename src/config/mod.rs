pub mod convert;
pub mod loader;
pub mod schema;

pub use convert::{convert_file, encode, to_toml, ConvertError};
pub use loader::{decode, load_from_path, Format, LoadError, RuleSource};
pub use schema::{ProcedureCall, Rule, RuleSet, ValidationError, ValidationIssue};
