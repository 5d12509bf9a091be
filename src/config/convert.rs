//! Re-encoding of rule documents between YAML and TOML.

use crate::config::loader::{load_from_path, Format, LoadError};
use crate::config::schema::RuleSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml_edit::{value, Array, ArrayOfTables, DocumentMut, Item, Table};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to encode the rule document as yaml: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("refusing to overwrite the input document {0}")]
    WouldOverwrite(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encode a rule set in `format`.
pub fn encode(rules: &RuleSet, format: Format) -> Result<String, ConvertError> {
    match format {
        Format::Toml => Ok(to_toml(rules)),
        Format::Yaml => Ok(serde_yaml_bw::to_string(rules)?),
    }
}

/// Emit `[[transformations]]` and `[[transformations.proc]]` tables.
pub fn to_toml(rules: &RuleSet) -> String {
    let mut document = DocumentMut::new();
    document["exclude"] = value(rules.exclude.as_str());

    let mut transformations = ArrayOfTables::new();
    for rule in &rules.transformations {
        let mut table = Table::new();
        table["filter"] = value(rule.filter.as_str());
        table["pre"] = value(string_array(&rule.pre));

        let mut procedures = ArrayOfTables::new();
        for call in &rule.proc {
            let mut procedure = Table::new();
            procedure["name"] = value(call.name.as_str());
            procedure["params"] = value(string_array(&call.params));
            procedures.push(procedure);
        }
        table.insert("proc", Item::ArrayOfTables(procedures));
        transformations.push(table);
    }
    document.insert("transformations", Item::ArrayOfTables(transformations));

    document.to_string()
}

fn string_array(values: &[String]) -> Array {
    values.iter().map(String::as_str).collect()
}

/// Convert the document at `input` to `format`.
///
/// Without an explicit `output`, the result is written next to the input
/// with the extension of the target format. Returns the written path.
pub fn convert_file(
    input: &Path,
    format: Format,
    output: Option<&Path>,
) -> Result<PathBuf, ConvertError> {
    let rules = load_from_path(input)?;
    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(format.extension()));
    if target == input {
        return Err(ConvertError::WouldOverwrite(target));
    }

    let encoded = encode(&rules, format)?;
    fs::write(&target, encoded).map_err(|source| ConvertError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::info!(input = %input.display(), output = %target.display(), "converted rule document");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::decode;
    use crate::config::schema::{ProcedureCall, Rule};

    fn sample() -> RuleSet {
        RuleSet {
            exclude: "target|.git".to_string(),
            transformations: vec![
                Rule {
                    filter: "pom.xml".to_string(),
                    pre: vec!["always-true".to_string()],
                    proc: vec![ProcedureCall::new(
                        "replace-dependency",
                        vec![
                            "com.inetpsa.fnd:seed-bom".to_string(),
                            "org.seedstack:seedstack-bom".to_string(),
                        ],
                    )],
                },
                Rule {
                    filter: "*.java".to_string(),
                    pre: vec![],
                    proc: vec![ProcedureCall::new("insert", vec!["\n".to_string()])],
                },
            ],
        }
    }

    #[test]
    fn toml_uses_arrays_of_tables() {
        let toml = to_toml(&sample());
        assert!(toml.contains("exclude = \"target|.git\""));
        assert_eq!(toml.matches("[[transformations]]").count(), 2);
        assert_eq!(toml.matches("[[transformations.proc]]").count(), 2);
    }

    #[test]
    fn encoded_documents_decode_to_the_same_rules() {
        let rules = sample();
        for format in [Format::Toml, Format::Yaml] {
            let encoded = encode(&rules, format).unwrap();
            assert_eq!(decode(encoded.as_bytes(), format).unwrap(), rules, "{format:?}");
        }
    }

    #[test]
    fn converted_file_lands_next_to_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tdf.yml");
        fs::write(&input, serde_yaml_bw::to_string(&sample()).unwrap()).unwrap();

        let written = convert_file(&input, Format::Toml, None).unwrap();
        assert_eq!(written, dir.path().join("tdf.toml"));
        let decoded = load_from_path(&written).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn converting_onto_the_input_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tdf.toml");
        fs::write(&input, to_toml(&sample())).unwrap();

        let err = convert_file(&input, Format::Toml, None).unwrap_err();
        assert!(matches!(err, ConvertError::WouldOverwrite(_)));
    }
}
