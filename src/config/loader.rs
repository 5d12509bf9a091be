use crate::config::schema::{RuleSet, ValidationError};
use crate::fetch::{self, FetchError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization of a rule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    /// Infer the format from the extension of a path or URL, ignoring case
    /// and any query string.
    pub fn detect(location: &str) -> Result<Self, LoadError> {
        let path = location.split(|c: char| c == '?' || c == '#').next().unwrap_or(location);
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "yml" | "yaml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            _ => Err(LoadError::UnsupportedFormat {
                location: location.to_string(),
                extension,
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Yaml => "yml",
            Format::Toml => "toml",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            other => Err(format!("unsupported format '{other}' (expected toml or yaml)")),
        }
    }
}

/// Where a rule document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Path(PathBuf),
    Url(String),
}

impl RuleSource {
    pub fn parse(location: &str) -> Self {
        if fetch::is_url(location) {
            RuleSource::Url(location.to_string())
        } else {
            RuleSource::Path(PathBuf::from(location))
        }
    }

    /// The local file backing this source, if any.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            RuleSource::Path(path) => Some(path),
            RuleSource::Url(_) => None,
        }
    }

    /// Read (or fetch), decode and validate the document.
    pub fn load(&self) -> Result<RuleSet, LoadError> {
        match self {
            RuleSource::Path(path) => load_from_path(path),
            RuleSource::Url(url) => {
                let format = Format::detect(url)?;
                let bytes = fetch::fetch(url).map_err(|source| LoadError::Fetch {
                    url: url.clone(),
                    source,
                })?;
                decode(&bytes, format).map_err(|error| error.with_location(url))
            }
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Path(path) => write!(f, "{}", path.display()),
            RuleSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Fetch {
        url: String,
        source: FetchError,
    },
    UnsupportedFormat {
        location: String,
        extension: String,
    },
    Encoding {
        location: Option<String>,
        source: std::str::Utf8Error,
    },
    Yaml {
        location: Option<String>,
        source: serde_yaml_bw::Error,
    },
    Toml {
        location: Option<String>,
        source: toml_edit::de::Error,
    },
    Validation {
        location: Option<String>,
        source: ValidationError,
    },
}

impl LoadError {
    fn with_location(self, location: &str) -> Self {
        let location = Some(location.to_string());
        match self {
            LoadError::Encoding { location: None, source } => LoadError::Encoding { location, source },
            LoadError::Yaml { location: None, source } => LoadError::Yaml { location, source },
            LoadError::Toml { location: None, source } => LoadError::Toml { location, source },
            LoadError::Validation { location: None, source } => {
                LoadError::Validation { location, source }
            }
            other => other,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(
                f,
                "unable to read the transformation description file {}: {}",
                path.display(),
                source
            ),
            LoadError::Fetch { url, source } => {
                write!(f, "unable to fetch the transformation description file {url}: {source}")
            }
            LoadError::UnsupportedFormat {
                location,
                extension,
            } => write!(f, "unsupported format '{extension}' for {location}"),
            LoadError::Encoding { location, source } => match location {
                Some(location) => write!(f, "{location} is not valid UTF-8: {source}"),
                None => write!(f, "transformation description is not valid UTF-8: {source}"),
            },
            LoadError::Yaml { location, source } => match location {
                Some(location) => write!(f, "failed to parse the yaml file {location}: {source}"),
                None => write!(f, "failed to parse the yaml document: {source}"),
            },
            LoadError::Toml { location, source } => match location {
                Some(location) => write!(f, "failed to parse the toml file {location}: {source}"),
                None => write!(f, "failed to parse the toml document: {source}"),
            },
            LoadError::Validation { location, source } => match location {
                Some(location) => write!(f, "invalid transformation description ({location}): {source}"),
                None => write!(f, "invalid transformation description: {source}"),
            },
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Fetch { source, .. } => Some(source),
            LoadError::UnsupportedFormat { .. } => None,
            LoadError::Encoding { source, .. } => Some(source),
            LoadError::Yaml { source, .. } => Some(source),
            LoadError::Toml { source, .. } => Some(source),
            LoadError::Validation { source, .. } => Some(source),
        }
    }
}

/// Decode and validate a rule document.
pub fn decode(bytes: &[u8], format: Format) -> Result<RuleSet, LoadError> {
    let input = std::str::from_utf8(bytes).map_err(|source| LoadError::Encoding {
        location: None,
        source,
    })?;
    let rules: RuleSet = match format {
        Format::Yaml => serde_yaml_bw::from_str(input).map_err(|source| LoadError::Yaml {
            location: None,
            source,
        })?,
        Format::Toml => toml_edit::de::from_str(input).map_err(|source| LoadError::Toml {
            location: None,
            source,
        })?,
    };
    rules.validate().map_err(|source| LoadError::Validation {
        location: None,
        source,
    })?;
    Ok(rules)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, LoadError> {
    let path = path.as_ref();
    let location = path.display().to_string();
    let format = Format::detect(&location)?;
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes, format).map_err(|error| error.with_location(&location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_detected_from_extension() {
        assert_eq!(Format::detect("my/path.yml").unwrap(), Format::Yaml);
        assert_eq!(Format::detect("my/path.yaml").unwrap(), Format::Yaml);
        assert_eq!(Format::detect("my/path.toml").unwrap(), Format::Toml);
        assert_eq!(Format::detect("my/path.TOML").unwrap(), Format::Toml);
        assert_eq!(
            Format::detect("https://host/rules/tdf.yml?ref=main").unwrap(),
            Format::Yaml
        );
        assert!(matches!(
            Format::detect("my/path.fancy"),
            Err(LoadError::UnsupportedFormat { extension, .. }) if extension == "fancy"
        ));
        assert!(Format::detect("my/path").is_err());
    }

    #[test]
    fn source_kind_follows_the_scheme() {
        assert_eq!(
            RuleSource::parse("https://host/tdf.yml"),
            RuleSource::Url("https://host/tdf.yml".to_string())
        );
        let local = RuleSource::parse("./tdf.yml");
        assert_eq!(local.local_path(), Some(Path::new("./tdf.yml")));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let rules = decode(b"transformations:\n  - proc:\n      - name: insert\n", Format::Yaml).unwrap();
        assert_eq!(rules.exclude, "");
        let rule = &rules.transformations[0];
        assert_eq!(rule.filter, "");
        assert!(rule.pre.is_empty());
        assert!(rule.proc[0].params.is_empty());
    }

    #[test]
    fn scalar_params_become_a_list() {
        let rules = decode(
            b"transformations:\n  - filter: \"*.txt\"\n    proc:\n      - name: insert\n        params: \"!\"\n",
            Format::Yaml,
        )
        .unwrap();
        assert_eq!(rules.transformations[0].proc[0].params, vec!["!".to_string()]);

        let rules = decode(
            b"[[transformations]]\nfilter = \"*.txt\"\n[[transformations.proc]]\nname = \"insert\"\nparams = \"!\"\n",
            Format::Toml,
        )
        .unwrap();
        assert_eq!(rules.transformations[0].proc[0].params, vec!["!".to_string()]);
    }

    #[test]
    fn syntax_errors_are_reported_per_format() {
        assert!(matches!(
            decode(b"transformations: [", Format::Yaml),
            Err(LoadError::Yaml { .. })
        ));
        assert!(matches!(
            decode(b"transformations = [", Format::Toml),
            Err(LoadError::Toml { .. })
        ));
        assert!(matches!(
            decode(&[0xff, 0xfe], Format::Yaml),
            Err(LoadError::Encoding { .. })
        ));
    }

    #[test]
    fn unnamed_procedure_fails_validation() {
        let err = decode(
            b"transformations:\n  - filter: \"*\"\n    proc:\n      - name: \"\"\n",
            Format::Yaml,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Validation { .. }));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_from_path("does/not/exist.yml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.yml"));
    }
}
